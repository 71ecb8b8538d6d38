use crate::controller::{BoardController, BoardState};
use crate::moves::Move;
use crate::session::EngineApi;
use crate::square::Square;

/// How a square should be drawn, strongest first.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SquareHighlight {
    PromotionChoice,
    /// the selected piece or one of its legal destinations
    Selected,
    EngineMove,
    LastMove,
    Light,
    Dark,
}

fn touches(m: Option<Move>, square: Square) -> bool {
    m.is_some_and(|m| m.from == square || m.to == square)
}

impl<E: EngineApi> BoardController<E> {
    pub fn highlight(&self, square: Square) -> SquareHighlight {
        if let BoardState::PromotionSelector(sel) = self.state() {
            if sel.choice_at(square).is_some() {
                return SquareHighlight::PromotionChoice;
            }
        }

        if let Some(selected) = self.selected_square() {
            if selected == square || self.legal_moves().can_reach(selected, square) {
                return SquareHighlight::Selected;
            }
        }

        if touches(self.engine_move(), square) {
            SquareHighlight::EngineMove
        } else if touches(self.last_move(), square) {
            SquareHighlight::LastMove
        } else if square.is_light() {
            SquareHighlight::Light
        } else {
            SquareHighlight::Dark
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::tests::{FakeEngine, START_MOVES};

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn mv(text: &str) -> Move {
        Move::new_from_text(text).unwrap()
    }

    const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";

    #[test]
    fn base_colours() {
        let board = BoardController::new(FakeEngine::new(&START_MOVES, AFTER_E4), 100.0).unwrap();

        assert_eq!(board.highlight(sq("a1")), SquareHighlight::Dark);
        assert_eq!(board.highlight(sq("h1")), SquareHighlight::Light);
        assert_eq!(board.highlight(sq("d1")), SquareHighlight::Light);
        assert_eq!(board.highlight(sq("e1")), SquareHighlight::Dark);
    }

    #[test]
    fn selection_beats_engine_move_beats_last_move() {
        let mut board = BoardController::new(FakeEngine::new(&START_MOVES, AFTER_E4), 100.0).unwrap();
        board.click_square(sq("e2")).unwrap();
        board.click_square(sq("e4")).unwrap();

        assert_eq!(board.highlight(sq("e2")), SquareHighlight::LastMove);
        assert_eq!(board.highlight(sq("e4")), SquareHighlight::LastMove);

        board.set_engine_move(Some(mv("e4e5")));
        assert_eq!(board.highlight(sq("e4")), SquareHighlight::EngineMove);
        assert_eq!(board.highlight(sq("e5")), SquareHighlight::EngineMove);

        board.click_square(sq("g1")).unwrap();
        assert_eq!(board.highlight(sq("g1")), SquareHighlight::Selected);
        assert_eq!(board.highlight(sq("f3")), SquareHighlight::Selected);
        assert_eq!(board.highlight(sq("h3")), SquareHighlight::Selected);
        assert_eq!(board.highlight(sq("e5")), SquareHighlight::EngineMove);
    }

    #[test]
    fn promotion_choices_come_first() {
        let mut board =
            BoardController::new(FakeEngine::new(&["e7e8q", "e7e8n", "e7e8r", "e7e8b"], ""), 100.0).unwrap();
        board.set_position("8/4P3/8/8/8/8/k7/7K w - - 0 1").unwrap();
        board.click_square(sq("e7")).unwrap();
        board.click_square(sq("e8")).unwrap();

        for name in ["e8", "e7", "e6", "e5"] {
            assert_eq!(board.highlight(sq(name)), SquareHighlight::PromotionChoice);
        }
        assert_eq!(board.highlight(sq("e4")), SquareHighlight::Light);
    }
}
