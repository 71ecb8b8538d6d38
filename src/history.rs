use crate::moves::Move;

/// The game record sent to the engine before a search: the position the
/// game was set up from plus every move played since.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    first_position: String,
    moves: Vec<Move>,
}

impl History {
    pub fn new(first_position: &str) -> History {
        History {
            first_position: first_position.to_string(),
            moves: Vec::new(),
        }
    }

    pub fn new_position(&mut self, position: &str) {
        self.first_position = position.to_string();
        self.moves.clear();
    }

    pub fn push_move(&mut self, m: Move) {
        self.moves.push(m);
    }

    pub fn first_position(&self) -> &str {
        &self.first_position
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// `<first position> moves m1 m2 ...`
    pub fn fen_and_moves(&self) -> String {
        self.moves
            .iter()
            .fold(format!("{} moves", self.first_position), |out, m| {
                format!("{out} {}", m.as_uci_string())
            })
    }
}

#[test]
fn fen_and_moves_lists_the_game() {
    let mut history = History::new(crate::fen::START_FEN);
    assert_eq!(history.fen_and_moves(), format!("{} moves", crate::fen::START_FEN));

    history.push_move(Move::new_from_text("e2e4").unwrap());
    history.push_move(Move::new_from_text("e7e5").unwrap());
    assert_eq!(
        history.fen_and_moves(),
        format!("{} moves e2e4 e7e5", crate::fen::START_FEN)
    );

    history.new_position("8/8/8/8/8/8/k7/7K w - - 0 1");
    assert!(history.moves().is_empty());
    assert_eq!(history.fen_and_moves(), "8/8/8/8/8/8/k7/7K w - - 0 1 moves");
}
