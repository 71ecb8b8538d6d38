use std::fmt::{Display, Formatter};

use crate::moves::Move;
use crate::protocol::ProgressLine;

/// Latest progress of an open ended search.
///
/// `is_new` is only true when at least one progress line was consumed by
/// the poll that returned this snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchInfo {
    pub depth: u32,
    pub score: i32,
    pub best_move: Option<Move>,
    pub is_new: bool,
}

impl SearchInfo {
    pub fn update(&mut self, progress: ProgressLine) {
        self.depth = progress.depth;
        self.score = progress.score;
        self.best_move = Some(progress.best_move);
        self.is_new = true;
    }

    /// Score in pawns from white's point of view, e.g. `Eval: +0.35`.
    pub fn eval_text(&self) -> String {
        format!("Eval: {:+.2}", self.score as f64 / 100.0)
    }
}

impl Display for SearchInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let best_move = self.best_move.map_or(String::from("-"), |m| m.as_uci_string());
        write!(f, "{} Best Move: {} Depth: {}", self.eval_text(), best_move, self.depth)
    }
}

#[test]
fn eval_text_is_signed_pawns() {
    let mut info = SearchInfo::default();
    assert_eq!(info.eval_text(), "Eval: +0.00");

    info.score = 35;
    assert_eq!(info.eval_text(), "Eval: +0.35");

    info.score = -250;
    assert_eq!(info.eval_text(), "Eval: -2.50");
}

#[test]
fn update_marks_new() {
    let mut info = SearchInfo::default();
    info.update(ProgressLine {
        depth: 4,
        score: 18,
        best_move: Move::new_from_text("d2d4").unwrap(),
    });

    assert!(info.is_new);
    assert_eq!(info.to_string(), "Eval: +0.18 Best Move: d2d4 Depth: 4");
}
