use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::InvalidMoveText;
use crate::square::Square;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PromoPiece {
    Queen,
    Knight,
    Rook,
    Bishop,
}

impl PromoPiece {
    /// Order in which the choices are laid out from the promotion square
    /// towards the centre of the board.
    pub const SELECTOR_ORDER: [PromoPiece; 4] = [
        PromoPiece::Queen,
        PromoPiece::Knight,
        PromoPiece::Rook,
        PromoPiece::Bishop,
    ];

    pub fn as_char(&self) -> char {
        match self {
            PromoPiece::Queen => 'q',
            PromoPiece::Knight => 'n',
            PromoPiece::Rook => 'r',
            PromoPiece::Bishop => 'b',
        }
    }

    fn from_char(c: char) -> Option<PromoPiece> {
        match c {
            'q' | 'Q' => Some(PromoPiece::Queen),
            'n' | 'N' => Some(PromoPiece::Knight),
            'r' | 'R' => Some(PromoPiece::Rook),
            'b' | 'B' => Some(PromoPiece::Bishop),
            _ => None,
        }
    }
}

/// A move as the engine names it: origin, destination and an optional
/// promotion piece. Equality is structural.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PromoPiece>,
}

impl Move {
    pub fn new(from: Square, to: Square, promotion: Option<PromoPiece>) -> Move {
        Move { from, to, promotion }
    }

    pub fn new_from_text(text: &str) -> Result<Move, InvalidMoveText> {
        let text = text.trim();
        if !text.is_ascii() || !(text.len() == 4 || text.len() == 5) {
            return Err(InvalidMoveText(text.into()));
        }

        let from = text[0..2].parse()?;
        let to = text[2..4].parse()?;

        let promotion = match text[4..].chars().next() {
            None => None,
            Some(c) => Some(PromoPiece::from_char(c).ok_or(InvalidMoveText(text.into()))?),
        };

        Ok(Move { from, to, promotion })
    }

    pub fn as_uci_string(&self) -> String {
        let mut mv = String::with_capacity(5);
        mv.push_str(self.from.name());
        mv.push_str(self.to.name());
        if let Some(promo) = self.promotion {
            mv.push(promo.as_char());
        }
        mv
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_uci_string())
    }
}

impl FromStr for Move {
    type Err = InvalidMoveText;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Move::new_from_text(s)
    }
}

#[test]
fn move_text() {
    let m = Move::new_from_text("e2e4").unwrap();
    assert_eq!(m.from.name(), "e2");
    assert_eq!(m.to.name(), "e4");
    assert_eq!(m.promotion, None);
    assert_eq!(m.as_uci_string(), "e2e4");

    let promo: Move = "a7a8n".parse().unwrap();
    assert_eq!(promo.promotion, Some(PromoPiece::Knight));
    assert_eq!(promo.to_string(), "a7a8n");

    for bad in ["", "e2", "e2e9", "e2e4k", "e2e4qq", "z1a1", "é2e4"] {
        assert!(Move::new_from_text(bad).is_err(), "{bad} should not parse");
    }
}
