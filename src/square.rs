use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::InvalidMoveText;

pub const SQ_NAMES: [&str; 64] = [
    "a1", "b1", "c1", "d1", "e1", "f1", "g1", "h1", "a2", "b2", "c2", "d2", "e2", "f2", "g2", "h2",
    "a3", "b3", "c3", "d3", "e3", "f3", "g3", "h3", "a4", "b4", "c4", "d4", "e4", "f4", "g4", "h4",
    "a5", "b5", "c5", "d5", "e5", "f5", "g5", "h5", "a6", "b6", "c6", "d6", "e6", "f6", "g6", "h6",
    "a7", "b7", "c7", "d7", "e7", "f7", "g7", "h7", "a8", "b8", "c8", "d8", "e8", "f8", "g8", "h8",
];

/// A board square, 0 (a1) to 63 (h8), rank major.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(u8);

impl Square {
    pub fn new(idx: u8) -> Option<Square> {
        (idx < 64).then_some(Square(idx))
    }

    pub fn from_coords(file: u8, rank: u8) -> Option<Square> {
        (file < 8 && rank < 8).then_some(Square(rank * 8 + file))
    }

    #[inline]
    pub fn idx(&self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn file(&self) -> u8 {
        self.0 & 7
    }

    #[inline]
    pub fn rank(&self) -> u8 {
        self.0 >> 3
    }

    pub fn name(&self) -> &'static str {
        SQ_NAMES[self.idx()]
    }

    pub fn is_light(&self) -> bool {
        (self.file() + self.rank()) % 2 == 1
    }
}

impl Display for Square {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Square {
    type Err = InvalidMoveText;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (Some(file), Some(rank), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(InvalidMoveText(s.into()));
        };

        if !('a'..='h').contains(&file) || !('1'..='8').contains(&rank) {
            return Err(InvalidMoveText(s.into()));
        }

        Ok(Square((rank as u8 - b'1') * 8 + (file as u8 - b'a')))
    }
}

/// Which side is drawn at the bottom of the board. Presentation only.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    WhiteBottom,
    BlackBottom,
}

impl Orientation {
    pub fn flipped(self) -> Orientation {
        match self {
            Orientation::WhiteBottom => Orientation::BlackBottom,
            Orientation::BlackBottom => Orientation::WhiteBottom,
        }
    }
}

/// Resolves a point on the board surface to the square under it.
///
/// `(0, 0)` is the top left corner of the board. Points outside the 8x8
/// area resolve to `None`.
pub fn screen_to_square(x: f32, y: f32, orientation: Orientation, square_size: f32) -> Option<Square> {
    if ![x, y, square_size].iter().all(|v| v.is_finite()) || square_size <= 0.0 || x < 0.0 || y < 0.0 {
        return None;
    }

    let col = (x / square_size).floor();
    let row = (y / square_size).floor();
    if col >= 8.0 || row >= 8.0 {
        return None;
    }

    let (col, row) = (col as u8, row as u8);
    match orientation {
        Orientation::WhiteBottom => Square::from_coords(col, 7 - row),
        Orientation::BlackBottom => Square::from_coords(7 - col, row),
    }
}

/// Top left corner of `square` on the board surface.
pub fn square_to_screen(square: Square, orientation: Orientation, square_size: f32) -> (f32, f32) {
    let (col, row) = match orientation {
        Orientation::WhiteBottom => (square.file(), 7 - square.rank()),
        Orientation::BlackBottom => (7 - square.file(), square.rank()),
    };

    (col as f32 * square_size, row as f32 * square_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn top_left_corner_depends_on_orientation() {
        assert_eq!(screen_to_square(1.0, 1.0, Orientation::WhiteBottom, 100.0), Some(sq("a8")));
        assert_eq!(screen_to_square(1.0, 1.0, Orientation::BlackBottom, 100.0), Some(sq("h1")));
        assert_eq!(screen_to_square(799.0, 799.0, Orientation::WhiteBottom, 100.0), Some(sq("h1")));
        assert_eq!(screen_to_square(799.0, 799.0, Orientation::BlackBottom, 100.0), Some(sq("a8")));
    }

    #[test]
    fn clicks_off_the_board_resolve_to_nothing() {
        assert_eq!(screen_to_square(-1.0, 10.0, Orientation::WhiteBottom, 100.0), None);
        assert_eq!(screen_to_square(10.0, 800.0, Orientation::WhiteBottom, 100.0), None);
        assert_eq!(screen_to_square(10.0, 10.0, Orientation::WhiteBottom, 0.0), None);
        assert_eq!(screen_to_square(f32::NAN, 10.0, Orientation::WhiteBottom, 100.0), None);
        assert_eq!(screen_to_square(10.0, f32::NAN, Orientation::BlackBottom, 100.0), None);
        assert_eq!(screen_to_square(f32::INFINITY, 10.0, Orientation::WhiteBottom, 100.0), None);
        assert_eq!(screen_to_square(10.0, 10.0, Orientation::WhiteBottom, f32::NAN), None);
    }

    #[test]
    fn square_names() {
        assert_eq!(sq("a1").idx(), 0);
        assert_eq!(sq("e2").idx(), 12);
        assert_eq!(sq("h8").idx(), 63);
        assert_eq!(sq("e4").to_string(), "e4");
        assert!("i1".parse::<Square>().is_err());
        assert!("a9".parse::<Square>().is_err());
        assert!("a10".parse::<Square>().is_err());
        assert!(!sq("a1").is_light());
        assert!(sq("h1").is_light());
    }

    proptest! {
        #[test]
        fn screen_mapping_inverts_square_mapping(
            idx in 0u8..64,
            white in any::<bool>(),
            dx in 0.0f32..0.99,
            dy in 0.0f32..0.99,
        ) {
            let orientation = if white { Orientation::WhiteBottom } else { Orientation::BlackBottom };
            let square = Square::new(idx).unwrap();
            let size = 50.0;
            let (x, y) = square_to_screen(square, orientation, size);

            prop_assert_eq!(screen_to_square(x + dx * size, y + dy * size, orientation, size), Some(square));
        }
    }
}
