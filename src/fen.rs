use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::InvalidFenError;
use crate::square::{Orientation, Square};

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Colour {
    White,
    Black,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Rook,
    Bishop,
    Queen,
    King,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub colour: Colour,
}

impl Piece {
    pub fn new(kind: PieceKind, colour: Colour) -> Piece {
        Piece { kind, colour }
    }

    pub fn symbol(&self) -> char {
        let c = match self.kind {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Rook => 'r',
            PieceKind::Bishop => 'b',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        };

        match self.colour {
            Colour::White => c.to_ascii_uppercase(),
            Colour::Black => c,
        }
    }
}

fn piece_from_char(name: char) -> Option<Piece> {
    let colour = if name.is_ascii_uppercase() { Colour::White } else { Colour::Black };
    let kind = match name.to_ascii_lowercase() {
        'p' => PieceKind::Pawn,
        'n' => PieceKind::Knight,
        'r' => PieceKind::Rook,
        'b' => PieceKind::Bishop,
        'q' => PieceKind::Queen,
        'k' => PieceKind::King,
        _ => return None,
    };

    Some(Piece::new(kind, colour))
}

// get the amount of squares to increment while iterating through fen rows
fn inc_from_char(name: char) -> Option<usize> {
    match name {
        'P' | 'p' | 'N' | 'n' | 'R' | 'r' | 'B' | 'b' | 'Q' | 'q' | 'K' | 'k' => Some(1),
        '1'..='8' => Some(name as usize - '0' as usize),
        _ => None,
    }
}

fn pieces_from_fen(fen: &str) -> Result<[Option<Piece>; 64], InvalidFenError> {
    let fen_pieces = fen
        .split_whitespace()
        .next()
        .ok_or(InvalidFenError::InvalidPieces)?;

    let rows: Vec<_> = fen_pieces.split('/').collect();
    if rows.len() != 8 {
        return Err(InvalidFenError::InvalidPieces);
    }

    let mut pieces = [None; 64];

    // fen rows run from rank 8 down to rank 1
    for (rank, row) in rows.iter().rev().enumerate() {
        let mut file = 0;
        for sq in row.chars() {
            let inc = inc_from_char(sq).ok_or(InvalidFenError::InvalidPieces)?;
            if file + inc > 8 {
                return Err(InvalidFenError::InvalidPieces);
            }
            if let Some(piece) = piece_from_char(sq) {
                pieces[rank * 8 + file] = Some(piece);
            }
            file += inc;
        }

        if file != 8 {
            return Err(InvalidFenError::InvalidPieces);
        }
    }

    Ok(pieces)
}

fn ctm_from_fen(fen: &str) -> Result<Colour, InvalidFenError> {
    let ctm = fen.split_whitespace().nth(1).ok_or(InvalidFenError::InvalidCTM)?;

    match ctm {
        "w" => Ok(Colour::White),
        "b" => Ok(Colour::Black),
        _ => Err(InvalidFenError::InvalidCTM),
    }
}

fn castle_state_from_fen(fen: &str) -> Result<u8, InvalidFenError> {
    let castle_state_str = fen
        .split_whitespace()
        .nth(2)
        .ok_or(InvalidFenError::InvalidCastleState)?;

    if castle_state_str == "-" {
        return Ok(0);
    }

    // KQkq in that order, each at most once
    let mut castle_state = 0u8;
    let mut last_bit = 0b10000;
    for c in castle_state_str.chars() {
        let bit = match c {
            'K' => 0b1000,
            'Q' => 0b0100,
            'k' => 0b0010,
            'q' => 0b0001,
            _ => return Err(InvalidFenError::InvalidCastleState),
        };
        if bit >= last_bit {
            return Err(InvalidFenError::InvalidCastleState);
        }
        castle_state |= bit;
        last_bit = bit;
    }

    Ok(castle_state)
}

fn ep_sq_from_fen(fen: &str) -> Result<Option<Square>, InvalidFenError> {
    let ep_sq = fen
        .split_whitespace()
        .nth(3)
        .ok_or(InvalidFenError::InvalidEpSquare)?;

    if ep_sq == "-" {
        return Ok(None);
    }

    let square: Square = ep_sq.parse().map_err(|_| InvalidFenError::InvalidEpSquare)?;
    if !(square.rank() == 2 || square.rank() == 5) {
        return Err(InvalidFenError::InvalidEpSquare);
    }

    Ok(Some(square))
}

fn halfmove_from_fen(fen: &str) -> Result<u16, InvalidFenError> {
    let Some(halfmove_str) = fen.split_whitespace().nth(4) else {
        return Ok(0);
    };

    halfmove_str.parse().map_err(|_| InvalidFenError::InvalidHalfmove)
}

fn fullmove_from_fen(fen: &str) -> Result<u16, InvalidFenError> {
    let Some(fullmove_str) = fen.split_whitespace().nth(5) else {
        return Ok(1);
    };

    match fullmove_str.parse() {
        Ok(0) | Err(_) => Err(InvalidFenError::InvalidFullmove),
        Ok(n) => Ok(n),
    }
}

/// An immutable board state as exchanged with the engine.
///
/// The fen text (whitespace normalised) is what gets sent back over the
/// protocol; the parsed fields only exist so the board can be drawn and
/// clicked on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    fen: String,
    pieces: [Option<Piece>; 64],
    ctm: Colour,
    castle_state: u8,
    ep: Option<Square>,
    halfmove: u16,
    fullmove: u16,
}

impl Position {
    pub fn new() -> Position {
        // START_FEN is well formed
        Position::new_fen(START_FEN).unwrap_or_else(|_| unreachable!())
    }

    pub fn new_fen(fen: &str) -> Result<Position, InvalidFenError> {
        let fen = fen.trim();

        if fen.split_whitespace().count() > 6 {
            return Err(InvalidFenError::InvalidFullmove);
        }

        Ok(Position {
            fen: fen.split_whitespace().collect::<Vec<_>>().join(" "),
            pieces: pieces_from_fen(fen)?,
            ctm: ctm_from_fen(fen)?,
            castle_state: castle_state_from_fen(fen)?,
            ep: ep_sq_from_fen(fen)?,
            halfmove: halfmove_from_fen(fen)?,
            fullmove: fullmove_from_fen(fen)?,
        })
    }

    pub fn is_valid_fen(fen: &str) -> bool {
        Position::new_fen(fen).is_ok()
    }

    pub fn fen(&self) -> &str {
        &self.fen
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.pieces[square.idx()]
    }

    pub fn side_to_move(&self) -> Colour {
        self.ctm
    }

    /// Castling rights as KQkq bits, K being the high bit.
    pub fn castle_state(&self) -> u8 {
        self.castle_state
    }

    pub fn ep_square(&self) -> Option<Square> {
        self.ep
    }

    pub fn halfmove(&self) -> u16 {
        self.halfmove
    }

    pub fn fullmove(&self) -> u16 {
        self.fullmove
    }

    /// Same placement, side to move, castling rights and en passant square.
    /// Move counters are ignored since engines are free to reset them.
    pub fn same_position(&self, other: &Position) -> bool {
        self.pieces == other.pieces
            && self.ctm == other.ctm
            && self.castle_state == other.castle_state
            && self.ep == other.ep
    }

    pub fn diagram(&self, orientation: Orientation) -> String {
        let add_sq = |s: String, sq: u8| {
            let piece = Square::new(sq).and_then(|sq| self.piece_at(sq));
            format!("{s}{} ", piece.map_or('-', |p| p.symbol()))
        };

        let (ranks, files): (Vec<u8>, Vec<u8>) = match orientation {
            Orientation::WhiteBottom => ((0..8).rev().collect(), (0..8).collect()),
            Orientation::BlackBottom => ((0..8).collect(), (0..8).rev().collect()),
        };

        let mut out = ranks.iter().fold(String::new(), |out, rank| {
            let row = files.iter().map(|file| rank * 8 + file).fold(String::new(), add_sq);
            format!("{out}\n{}   {}", rank + 1, row.trim_end())
        });

        let footer: String = files
            .iter()
            .map(|f| ((b'A' + f) as char).to_string())
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&format!("\n\n    {footer}\n"));
        out
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for Position {
    type Err = InvalidFenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::new_fen(s)
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.diagram(Orientation::WhiteBottom))
    }
}

#[test]
fn test_fens() -> Result<(), InvalidFenError> {
    let good_fens = [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
        "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq c6 0 2",
        "rnbqkbnr/pp1ppppp/8/2p5/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2 ",
        "rnbqkbnr/pp1ppppp/8/2p5/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1",
        "     rnbqkbnr/pp1ppppp/8/2p5/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq -      ",
        "8/4P3/8/8/8/8/k7/7K w - - 0 1",
    ];

    for fen in good_fens {
        let position = Position::new_fen(fen)?;
        println!("{}\n{}\n\n", fen, position);
    }

    let bad_fens = [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR KQkq - 0 1",
        "rnbaqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
        "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KaQkq c6 0 2",
        "rnbqkbnr/pp1ppppp/8/2p5/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq r5 1 2 ",
        "rnbqkbnr/pp1ppppp/8/2p5/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - -1 2 ",
        "rnbqkbnr/pppppppp/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "rnbqkbnr/ppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w QK - 0 1",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 0",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1 extra",
        "",
        "hello",
    ];

    for fen in bad_fens {
        println!("{}", fen);
        assert!(Position::new_fen(fen).is_err());
    }

    Ok(())
}

#[test]
fn start_position_fields() {
    let position = Position::new();
    let e2: Square = "e2".parse().unwrap();
    let e4: Square = "e4".parse().unwrap();
    let e8: Square = "e8".parse().unwrap();

    assert_eq!(position.fen(), START_FEN);
    assert_eq!(position.piece_at(e2), Some(Piece::new(PieceKind::Pawn, Colour::White)));
    assert_eq!(position.piece_at(e4), None);
    assert_eq!(position.piece_at(e8), Some(Piece::new(PieceKind::King, Colour::Black)));
    assert_eq!(position.side_to_move(), Colour::White);
    assert_eq!(position.castle_state(), 0b1111);
    assert_eq!(position.ep_square(), None);
    assert_eq!(position.fullmove(), 1);
}

#[test]
fn same_position_ignores_move_counters() {
    let a = Position::new_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1").unwrap();
    let b = Position::new_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 7 12").unwrap();
    let c = Position::new_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1").unwrap();

    assert!(a.same_position(&b));
    assert!(!a.same_position(&c));
    assert_ne!(a, b);
}

#[test]
fn diagram_follows_orientation() {
    let position = Position::new();
    let white = position.diagram(Orientation::WhiteBottom);
    let black = position.diagram(Orientation::BlackBottom);

    assert!(white.trim_start().starts_with("8   r n b q k b n r"));
    assert!(white.contains("A B C D E F G H"));
    assert!(black.trim_start().starts_with("1   R N B K Q B N R"));
    assert!(black.contains("H G F E D C B A"));
}
