use log::debug;

use crate::error::{BoardError, SessionError};
use crate::fen::{Colour, Piece, PieceKind, Position, START_FEN};
use crate::history::History;
use crate::legal_moves::LegalMoves;
use crate::moves::{Move, PromoPiece};
use crate::session::EngineApi;
use crate::square::{screen_to_square, Orientation, Square};

/// The four promotion choices laid out on the board, starting at the
/// promotion square and running towards the centre.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PromotionSelector {
    pub origin: Square,
    pub destination: Square,
    pub choices: [(PromoPiece, Square); 4],
}

impl PromotionSelector {
    fn new(origin: Square, destination: Square) -> Option<PromotionSelector> {
        let (file, rank) = (destination.file() as i8, destination.rank() as i8);
        let dir = if rank == 0 { 1 } else { -1 };

        let mut choices = [(PromoPiece::Queen, destination); 4];
        for (i, kind) in PromoPiece::SELECTOR_ORDER.iter().enumerate() {
            let rank = rank + dir * i as i8;
            choices[i] = (*kind, Square::from_coords(file as u8, u8::try_from(rank).ok()?)?);
        }

        Some(PromotionSelector { origin, destination, choices })
    }

    pub fn choice_at(&self, square: Square) -> Option<PromoPiece> {
        self.choices
            .iter()
            .find_map(|(kind, sq)| (*sq == square).then_some(*kind))
    }

    /// Colour of the promoting side, read off the promotion rank.
    pub fn colour(&self) -> Colour {
        if self.destination.rank() == 7 {
            Colour::White
        } else {
            Colour::Black
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum BoardState {
    #[default]
    Idle,
    PieceSelected(Square),
    PromotionSelector(PromotionSelector),
}

/// What a click did.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Nothing to do: an empty square while idle or a point off the board.
    Ignored,
    Selected(Square),
    PromotionOffered,
    Committed(Move),
    /// The move was not in the legal move list and was dropped.
    IllegalMove(Move),
    /// A click away from the promotion choices.
    Cancelled,
}

type PositionObserver = Box<dyn FnMut(&Position, Move)>;

/// Turns clicks into moves.
///
/// Legality comes from the engine alone: every position change is followed
/// by a full rebuild of the legal move list, and a move is only sent to the
/// engine when it is in that list.
pub struct BoardController<E: EngineApi> {
    engine: E,
    position: Position,
    legal_moves: LegalMoves,
    state: BoardState,
    orientation: Orientation,
    square_size: f32,
    history: History,
    last_move: Option<Move>,
    engine_move: Option<Move>,
    observers: Vec<PositionObserver>,
}

impl<E: EngineApi> BoardController<E> {
    /// Sets `engine` up on the standard starting position.
    pub fn new(engine: E, square_size: f32) -> Result<BoardController<E>, BoardError> {
        let mut board = BoardController {
            engine,
            position: Position::new(),
            legal_moves: LegalMoves::new(),
            state: BoardState::Idle,
            orientation: Orientation::default(),
            square_size,
            history: History::new(START_FEN),
            last_move: None,
            engine_move: None,
            observers: Vec::new(),
        };

        board.set_position(START_FEN)?;
        Ok(board)
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn state(&self) -> BoardState {
        self.state
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn legal_moves(&self) -> &LegalMoves {
        &self.legal_moves
    }

    pub fn legal_destinations(&self, origin: Square) -> Vec<Square> {
        self.legal_moves.destinations(origin)
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn rotate(&mut self) {
        self.orientation = self.orientation.flipped();
    }

    pub fn square_size(&self) -> f32 {
        self.square_size
    }

    pub fn set_square_size(&mut self, square_size: f32) {
        self.square_size = square_size;
    }

    pub fn last_move(&self) -> Option<Move> {
        self.last_move
    }

    pub fn engine_move(&self) -> Option<Move> {
        self.engine_move
    }

    /// The engine's suggestion to show on the board.
    pub fn set_engine_move(&mut self, m: Option<Move>) {
        self.engine_move = m;
    }

    /// Called with the new position after every committed move.
    pub fn subscribe(&mut self, observer: impl FnMut(&Position, Move) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// The selected piece's square, also while choosing a promotion.
    pub fn selected_square(&self) -> Option<Square> {
        match self.state {
            BoardState::Idle => None,
            BoardState::PieceSelected(origin) => Some(origin),
            BoardState::PromotionSelector(sel) => Some(sel.origin),
        }
    }

    /// The piece to draw on `square`; promotion choices cover what is
    /// really there.
    pub fn display_piece(&self, square: Square) -> Option<Piece> {
        if let BoardState::PromotionSelector(sel) = self.state {
            if let Some(kind) = sel.choice_at(square) {
                return Some(Piece::new(promo_kind(kind), sel.colour()));
            }
        }

        self.position.piece_at(square)
    }

    /// Validates `fen`, then hands it to the engine. Invalid text leaves
    /// everything untouched.
    pub fn set_position(&mut self, fen: &str) -> Result<(), BoardError> {
        let position = Position::new_fen(fen)?;

        self.engine.set_position(position.fen())?;
        self.history.new_position(position.fen());
        self.position = position;
        self.state = BoardState::Idle;
        self.last_move = None;
        self.engine_move = None;
        self.rebuild_legal_moves()?;

        Ok(())
    }

    /// A click at `(x, y)` on the board surface.
    pub fn click(&mut self, x: f32, y: f32) -> Result<ClickOutcome, SessionError> {
        match screen_to_square(x, y, self.orientation, self.square_size) {
            Some(square) => self.click_square(square),
            None => Ok(ClickOutcome::Ignored),
        }
    }

    pub fn click_square(&mut self, square: Square) -> Result<ClickOutcome, SessionError> {
        match std::mem::take(&mut self.state) {
            BoardState::Idle => {
                if self.position.piece_at(square).is_none() {
                    return Ok(ClickOutcome::Ignored);
                }
                self.state = BoardState::PieceSelected(square);
                Ok(ClickOutcome::Selected(square))
            }
            BoardState::PieceSelected(origin) => {
                if self.is_promotion(origin, square) {
                    if let Some(sel) = PromotionSelector::new(origin, square) {
                        self.state = BoardState::PromotionSelector(sel);
                        return Ok(ClickOutcome::PromotionOffered);
                    }
                }
                self.commit(Move::new(origin, square, None))
            }
            BoardState::PromotionSelector(sel) => match sel.choice_at(square) {
                Some(kind) => self.commit(Move::new(sel.origin, sel.destination, Some(kind))),
                None => Ok(ClickOutcome::Cancelled),
            },
        }
    }

    fn is_promotion(&self, origin: Square, destination: Square) -> bool {
        let is_pawn = self
            .position
            .piece_at(origin)
            .is_some_and(|p| p.kind == PieceKind::Pawn);

        is_pawn
            && (destination.rank() == 7 || destination.rank() == 0)
            && self.legal_moves.can_reach(origin, destination)
    }

    fn commit(&mut self, m: Move) -> Result<ClickOutcome, SessionError> {
        if !self.legal_moves.contains(&m) {
            debug!("dropping illegal move {m}");
            return Ok(ClickOutcome::IllegalMove(m));
        }

        let fen = self.engine.make_move(m)?;
        self.position = Position::new_fen(&fen).map_err(|err| {
            SessionError::ProtocolViolation(format!("engine position {fen:?}: {err}"))
        })?;
        self.history.push_move(m);
        self.last_move = Some(m);
        self.engine_move = None;
        self.rebuild_legal_moves()?;

        for observer in self.observers.iter_mut() {
            observer(&self.position, m);
        }

        Ok(ClickOutcome::Committed(m))
    }

    fn rebuild_legal_moves(&mut self) -> Result<(), SessionError> {
        self.legal_moves.clear();
        let moves = self.engine.legal_moves()?;
        self.legal_moves.rebuild(moves);
        debug!("{} legal moves", self.legal_moves.len());
        Ok(())
    }
}

fn promo_kind(kind: PromoPiece) -> PieceKind {
    match kind {
        PromoPiece::Queen => PieceKind::Queen,
        PromoPiece::Knight => PieceKind::Knight,
        PromoPiece::Rook => PieceKind::Rook,
        PromoPiece::Bishop => PieceKind::Bishop,
    }
}
