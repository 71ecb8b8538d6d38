pub mod config;
pub mod controller;
pub mod error;
pub mod fen;
pub mod frontend;
pub mod highlight;
pub mod history;
pub mod legal_moves;
pub mod logger;
pub mod moves;
pub mod poller;
pub mod protocol;
pub mod search_info;
pub mod session;
pub mod square;
pub mod transport;

pub use crate::config::Config;
pub use crate::controller::{BoardController, BoardState, ClickOutcome, PromotionSelector};
pub use crate::error::{BoardError, InvalidCommand, InvalidFenError, InvalidMoveText, SessionError};
pub use crate::fen::{Colour, Piece, PieceKind, Position, START_FEN};
pub use crate::highlight::SquareHighlight;
pub use crate::moves::{Move, PromoPiece};
pub use crate::search_info::SearchInfo;
pub use crate::session::{EngineApi, EngineSession, SessionState};
pub use crate::square::{Orientation, Square};
pub use crate::transport::{LineTransport, ProcessTransport};
