use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidFenError {
    #[error("Invalid Pieces")]
    InvalidPieces,
    #[error("Invalid CTM")]
    InvalidCTM,
    #[error("Invalid Castle State")]
    InvalidCastleState,
    #[error("Invalid Ep Square")]
    InvalidEpSquare,
    #[error("Invalid HalfMove")]
    InvalidHalfmove,
    #[error("Invalid FullMove")]
    InvalidFullmove,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid move text: {0}")]
pub struct InvalidMoveText(pub String);

/// Failures of the engine process or of the protocol spoken over it.
///
/// Any of these is fatal to the session that raised it.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Engine transport closed")]
    TransportClosed,
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),
    #[error("Could not start engine {path:?}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Error, Debug)]
pub enum BoardError {
    #[error("Invalid position: {0}")]
    InvalidPositionText(#[from] InvalidFenError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown command: {0}")]
pub struct InvalidCommand(pub String);
