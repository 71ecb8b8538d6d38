use std::fmt::{Display, Formatter};

use crate::moves::Move;

pub const UCI_OK: &str = "uciok";
pub const READY_OK: &str = "readyok";
pub const FEN_MARKER: &str = "Fen:";
pub const PERFT_DONE: &str = "Nodes searched:";
pub const BEST_MOVE: &str = "bestmove";
pub const EVALUATION: &str = "Evaluation";

/// Commands the GUI writes to the engine, one per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    Uci,
    IsReady,
    UciNewGame,
    /// `position fen <fen> [moves ...]`, the text after `fen` verbatim
    Position(String),
    /// play a move on top of the engine's current position
    PlayMove(Move),
    Go,
    GoPerft(u32),
    GoDepth(u32),
    Stop,
    Diagram,
    Eval,
    Quit,
}

impl Display for EngineCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineCommand::Uci => write!(f, "uci"),
            EngineCommand::IsReady => write!(f, "isready"),
            EngineCommand::UciNewGame => write!(f, "ucinewgame"),
            EngineCommand::Position(args) => write!(f, "position fen {}", args.trim()),
            EngineCommand::PlayMove(m) => write!(f, "position actualpos moves {}", m.as_uci_string()),
            EngineCommand::Go => write!(f, "go"),
            EngineCommand::GoPerft(depth) => write!(f, "go perft {depth}"),
            EngineCommand::GoDepth(depth) => write!(f, "go depth {depth}"),
            EngineCommand::Stop => write!(f, "stop"),
            EngineCommand::Diagram => write!(f, "d"),
            EngineCommand::Eval => write!(f, "eval"),
            EngineCommand::Quit => write!(f, "quit"),
        }
    }
}

/// One `depth <int> score <int> bestMove <token>` line of an open ended search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressLine {
    pub depth: u32,
    pub score: i32,
    pub best_move: Move,
}

/// Finds the progress triple anywhere in the line, so `info ` prefixes or
/// trailing fields don't matter.
pub fn parse_progress_line(line: &str) -> Option<ProgressLine> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    tokens.windows(6).find_map(|w| match w {
        ["depth", depth, "score", score, "bestMove", best_move] => Some(ProgressLine {
            depth: depth.parse().ok()?,
            score: score.parse().ok()?,
            best_move: Move::new_from_text(best_move).ok()?,
        }),
        _ => None,
    })
}

/// Parses a `<move-token>: <count>` line of `go perft 1` output. Header and
/// summary lines (`Legal moves ...`, `Nodes searched: ...`) are rejected.
pub fn parse_perft_line(line: &str) -> Option<(Move, u64)> {
    let (token, count) = line.split_once(':')?;
    let count = count.trim().parse().ok()?;
    let m = Move::new_from_text(token.trim()).ok()?;

    Some((m, count))
}

pub fn parse_fen_line(line: &str) -> Option<&str> {
    let fen = line.trim().strip_prefix(FEN_MARKER)?.trim();
    (!fen.is_empty()).then_some(fen)
}

pub fn parse_bestmove_line(line: &str) -> Option<Move> {
    let mut tokens = line.split_whitespace();
    if tokens.next()? != BEST_MOVE {
        return None;
    }

    Move::new_from_text(tokens.next()?).ok()
}

/// `Evaluation : 35` or `Evaluation: 35`, in centipawns.
pub fn parse_eval_line(line: &str) -> Option<i32> {
    let rest = line.trim().strip_prefix(EVALUATION)?;
    let (_, value) = rest.split_once(':')?;
    value.trim().parse().ok()
}
