use log::{debug, error};

use crate::error::SessionError;
use crate::fen::Position;
use crate::moves::Move;
use crate::protocol::{
    parse_bestmove_line, parse_eval_line, parse_fen_line, parse_perft_line, parse_progress_line,
    EngineCommand, BEST_MOVE, EVALUATION, FEN_MARKER, PERFT_DONE, READY_OK, UCI_OK,
};
use crate::search_info::SearchInfo;
use crate::transport::LineTransport;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Searching,
}

/// What the board needs from an engine. Kept narrow so the board can be
/// driven by something other than a real engine process.
pub trait EngineApi {
    /// Every legal move in the engine's current position.
    fn legal_moves(&mut self) -> Result<Vec<Move>, SessionError>;

    /// Plays `m` and returns the resulting position text.
    fn make_move(&mut self, m: Move) -> Result<String, SessionError>;

    /// `position` is a fen, optionally followed by `moves ...`.
    fn set_position(&mut self, position: &str) -> Result<(), SessionError>;
}

/// One engine process spoken to over its standard streams.
///
/// Every position changing command is confirmed with an `isready` round
/// trip before returning. The open ended search (`go`) is the only command
/// that returns straight away; its progress is read back with
/// [`EngineSession::poll_search_info`], which never blocks.
///
/// A transport or protocol failure closes the session; it has to be
/// recreated afterwards.
pub struct EngineSession<T: LineTransport> {
    transport: T,
    state: SessionState,
    info: SearchInfo,
    initialized: bool,
    closed: bool,
}

impl<T: LineTransport> EngineSession<T> {
    pub fn new(transport: T) -> EngineSession<T> {
        EngineSession {
            transport,
            state: SessionState::Idle,
            info: SearchInfo::default(),
            initialized: false,
            closed: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn last_search_info(&self) -> &SearchInfo {
        &self.info
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Handshake. Only the first call talks to the engine.
    pub fn initialize(&mut self) -> Result<(), SessionError> {
        if self.initialized {
            return Ok(());
        }

        self.send(EngineCommand::Uci)?;
        self.wait_for(UCI_OK)?;
        self.initialized = true;
        debug!("engine initialised");

        Ok(())
    }

    pub fn set_position(&mut self, position_and_moves: &str) -> Result<(), SessionError> {
        self.stop_search()?;

        self.send(EngineCommand::Position(position_and_moves.to_string()))?;
        self.sync()
    }

    /// Starts an open ended search from `position_and_moves`, stopping any
    /// search already running first.
    pub fn start_search(&mut self, position_and_moves: &str) -> Result<(), SessionError> {
        self.stop_search()?;

        self.info = SearchInfo::default();
        self.set_position(position_and_moves)?;
        self.send(EngineCommand::Go)?;
        self.state = SessionState::Searching;
        debug!("search started");

        Ok(())
    }

    /// No-op while idle. Otherwise stops the search and drains whatever the
    /// engine still prints until it answers `readyok`.
    pub fn stop_search(&mut self) -> Result<(), SessionError> {
        if self.state == SessionState::Idle {
            return Ok(());
        }

        self.send(EngineCommand::Stop)?;
        self.send(EngineCommand::IsReady)?;
        let trailing = self.wait_for(READY_OK)?;

        for progress in trailing.iter().filter_map(|line| parse_progress_line(line)) {
            self.info.update(progress);
        }
        self.info.is_new = false;
        self.state = SessionState::Idle;
        debug!("search stopped");

        Ok(())
    }

    /// Never blocks. While idle the last snapshot comes back with `is_new`
    /// cleared, whatever the engine may have printed in the meantime. An
    /// engine whose output ended mid search is fatal to the session.
    pub fn poll_search_info(&mut self) -> Result<SearchInfo, SessionError> {
        self.info.is_new = false;

        if self.state == SessionState::Searching {
            for line in self.transport.try_poll() {
                if let Some(progress) = parse_progress_line(&line) {
                    self.info.update(progress);
                }
            }

            if self.transport.at_end_of_stream() || self.transport.is_closed() {
                return Err(self.fatal(SessionError::TransportClosed));
            }
        }

        Ok(self.info.clone())
    }

    pub fn query_legal_moves(&mut self) -> Result<Vec<Move>, SessionError> {
        self.stop_search()?;

        self.send(EngineCommand::GoPerft(1))?;
        let lines = self.wait_for(PERFT_DONE)?;

        Ok(lines
            .iter()
            .filter_map(|line| parse_perft_line(line))
            .map(|(m, _)| m)
            .collect())
    }

    /// Plays `m` on the engine's game and returns the resulting position.
    pub fn make_move(&mut self, m: Move) -> Result<String, SessionError> {
        self.stop_search()?;

        self.send(EngineCommand::PlayMove(m))?;
        self.position()
    }

    /// The engine's current position, read from its board dump.
    pub fn position(&mut self) -> Result<String, SessionError> {
        self.stop_search()?;

        self.send(EngineCommand::Diagram)?;
        let lines = self.wait_for(FEN_MARKER)?;

        match lines.iter().find_map(|line| parse_fen_line(line)) {
            Some(fen) if Position::is_valid_fen(fen) => Ok(fen.to_string()),
            _ => Err(self.fatal(SessionError::ProtocolViolation(format!(
                "no valid position in {:?}",
                lines.last()
            )))),
        }
    }

    pub fn new_game(&mut self) -> Result<(), SessionError> {
        self.stop_search()?;

        self.send(EngineCommand::UciNewGame)?;
        self.sync()
    }

    /// Static evaluation of the current position in centipawns.
    pub fn evaluate(&mut self) -> Result<i32, SessionError> {
        self.stop_search()?;

        self.send(EngineCommand::Eval)?;
        let lines = self.wait_for(EVALUATION)?;

        match lines.iter().find_map(|line| parse_eval_line(line)) {
            Some(eval) => Ok(eval),
            None => Err(self.fatal(SessionError::ProtocolViolation(format!(
                "unreadable evaluation {:?}",
                lines.last()
            )))),
        }
    }

    /// Searches to a fixed depth and blocks for the result.
    pub fn best_move(&mut self, depth: u32) -> Result<Move, SessionError> {
        self.stop_search()?;

        self.send(EngineCommand::GoDepth(depth))?;
        let lines = self.wait_for(BEST_MOVE)?;

        match lines.iter().find_map(|line| parse_bestmove_line(line)) {
            Some(m) => Ok(m),
            None => Err(self.fatal(SessionError::ProtocolViolation(format!(
                "unreadable best move {:?}",
                lines.last()
            )))),
        }
    }

    /// Asks the engine to quit, then kills and reaps it regardless.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.state = SessionState::Idle;

        if let Err(err) = self.transport.send(&EngineCommand::Quit.to_string()) {
            debug!("quit not delivered: {err}");
        }
        self.transport.close();
    }

    fn send(&mut self, command: EngineCommand) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::TransportClosed);
        }

        let command = command.to_string();
        self.transport.send(&command).map_err(|err| self.fatal(err))
    }

    fn wait_for(&mut self, marker: &str) -> Result<Vec<String>, SessionError> {
        if self.closed {
            return Err(SessionError::TransportClosed);
        }

        self.transport.wait_for(marker).map_err(|err| self.fatal(err))
    }

    fn sync(&mut self) -> Result<(), SessionError> {
        self.send(EngineCommand::IsReady)?;
        self.wait_for(READY_OK)?;
        Ok(())
    }

    fn fatal(&mut self, err: SessionError) -> SessionError {
        error!("engine session failed: {err}");
        self.close();
        err
    }
}

impl<T: LineTransport> EngineApi for EngineSession<T> {
    fn legal_moves(&mut self) -> Result<Vec<Move>, SessionError> {
        self.query_legal_moves()
    }

    fn make_move(&mut self, m: Move) -> Result<String, SessionError> {
        EngineSession::make_move(self, m)
    }

    fn set_position(&mut self, position: &str) -> Result<(), SessionError> {
        EngineSession::set_position(self, position)
    }
}

impl<T: LineTransport> Drop for EngineSession<T> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    /// Answers commands from a script instead of a process. Lines the
    /// engine "prints" on its own can be pushed with `emit`.
    struct ScriptedTransport {
        pub sent: Vec<String>,
        pending: VecDeque<String>,
        respond: fn(&str) -> Vec<String>,
        disconnected: bool,
        closed: bool,
    }

    impl ScriptedTransport {
        pub fn new(respond: fn(&str) -> Vec<String>) -> ScriptedTransport {
            ScriptedTransport {
                sent: Vec::new(),
                pending: VecDeque::new(),
                respond,
                disconnected: false,
                closed: false,
            }
        }

        pub fn emit(&mut self, line: &str) {
            self.pending.push_back(line.to_string());
        }

        /// The engine exits once whatever it already printed is read.
        pub fn disconnect(&mut self) {
            self.disconnected = true;
        }
    }

    impl LineTransport for ScriptedTransport {
        fn send(&mut self, command: &str) -> Result<(), SessionError> {
            if self.closed {
                return Err(SessionError::TransportClosed);
            }
            self.sent.push(command.to_string());
            self.pending.extend((self.respond)(command));
            Ok(())
        }

        fn try_poll(&mut self) -> Vec<String> {
            self.pending.drain(..).collect()
        }

        fn wait_for(&mut self, marker: &str) -> Result<Vec<String>, SessionError> {
            if self.closed {
                return Err(SessionError::TransportClosed);
            }

            let mut out = Vec::new();
            while let Some(line) = self.pending.pop_front() {
                let found = line.contains(marker);
                out.push(line);
                if found {
                    return Ok(out);
                }
            }

            Err(SessionError::ProtocolViolation(format!("engine output ended before {marker:?}")))
        }

        fn at_end_of_stream(&self) -> bool {
            self.disconnected && self.pending.is_empty()
        }

        fn close(&mut self) {
            self.closed = true;
        }

        fn is_closed(&self) -> bool {
            self.closed
        }
    }

    fn fake_engine(command: &str) -> Vec<String> {
        let lines: &[&str] = match command {
            "uci" => &["id name fake", "uciok"],
            "isready" => &["readyok"],
            "go perft 1" => &["Legal moves : 3", "e2e4: 1", "g1f3: 1", "a7a8q: 1", "Nodes searched: 3"],
            "d" => &[
                "+---+---+",
                "Fen: rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
                "Key: 0",
            ],
            "eval" => &["Evaluation : 35"],
            "go depth 3" => &["depth 1 score 10 bestMove e2e4", "bestmove d2d4"],
            "stop" => &["depth 9 score 40 bestMove c2c4", "bestmove c2c4"],
            _ => &[],
        };
        lines.iter().map(|l| l.to_string()).collect()
    }

    fn garbled_position_engine(command: &str) -> Vec<String> {
        match command {
            "d" => vec!["Fen: rnbqkbnr/pppppppp/9 w KQkq - 0 1".to_string()],
            _ => fake_engine(command),
        }
    }

    fn silent_engine(_: &str) -> Vec<String> {
        Vec::new()
    }

    fn session() -> EngineSession<ScriptedTransport> {
        let mut session = EngineSession::new(ScriptedTransport::new(fake_engine));
        session.initialize().unwrap();
        session.transport.sent.clear();
        session
    }

    #[test]
    fn initialize_only_handshakes_once() {
        let mut session = EngineSession::new(ScriptedTransport::new(fake_engine));
        session.initialize().unwrap();
        session.initialize().unwrap();

        assert_eq!(session.transport.sent, ["uci"]);
    }

    #[test]
    fn failed_handshake_tears_session_down() {
        let mut session = EngineSession::new(ScriptedTransport::new(silent_engine));

        assert!(matches!(session.initialize(), Err(SessionError::ProtocolViolation(_))));
        assert!(session.is_closed());
        assert!(session.transport.closed);
        assert!(matches!(session.set_position("8/8/8/8/8/8/8/8 w - -"), Err(SessionError::TransportClosed)));
    }

    #[test]
    fn stop_search_while_idle_sends_nothing() {
        let mut session = session();
        session.stop_search().unwrap();

        assert!(session.transport.sent.is_empty());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn set_position_waits_for_ready() {
        let mut session = session();
        session.set_position("8/8/8/8/8/8/k7/7K w - - 0 1").unwrap();

        assert_eq!(session.transport.sent, ["position fen 8/8/8/8/8/8/k7/7K w - - 0 1", "isready"]);
    }

    #[test]
    fn start_search_twice_stays_searching_with_fresh_snapshot() {
        let mut session = session();
        session.start_search("startpos_fen moves e2e4").unwrap();
        session.transport.emit("depth 5 score 20 bestMove e7e5");
        assert!(session.poll_search_info().unwrap().is_new);

        session.start_search("startpos_fen moves e2e4").unwrap();

        assert_eq!(session.state(), SessionState::Searching);
        assert_eq!(*session.last_search_info(), SearchInfo::default());
        assert_eq!(
            session.transport.sent,
            [
                "position fen startpos_fen moves e2e4",
                "isready",
                "go",
                "stop",
                "isready",
                "position fen startpos_fen moves e2e4",
                "isready",
                "go",
            ]
        );
    }

    #[test]
    fn poll_reports_latest_progress_once() {
        let mut session = session();
        session.start_search("fen").unwrap();

        session.transport.emit("depth 1 score 10 bestMove e2e4");
        session.transport.emit("some noise");
        session.transport.emit("depth 2 score -5 bestMove d2d4");

        let info = session.poll_search_info().unwrap();
        assert!(info.is_new);
        assert_eq!(info.depth, 2);
        assert_eq!(info.score, -5);
        assert_eq!(info.best_move, Some(Move::new_from_text("d2d4").unwrap()));

        let again = session.poll_search_info().unwrap();
        assert!(!again.is_new);
        assert_eq!(again.depth, 2);
    }

    #[test]
    fn poll_while_idle_ignores_queued_lines() {
        let mut session = session();
        session.transport.emit("depth 3 score 10 bestMove e2e4");

        let info = session.poll_search_info().unwrap();

        assert!(!info.is_new);
        assert_eq!(info, SearchInfo::default());
        assert!(session.transport.sent.is_empty());
    }

    #[test]
    fn stop_search_drains_trailing_output() {
        let mut session = session();
        session.start_search("fen").unwrap();
        session.stop_search().unwrap();

        assert_eq!(session.state(), SessionState::Idle);
        let info = session.poll_search_info().unwrap();
        assert!(!info.is_new);
        assert_eq!(info.depth, 9);
        assert!(session.transport.try_poll().is_empty());
    }

    #[test]
    fn legal_moves_skip_header_and_summary() {
        let mut session = session();
        let moves = session.query_legal_moves().unwrap();

        let expected: Vec<Move> = ["e2e4", "g1f3", "a7a8q"]
            .iter()
            .map(|m| Move::new_from_text(m).unwrap())
            .collect();
        assert_eq!(moves, expected);
    }

    #[test]
    fn legal_moves_stop_a_running_search_first() {
        let mut session = session();
        session.start_search("fen").unwrap();
        session.transport.sent.clear();

        session.query_legal_moves().unwrap();

        assert_eq!(session.transport.sent, ["stop", "isready", "go perft 1"]);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn make_move_returns_engine_position() {
        let mut session = session();
        let fen = session.make_move(Move::new_from_text("e2e4").unwrap()).unwrap();

        assert_eq!(fen, "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1");
        assert_eq!(session.transport.sent, ["position actualpos moves e2e4", "d"]);
    }

    #[test]
    fn evaluate_and_best_move() {
        let mut session = session();

        assert_eq!(session.evaluate().unwrap(), 35);
        assert_eq!(session.best_move(3).unwrap(), Move::new_from_text("d2d4").unwrap());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn close_is_idempotent() {
        let mut session = session();
        session.start_search("fen").unwrap();
        session.close();
        session.close();

        assert!(session.is_closed());
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.transport.sent.iter().filter(|c| *c == "quit").count(), 1);
        assert!(matches!(session.query_legal_moves(), Err(SessionError::TransportClosed)));
    }

    #[test]
    fn engine_exit_during_search_closes_session() {
        let mut session = session();
        session.start_search("fen").unwrap();
        session.transport.emit("depth 1 score 10 bestMove e2e4");
        session.transport.disconnect();

        assert!(matches!(session.poll_search_info(), Err(SessionError::TransportClosed)));
        assert!(session.is_closed());
        assert!(session.transport.closed);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.last_search_info().depth, 1);
    }

    #[test]
    fn unreadable_position_after_move_closes_session() {
        let mut session = EngineSession::new(ScriptedTransport::new(garbled_position_engine));
        session.initialize().unwrap();

        let err = session.make_move(Move::new_from_text("e2e4").unwrap()).unwrap_err();

        assert!(matches!(err, SessionError::ProtocolViolation(_)));
        assert!(session.is_closed());
    }
}
