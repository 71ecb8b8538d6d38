use std::time::Duration;

use log::{debug, error, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::{task, time};

use crate::config::Config;
use crate::controller::{BoardController, ClickOutcome};
use crate::error::{BoardError, InvalidCommand};
use crate::fen::START_FEN;
use crate::poller::PollCadence;
use crate::search_info::SearchInfo;
use crate::session::EngineSession;
use crate::square::Square;
use crate::transport::{LineTransport, ProcessTransport};

use self::FrontendCommand::{Best, Click, ClickSquare, Engine, Eval, Fen, Moves, NewGame, Quit, Rotate, ShowBoard};

/// One line typed at the headless board.
#[derive(Debug, Clone, PartialEq)]
pub enum FrontendCommand {
    Click(f32, f32),
    ClickSquare(Square),
    Fen(String),
    Rotate,
    Engine(bool),
    Moves(Square),
    ShowBoard,
    Eval,
    Best(u32),
    NewGame,
    Quit,
}

impl FrontendCommand {
    pub fn new(line: &str) -> Result<FrontendCommand, InvalidCommand> {
        let line = line.trim();
        let (command, args) = line.split_at(line.find(' ').unwrap_or(line.len()));
        let args = args.trim();
        let invalid = || InvalidCommand(line.to_string());

        match command {
            "click" => {
                let mut coords = args.split_whitespace().map(str::parse::<f32>);
                match (coords.next(), coords.next(), coords.next()) {
                    (Some(Ok(x)), Some(Ok(y)), None) => Ok(Click(x, y)),
                    _ => Err(invalid()),
                }
            }
            "square" => args.parse().map(ClickSquare).map_err(|_| invalid()),
            "fen" if !args.is_empty() => Ok(Fen(args.to_string())),
            "rotate" => Ok(Rotate),
            "engine" => match args {
                "on" => Ok(Engine(true)),
                "off" => Ok(Engine(false)),
                _ => Err(invalid()),
            },
            "moves" => args.parse().map(Moves).map_err(|_| invalid()),
            "board" => Ok(ShowBoard),
            "eval" => Ok(Eval),
            "best" => args.parse().map(Best).map_err(|_| invalid()),
            "newgame" => Ok(NewGame),
            "quit" => Ok(Quit),
            _ => Err(invalid()),
        }
    }
}

fn describe(outcome: ClickOutcome) -> Option<String> {
    match outcome {
        ClickOutcome::Ignored => None,
        ClickOutcome::Selected(sq) => Some(format!("selected {sq}")),
        ClickOutcome::PromotionOffered => Some("choose a promotion piece".to_string()),
        ClickOutcome::Committed(m) => Some(format!("played {m}")),
        ClickOutcome::IllegalMove(m) => Some(format!("illegal move {m}")),
        ClickOutcome::Cancelled => Some("promotion cancelled".to_string()),
    }
}

/// A board driven by text commands, with an optional live engine analysis.
pub struct Frontend<T: LineTransport> {
    board: BoardController<EngineSession<T>>,
    engine_on: bool,
    cadence: PollCadence,
}

impl<T: LineTransport> Frontend<T> {
    /// Performs the engine handshake and sets up the starting position.
    pub fn new(mut session: EngineSession<T>, config: &Config) -> Result<Frontend<T>, BoardError> {
        session.initialize()?;

        Ok(Frontend {
            board: BoardController::new(session, config.square_size)?,
            engine_on: false,
            cadence: PollCadence::from_config(config),
        })
    }

    pub fn board(&self) -> &BoardController<EngineSession<T>> {
        &self.board
    }

    pub fn engine_on(&self) -> bool {
        self.engine_on
    }

    pub fn poll_delay(&self) -> Duration {
        self.cadence.delay()
    }

    /// Runs `command` and returns the text to show for it, if any.
    pub fn execute(&mut self, command: FrontendCommand) -> Result<Option<String>, BoardError> {
        let out = match command {
            Click(x, y) => {
                let outcome = self.board.click(x, y)?;
                self.after_click(outcome)?
            }
            ClickSquare(sq) => {
                let outcome = self.board.click_square(sq)?;
                self.after_click(outcome)?
            }
            Fen(fen) => match self.board.set_position(&fen) {
                Ok(()) => {
                    self.resume_search()?;
                    Some(self.diagram())
                }
                Err(BoardError::InvalidPositionText(err)) => Some(format!("invalid fen: {err}")),
                Err(err) => return Err(err),
            },
            Rotate => {
                self.board.rotate();
                Some(self.diagram())
            }
            Engine(on) => {
                self.engine_on = on;
                if on {
                    self.resume_search()?;
                } else {
                    self.board.engine_mut().stop_search()?;
                    self.board.set_engine_move(None);
                }
                None
            }
            Moves(sq) => {
                let destinations: Vec<String> = self
                    .board
                    .legal_destinations(sq)
                    .iter()
                    .map(|sq| sq.to_string())
                    .collect();
                Some(destinations.join(" "))
            }
            ShowBoard => Some(self.diagram()),
            Eval => {
                let score = self.board.engine_mut().evaluate()?;
                self.resume_search()?;
                Some(SearchInfo { score, ..SearchInfo::default() }.eval_text())
            }
            Best(depth) => {
                let m = self.board.engine_mut().best_move(depth)?;
                self.resume_search()?;
                Some(format!("bestmove {m}"))
            }
            NewGame => {
                self.board.engine_mut().new_game()?;
                self.board.set_position(START_FEN)?;
                self.resume_search()?;
                Some(self.diagram())
            }
            Quit => None,
        };

        Ok(out)
    }

    /// Picks up search progress. Only returns a snapshot when it has
    /// something new, whose best move then shows on the board. Fails once
    /// the engine is gone.
    pub fn poll(&mut self) -> Result<Option<SearchInfo>, BoardError> {
        let info = self.board.engine_mut().poll_search_info()?;
        self.cadence.record(&info);

        if !info.is_new {
            return Ok(None);
        }
        self.board.set_engine_move(info.best_move);
        Ok(Some(info))
    }

    pub fn close(&mut self) {
        self.board.engine_mut().close();
    }

    fn after_click(&mut self, outcome: ClickOutcome) -> Result<Option<String>, BoardError> {
        if let ClickOutcome::Committed(_) = outcome {
            self.resume_search()?;
        }
        Ok(describe(outcome))
    }

    fn resume_search(&mut self) -> Result<(), BoardError> {
        if !self.engine_on {
            return Ok(());
        }

        let game = self.board.history().fen_and_moves();
        self.board.engine_mut().start_search(&game)?;
        self.cadence.reset();
        Ok(())
    }

    fn diagram(&self) -> String {
        self.board.position().diagram(self.board.orientation())
    }
}

/// Spawns the engine and reads commands from stdin until `quit` or end of
/// input, printing search progress while the engine is on.
pub async fn run(config: Config) -> Result<(), BoardError> {
    let transport = ProcessTransport::spawn(&config.engine_path, &config.engine_args, config.wait_timeout)?;
    let mut frontend = task::block_in_place(|| Frontend::new(EngineSession::new(transport), &config))?;
    println!("{}", frontend.diagram());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let result = loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break Ok(()),
                    Err(err) => {
                        warn!("stdin closed: {err}");
                        break Ok(());
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }

                let command = match FrontendCommand::new(&line) {
                    Ok(Quit) => break Ok(()),
                    Ok(command) => command,
                    Err(err) => {
                        println!("{err}");
                        continue;
                    }
                };
                debug!("command {command:?}");

                match task::block_in_place(|| frontend.execute(command)) {
                    Ok(Some(text)) => println!("{text}"),
                    Ok(None) => {}
                    Err(err) => break Err(err),
                }
            }
            _ = time::sleep(frontend.poll_delay()), if frontend.engine_on() => {
                match task::block_in_place(|| frontend.poll()) {
                    Ok(Some(info)) => println!("{info}"),
                    Ok(None) => {}
                    Err(err) => break Err(err),
                }
            }
        }
    };

    if let Err(err) = &result {
        error!("{err}");
    }
    frontend.close();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn parses_commands() {
        assert_eq!(FrontendCommand::new("click 310.5 620"), Ok(Click(310.5, 620.0)));
        assert_eq!(FrontendCommand::new("square e2"), Ok(ClickSquare(sq("e2"))));
        assert_eq!(
            FrontendCommand::new("fen 8/4P3/8/8/8/8/k7/7K w - - 0 1"),
            Ok(Fen("8/4P3/8/8/8/8/k7/7K w - - 0 1".to_string()))
        );
        assert_eq!(FrontendCommand::new("  rotate "), Ok(Rotate));
        assert_eq!(FrontendCommand::new("engine on"), Ok(Engine(true)));
        assert_eq!(FrontendCommand::new("engine off"), Ok(Engine(false)));
        assert_eq!(FrontendCommand::new("moves g1"), Ok(Moves(sq("g1"))));
        assert_eq!(FrontendCommand::new("best 6"), Ok(Best(6)));
        assert_eq!(FrontendCommand::new("newgame"), Ok(NewGame));
        assert_eq!(FrontendCommand::new("quit"), Ok(Quit));
    }

    #[test]
    fn rejects_bad_commands() {
        for line in ["", "castle", "click 1", "click 1 2 3", "click a b", "square i9", "fen", "engine maybe", "best deep"] {
            assert_eq!(FrontendCommand::new(line), Err(InvalidCommand(line.trim().to_string())));
        }
    }

    #[test]
    fn describes_click_outcomes() {
        let m = crate::moves::Move::new_from_text("e2e4").unwrap();
        assert_eq!(describe(ClickOutcome::Ignored), None);
        assert_eq!(describe(ClickOutcome::Committed(m)).as_deref(), Some("played e2e4"));
        assert_eq!(describe(ClickOutcome::IllegalMove(m)).as_deref(), Some("illegal move e2e4"));
    }
}
