use std::ffi::OsStr;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::error::SessionError;

/// Line oriented access to an engine: commands go in, output lines come
/// out in the order the engine wrote them.
pub trait LineTransport {
    /// Writes `command` plus a newline and flushes.
    fn send(&mut self, command: &str) -> Result<(), SessionError>;

    /// Every line that has arrived since the last call, without blocking.
    fn try_poll(&mut self) -> Vec<String>;

    /// Blocks until a line containing `marker` arrives. Returns all the lines
    /// consumed on the way, the matching one last.
    fn wait_for(&mut self, marker: &str) -> Result<Vec<String>, SessionError>;

    /// The engine's output has ended and every line of it has been read.
    fn at_end_of_stream(&self) -> bool;

    fn close(&mut self);

    fn is_closed(&self) -> bool;
}

/// An engine child process with a reader thread draining its stdout.
pub struct ProcessTransport {
    child: Child,
    stdin: Option<ChildStdin>,
    lines: Receiver<String>,
    wait_timeout: Option<Duration>,
    end_of_stream: bool,
    closed: bool,
}

impl ProcessTransport {
    pub fn spawn<I, S>(path: &Path, args: I, wait_timeout: Option<Duration>) -> Result<ProcessTransport, SessionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let spawn_err = |source| SessionError::Spawn { path: path.to_path_buf(), source };

        let mut child = Command::new(path)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(spawn_err)?;

        let stdin = child.stdin.take();
        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(SessionError::TransportClosed);
        };

        let (tx, rx) = channel();

        // detached: it ends by itself once the engine's stdout closes
        thread::Builder::new()
            .name("engine-reader".into())
            .spawn(move || {
                for line in BufReader::new(stdout).lines() {
                    let Ok(line) = line else { break };
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    info!(target: "output", "{line}");
                    if tx.send(line.to_string()).is_err() {
                        break;
                    }
                }
                debug!("engine output closed");
            })
            .map_err(spawn_err)?;

        debug!("spawned engine {path:?} pid {}", child.id());

        Ok(ProcessTransport {
            child,
            stdin,
            lines: rx,
            wait_timeout,
            end_of_stream: false,
            closed: false,
        })
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }

    fn recv(&mut self, deadline: Option<Instant>) -> Result<String, RecvTimeoutError> {
        match deadline {
            None => self.lines.recv().map_err(|_| RecvTimeoutError::Disconnected),
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                self.lines.recv_timeout(remaining)
            }
        }
    }
}

impl LineTransport for ProcessTransport {
    fn send(&mut self, command: &str) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::TransportClosed);
        }
        let stdin = self.stdin.as_mut().ok_or(SessionError::TransportClosed)?;

        info!(target: "input", "{command}");
        writeln!(stdin, "{command}")
            .and_then(|_| stdin.flush())
            .map_err(|err| {
                warn!("write to engine failed: {err}");
                SessionError::TransportClosed
            })
    }

    fn try_poll(&mut self) -> Vec<String> {
        let mut out = Vec::new();
        loop {
            match self.lines.try_recv() {
                Ok(line) => out.push(line),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.end_of_stream = true;
                    break;
                }
            }
        }
        out
    }

    fn wait_for(&mut self, marker: &str) -> Result<Vec<String>, SessionError> {
        if self.closed || self.end_of_stream {
            return Err(SessionError::TransportClosed);
        }

        let deadline = self.wait_timeout.map(|t| Instant::now() + t);
        let mut out = Vec::new();

        loop {
            match self.recv(deadline) {
                Ok(line) => {
                    let found = line.contains(marker);
                    out.push(line);
                    if found {
                        return Ok(out);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(SessionError::ProtocolViolation(format!(
                        "no {marker:?} within {:?}",
                        self.wait_timeout.unwrap_or_default()
                    )))
                }
                Err(RecvTimeoutError::Disconnected) => {
                    self.end_of_stream = true;
                    return Err(SessionError::ProtocolViolation(format!(
                        "engine output ended before {marker:?}"
                    )));
                }
            }
        }
    }

    fn at_end_of_stream(&self) -> bool {
        self.end_of_stream
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        // dropping stdin lets a well behaved engine see eof as well
        self.stdin.take();
        if let Err(err) = self.child.kill() {
            debug!("kill engine: {err}");
        }
        match self.child.wait() {
            Ok(status) => debug!("engine exited with {status}"),
            Err(err) => warn!("wait on engine failed: {err}"),
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for ProcessTransport {
    fn drop(&mut self) {
        self.close();
    }
}
