//! Process boundary to the external media tool.
//!
//! Every decoder invocation goes through [`CommandExecutor`] so the adapters
//! and the pipeline can be exercised without ffmpeg installed. Each call
//! carries a deadline; a process that outlives it is killed.

use crate::error::{HawkeyeError, Result};
use crossbeam_channel::unbounded;
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read};
use std::process::{Command, Stdio};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

/// What a finished process left behind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was terminated by a signal.
    pub code: Option<i32>,
    /// Stdout and stderr lines, interleaved in arrival order.
    pub lines: Vec<String>,
}

impl CommandOutput {
    pub fn success(lines: Vec<String>) -> Self {
        Self {
            code: Some(0),
            lines,
        }
    }

    pub fn failure(code: i32, lines: Vec<String>) -> Self {
        Self {
            code: Some(code),
            lines,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Trait for executing system commands.
///
/// A non-zero exit is reported through [`CommandOutput::code`], not as an
/// error; errors mean the process could not be run or missed its deadline.
pub trait CommandExecutor: Send + Sync {
    fn execute(&self, command: &str, args: &[String], timeout: Duration) -> Result<CommandOutput>;
}

/// Production executor backed by `std::process::Command`.
#[derive(Debug, Clone, Default)]
pub struct SystemCommandExecutor {
    echo: bool,
}

impl SystemCommandExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror every output line to stderr as it arrives.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(10);

fn spawn_line_reader<R: Read + Send + 'static>(
    source: R,
    tx: crossbeam_channel::Sender<String>,
    echo: bool,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut reader = BufReader::new(source);
        let mut buf = Vec::new();
        // Drain until EOF even past undecodable bytes, or the child gets SIGPIPE
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = String::from_utf8_lossy(&buf)
                .trim_end_matches(['\n', '\r'])
                .to_string();
            if echo {
                eprintln!("[decoder] {}", line);
            }
            if tx.send(line).is_err() {
                break;
            }
        }
    })
}

impl CommandExecutor for SystemCommandExecutor {
    fn execute(&self, command: &str, args: &[String], timeout: Duration) -> Result<CommandOutput> {
        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    HawkeyeError::DecoderNotFound {
                        tool: command.to_string(),
                    }
                } else {
                    HawkeyeError::DecoderFailed {
                        tool: command.to_string(),
                        message: format!("cannot start: {}", e),
                    }
                }
            })?;

        let (line_tx, line_rx) = unbounded();
        let mut readers = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_line_reader(stdout, line_tx.clone(), self.echo));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_line_reader(stderr, line_tx.clone(), self.echo));
        }
        drop(line_tx);

        // No deadline when the timeout is too large to represent
        let deadline = Instant::now().checked_add(timeout);
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                if let Err(e) = child.kill() {
                    eprintln!("hawkeye: failed to kill {}: {}", command, e);
                }
                if let Err(e) = child.wait() {
                    eprintln!("hawkeye: failed to reap {}: {}", command, e);
                }
                // Reader threads finish on their own once the pipes close.
                return Err(HawkeyeError::DecoderTimeout {
                    tool: command.to_string(),
                    timeout_secs: timeout.as_secs(),
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        for reader in readers {
            if reader.join().is_err() {
                eprintln!("hawkeye: output reader for {} panicked", command);
            }
        }

        Ok(CommandOutput {
            code: status.code(),
            lines: line_rx.try_iter().collect(),
        })
    }
}

type Effect = Box<dyn Fn(&str, &[String]) + Send + Sync>;

/// Scripted executor for tests.
///
/// Public so integration tests and downstream crates can drive the pipeline
/// without ffmpeg, the same way the audio and transcription mocks are
/// exported. Records every call, replays queued responses in order (a plain success
/// once the queue is empty), and optionally runs a side effect per call so a
/// test can create the files a real decoder would have written.
pub struct MockCommandExecutor {
    calls: Mutex<Vec<(String, Vec<String>)>>,
    responses: Mutex<VecDeque<Result<CommandOutput>>>,
    effect: Option<Effect>,
}

impl Default for MockCommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCommandExecutor {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
            effect: None,
        }
    }

    /// Queue a response for the next unanswered call.
    pub fn with_response(self, response: Result<CommandOutput>) -> Self {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(response);
        }
        self
    }

    /// Run `effect` on every call, before its response is returned.
    pub fn with_effect<F>(mut self, effect: F) -> Self
    where
        F: Fn(&str, &[String]) + Send + Sync + 'static,
    {
        self.effect = Some(Box::new(effect));
        self
    }

    /// All recorded calls, oldest first.
    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl CommandExecutor for MockCommandExecutor {
    fn execute(&self, command: &str, args: &[String], _timeout: Duration) -> Result<CommandOutput> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((command.to_string(), args.to_vec()));
        }
        if let Some(effect) = &self.effect {
            effect(command, args);
        }
        self.responses
            .lock()
            .ok()
            .and_then(|mut responses| responses.pop_front())
            .unwrap_or_else(|| Ok(CommandOutput::success(Vec::new())))
    }
}
