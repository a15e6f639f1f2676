//! External process execution.
//!
//! [`SystemRunner`] spawns one OS process per call, optionally feeds it text on
//! stdin, and captures stdout and stderr into a single buffer. Both pipes are
//! drained on background threads that append to the same buffer as chunks
//! arrive, so the interleaving of the two streams is best-effort.
//!
//! The captured text is always returned, including when the process fails, so
//! callers have diagnostics to show.

use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use helm_kubeconform_core::{DEFAULT_HELM_BIN, DEFAULT_KUBECONFORM_BIN};
use tracing::debug;
use wait_timeout::ChildExt;

use crate::error::RunError;

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// How long to keep collecting output after a timed-out process was killed.
const TIMEOUT_DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Executable names for the two external tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tools {
    /// Chart renderer (`helm`).
    pub helm: String,
    /// Manifest validator (`kubeconform`).
    pub kubeconform: String,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            helm: DEFAULT_HELM_BIN.to_string(),
            kubeconform: DEFAULT_KUBECONFORM_BIN.to_string(),
        }
    }
}

/// Result of one process invocation.
#[derive(Debug)]
pub struct Execution {
    /// Combined stdout and stderr.
    pub output: String,
    /// `Some` when the process failed to launch or exited unsuccessfully.
    pub error: Option<RunError>,
}

impl Execution {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Splits into `Ok(output)` or `Err((output, error))`.
    pub fn into_result(self) -> Result<String, (String, RunError)> {
        match self.error {
            None => Ok(self.output),
            Some(err) => Err((self.output, err)),
        }
    }
}

/// Runs one external command to completion.
///
/// Implementations block the calling thread until the process exits.
pub trait ProcessRunner: Sync {
    fn run(&self, program: &str, args: &[String], input: Option<&str>) -> Execution;
}

/// [`ProcessRunner`] backed by [`std::process::Command`].
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kills any process still running after `timeout`. `None` waits forever.
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    fn wait(&self, child: &mut Child, program: &str) -> Result<ExitStatus, RunError> {
        let Some(timeout) = self.timeout else {
            return child.wait().map_err(|source| RunError::Io {
                program: program.to_string(),
                source,
            });
        };

        match child.wait_timeout(timeout) {
            Ok(Some(status)) => Ok(status),
            Ok(None) => {
                debug!(
                    program,
                    timeout_ms = timeout.as_millis() as u64,
                    "Process timed out, killing it"
                );
                let _ = child.kill();
                let _ = child.wait();
                Err(RunError::TimedOut {
                    program: program.to_string(),
                    timeout,
                })
            }
            Err(source) => {
                let _ = child.kill();
                let _ = child.wait();
                Err(RunError::Io {
                    program: program.to_string(),
                    source,
                })
            }
        }
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String], input: Option<&str>) -> Execution {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(program, ?args, stdin_bytes = input.map_or(0, str::len), "Launching process");
        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(source) => {
                debug!(program, error = %source, "Failed to spawn process");
                return Execution {
                    output: String::new(),
                    error: Some(RunError::Spawn {
                        program: program.to_string(),
                        source,
                    }),
                };
            }
        };

        // Drain both pipes while the child runs so neither fills up and blocks it.
        let captured = Arc::new(Mutex::new(Vec::new()));
        let (drained_tx, drained_rx) = mpsc::channel();
        let readers: Vec<JoinHandle<std::io::Result<()>>> = [
            child
                .stdout
                .take()
                .map(|pipe| drain_into(pipe, Arc::clone(&captured), drained_tx.clone())),
            child
                .stderr
                .take()
                .map(|pipe| drain_into(pipe, Arc::clone(&captured), drained_tx.clone())),
        ]
        .into_iter()
        .flatten()
        .collect();
        drop(drained_tx);

        let writer = match (child.stdin.take(), input) {
            (Some(mut stdin), Some(text)) => {
                let text = text.to_owned();
                Some(std::thread::spawn(move || stdin.write_all(text.as_bytes())))
            }
            _ => None,
        };

        let status = self.wait(&mut child, program);

        if matches!(status, Err(RunError::TimedOut { .. })) {
            // Processes started by the killed child can keep the pipes open
            // indefinitely. Collect what arrives within the grace period and
            // leave the remaining threads detached.
            let deadline = Instant::now() + TIMEOUT_DRAIN_GRACE;
            for _ in 0..readers.len() {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if drained_rx.recv_timeout(remaining).is_err() {
                    debug!(program, "Output pipes still open after timeout, not waiting");
                    break;
                }
            }
        } else {
            if let Some(Ok(Err(e))) = writer.map(JoinHandle::join) {
                // The process may exit without consuming all of its input.
                debug!(program, error = %e, "Failed to write process stdin");
            }
            for reader in readers {
                if let Ok(Err(e)) = reader.join() {
                    debug!(program, error = %e, "Failed to read process output");
                }
            }
        }

        let bytes = std::mem::take(&mut *captured.lock().unwrap_or_else(PoisonError::into_inner));
        let output = String::from_utf8_lossy(&bytes).into_owned();

        let error = match status {
            Ok(status) if status.success() => None,
            Ok(status) => Some(RunError::Exit {
                program: program.to_string(),
                code: status.code(),
            }),
            Err(err) => Some(err),
        };
        debug!(program, success = error.is_none(), output_len = output.len(), "Process finished");

        Execution { output, error }
    }
}

/// Appends everything read from `pipe` to `captured`, then signals `drained`.
fn drain_into<R>(
    mut pipe: R,
    captured: Arc<Mutex<Vec<u8>>>,
    drained: Sender<()>,
) -> JoinHandle<std::io::Result<()>>
where
    R: Read + Send + 'static,
{
    std::thread::spawn(move || {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let result = loop {
            let read = match pipe.read(&mut chunk) {
                Ok(0) => break Ok(()),
                Ok(read) => read,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => break Err(e),
            };
            captured
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend_from_slice(&chunk[..read]);
        };
        let _ = drained.send(());
        result
    })
}
