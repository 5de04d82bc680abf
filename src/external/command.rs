//! Cancellable shell command execution
//!
//! Runs one shell command with stdout and stderr merged into a single pipe.
//! With a governing [`CancellationContext`] the output is drained by polling:
//! a reader thread forwards chunks over a channel, and the calling thread
//! either takes what is available or sleeps for one poll interval. The
//! context is checked before every iteration, so cancellation is observed
//! within one interval regardless of whether the process ever exits.

use crate::cancel::CancellationContext;
use crossbeam::channel::{self, Receiver, TryRecvError};
use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Default sleep between polls when no output is available
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

const READ_CHUNK_SIZE: usize = 4096;

/// Failure of a single command invocation
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("command `{command}` was cancelled")]
    Cancelled { command: String },

    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("command `{command}` failed with return code {code}, error: {output}")]
    NonZeroExit {
        command: String,
        code: i32,
        output: String,
    },
}

impl ProcessError {
    /// Cancellation is a normal outcome, not something to report to the user
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProcessError::Cancelled { .. })
    }
}

/// Shell command runner with a configurable poll interval
#[derive(Debug, Clone)]
pub struct CommandRunner {
    poll_interval: Duration,
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl CommandRunner {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Run `command` through `sh -c` and return its trimmed, combined output.
    ///
    /// A null `context` selects a plain blocking read; any other context
    /// selects the polling loop and can abort the call with
    /// [`ProcessError::Cancelled`].
    pub fn run(
        &self,
        context: &CancellationContext,
        command: &str,
    ) -> Result<String, ProcessError> {
        let (reader, mut child) = spawn_merged(command).map_err(|source| {
            error!("Failed to start command `{}`: {}", command, source);
            ProcessError::Spawn {
                command: command.to_string(),
                source,
            }
        })?;

        let raw = if context.is_null() {
            read_blocking(reader)
        } else {
            match self.read_polling(context, command, reader) {
                Some(raw) => raw,
                None => {
                    terminate(&mut child);
                    return Err(ProcessError::Cancelled {
                        command: command.to_string(),
                    });
                }
            }
        };

        let output = String::from_utf8_lossy(&raw).trim().to_string();
        let status = child.wait();
        log_command(command, output, status)
    }

    /// Drain `reader` until end of stream. `None` means the context was cancelled.
    fn read_polling(
        &self,
        context: &CancellationContext,
        command: &str,
        reader: io::PipeReader,
    ) -> Option<Vec<u8>> {
        let chunks = spawn_chunk_reader(reader);
        let mut output = Vec::new();

        loop {
            if context.is_cancelled() {
                debug!(
                    "> {}\n(cancelled)\n{}",
                    command,
                    String::from_utf8_lossy(&output).trim()
                );
                return None;
            }
            match chunks.try_recv() {
                Ok(Ok(chunk)) => output.extend_from_slice(&chunk),
                Ok(Err(e)) => {
                    warn!("Read error while draining `{}`: {}", command, e);
                    break;
                }
                Err(TryRecvError::Empty) => thread::sleep(self.poll_interval),
                Err(TryRecvError::Disconnected) => break,
            }
        }

        Some(output)
    }
}

/// Run with the default poll interval
pub fn run_command(context: &CancellationContext, command: &str) -> Result<String, ProcessError> {
    CommandRunner::default().run(context, command)
}

/// Spawn `sh -c command` with stdout and stderr writing into one pipe
fn spawn_merged(command: &str) -> io::Result<(io::PipeReader, Child)> {
    let (reader, writer) = io::pipe()?;

    // The Command owns both write ends; it must be dropped right after spawn
    // or the reader never sees end of stream.
    let child = {
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(writer.try_clone()?)
            .stderr(writer);
        cmd.spawn()?
    };

    Ok((reader, child))
}

fn read_blocking(mut reader: io::PipeReader) -> Vec<u8> {
    let mut output = Vec::new();
    if let Err(e) = reader.read_to_end(&mut output) {
        warn!("Read error while draining command output: {}", e);
    }
    output
}

/// Forward pipe contents as chunks; the channel disconnects at end of stream
fn spawn_chunk_reader(mut reader: io::PipeReader) -> Receiver<io::Result<Vec<u8>>> {
    let (tx, rx) = channel::unbounded();

    thread::spawn(move || {
        let mut buffer = [0u8; READ_CHUNK_SIZE];
        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(Ok(buffer[..n].to_vec())).is_err() {
                        break; // Caller gave up
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    let _ = tx.send(Err(e));
                    break;
                }
            }
        }
    });

    rx
}

fn terminate(child: &mut Child) {
    if let Err(e) = child.kill() {
        // Already exited
        debug!("kill after cancellation: {}", e);
    }
    if let Err(e) = child.wait() {
        warn!("Failed to reap cancelled command: {}", e);
    }
}

fn log_command(
    command: &str,
    output: String,
    status: io::Result<ExitStatus>,
) -> Result<String, ProcessError> {
    debug!("> {}", command);
    debug!("{}", output);

    let code = match status {
        Ok(status) if status.success() => return Ok(output),
        Ok(status) => status.code().unwrap_or(-1),
        Err(e) => {
            warn!("Failed to wait for `{}`: {}", command, e);
            -1
        }
    };

    let err = ProcessError::NonZeroExit {
        command: command.to_string(),
        code,
        output,
    };
    error!("ERROR: {}", err);
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_echo_with_background_context() {
        let output = run_command(&CancellationContext::background(), "echo hello").unwrap();
        assert_eq!(output, "hello");
    }

    #[test]
    fn test_echo_with_null_context() {
        let output = run_command(&CancellationContext::default(), "echo hello").unwrap();
        assert_eq!(output, "hello");
    }

    #[test]
    fn test_output_is_trimmed() {
        let output = run_command(&CancellationContext::new(), "printf '  padded \\n\\n'").unwrap();
        assert_eq!(output, "padded");
    }

    #[test]
    fn test_stderr_is_merged() {
        let output = run_command(&CancellationContext::new(), "echo out; echo err 1>&2").unwrap();
        assert!(output.contains("out"));
        assert!(output.contains("err"));
    }

    #[test]
    fn test_non_zero_exit_carries_code_and_output() {
        let err = run_command(&CancellationContext::new(), "echo boom; exit 3").unwrap_err();
        match err {
            ProcessError::NonZeroExit { code, output, .. } => {
                assert_eq!(code, 3);
                assert_eq!(output, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_zero_exit_blocking_path() {
        let err = run_command(&CancellationContext::default(), "exit 7").unwrap_err();
        assert!(matches!(err, ProcessError::NonZeroExit { code: 7, .. }));
    }

    #[test]
    fn test_already_cancelled_context_fails_fast() {
        let ctx = CancellationContext::new();
        ctx.cancel();

        let start = Instant::now();
        let err = run_command(&ctx, "sleep 10").unwrap_err();

        assert!(err.is_cancelled());
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_cancel_during_run_returns_promptly() {
        let ctx = CancellationContext::new();
        let canceller = ctx.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            canceller.cancel();
        });

        let start = Instant::now();
        let err = run_command(&ctx, "sleep 10").unwrap_err();
        let elapsed = start.elapsed();

        assert!(err.is_cancelled());
        // 50ms delay plus one 100ms poll interval, with slack for slow machines
        assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
    }

    #[test]
    fn test_custom_poll_interval() {
        let runner = CommandRunner::new(Duration::from_millis(10));
        assert_eq!(runner.poll_interval(), Duration::from_millis(10));
        assert_eq!(runner.run(&CancellationContext::new(), "echo fast").unwrap(), "fast");
    }
}
