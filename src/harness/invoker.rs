//! Process invocation boundary.
//!
//! The [`Invoker`] trait separates "run an external program" from the runner's classification logic,
//! so the runner and the benchmark driver can be exercised against scripted results in tests.
//!
//! [`ProcessInvoker`] is the real implementation: it feeds the input on stdin from a writer thread,
//! drains stdout/stderr on reader threads (so a chatty program never blocks on a full pipe), and polls
//! `try_wait` until the process exits or the timeout expires. Output is collected up to the same
//! deadline, so a grandchild holding the pipes open cannot stall the run.

use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(5);
/// Time left to collect output after a kill, when the deadline has already passed.
const DRAIN_GRACE: Duration = Duration::from_millis(50);
const READ_CHUNK: usize = 8192;

/// Errors raised while invoking a program.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The program could not be started at all (missing binary, permission denied).
    #[error("cannot launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error while running '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// How the process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Exited(i32),
    /// Terminated by a signal it did not handle.
    Signaled(i32),
    /// Killed by the harness after the timeout expired.
    TimedOut,
}

/// Signals raised by the kernel on a program fault.
#[cfg(target_os = "macos")]
const FAULT_SIGNALS: [i32; 5] = [4, 6, 8, 10, 11];
#[cfg(not(target_os = "macos"))]
const FAULT_SIGNALS: [i32; 5] = [4, 6, 7, 8, 11];

/// SIGSEGV, the signal of an invalid memory access.
pub const SIGSEGV: i32 = 11;

/// Return `true` for SIGILL, SIGABRT, SIGBUS, SIGFPE and SIGSEGV.
pub fn is_fault_signal(signal: i32) -> bool {
    FAULT_SIGNALS.contains(&signal)
}

/// Captured result of one invocation.
#[derive(Debug, Clone)]
pub struct InvocationResult {
    pub termination: Termination,
    pub stdout: String,
    pub stderr: String,
    /// Either stream contained bytes outside 7-bit ASCII.
    pub encoding_violation: bool,
    pub elapsed: Duration,
}

impl InvocationResult {
    /// Exit code in the shell-less convention: a signal `n` is reported as `-n`.
    pub fn exit_code(&self) -> Option<i32> {
        match self.termination {
            Termination::Exited(code) => Some(code),
            Termination::Signaled(signal) => Some(-signal),
            Termination::TimedOut => None,
        }
    }

    /// Fault signal that ended the process, if any.
    pub fn fault_signal(&self) -> Option<i32> {
        match self.termination {
            Termination::Signaled(signal) if is_fault_signal(signal) => Some(signal),
            _ => None,
        }
    }
}

/// Run an external program with arguments and stdin text, capturing everything it produces.
pub trait Invoker {
    /// ## Errors
    /// - [`InvokeError::Launch`] when the program cannot be started. Callers treat this as fatal.
    fn invoke(&self, program: &Path, args: &[String], input: &str) -> Result<InvocationResult, InvokeError>;
}

/// Subprocess-backed invoker with a bounded wait.
#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    timeout: Duration,
}

impl ProcessInvoker {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Invoker for ProcessInvoker {
    #[tracing::instrument(skip_all, fields(program = %program.display(), argc = args.len(), input_len = input.len()))]
    fn invoke(&self, program: &Path, args: &[String], input: &str) -> Result<InvocationResult, InvokeError> {
        let name = program.display().to_string();

        let start = Instant::now();
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| InvokeError::Launch {
                program: name.clone(),
                source,
            })?;

        let writer = spawn_writer(child.stdin.take(), input);
        let stdout_reader = spawn_reader(child.stdout.take());
        let stderr_reader = spawn_reader(child.stderr.take());

        let mut termination = wait_bounded(&mut child, start, self.timeout).map_err(|source| InvokeError::Io {
            program: name.clone(),
            source,
        })?;

        // A descendant that inherited the pipes can keep them open after the child is gone; never wait
        // for it past the deadline.
        let deadline = (start + self.timeout).max(Instant::now() + DRAIN_GRACE);
        let stdout = drain(&stdout_reader, deadline, &name)?;
        let stderr = drain(&stderr_reader, deadline, &name)?;
        let elapsed = start.elapsed();

        if !(stdout.closed && stderr.closed) && termination != Termination::TimedOut {
            tracing::warn!(
                timeout_ms = self.timeout.as_millis() as u64,
                "output streams still open after the program exited, treating as timed out"
            );
            termination = Termination::TimedOut;
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        match writer.recv_timeout(remaining) {
            Ok(result) => result.map_err(|source| InvokeError::Io {
                program: name.clone(),
                source,
            })?,
            // Still blocked on a pipe nobody reads; the thread ends when the holder exits.
            Err(RecvTimeoutError::Timeout) => tracing::debug!("stdin writer abandoned"),
            Err(RecvTimeoutError::Disconnected) => {}
        }

        let encoding_violation = !stdout.bytes.is_ascii() || !stderr.bytes.is_ascii();
        if encoding_violation {
            tracing::debug!("captured output contains non-ASCII bytes");
        }
        tracing::debug!(?termination, elapsed_ms = elapsed.as_millis() as u64, "invocation finished");

        Ok(InvocationResult {
            termination,
            stdout: String::from_utf8_lossy(&stdout.bytes).into_owned(),
            stderr: String::from_utf8_lossy(&stderr.bytes).into_owned(),
            encoding_violation,
            elapsed,
        })
    }
}

fn spawn_writer<W: Write + Send + 'static>(pipe: Option<W>, input: &str) -> Receiver<io::Result<()>> {
    let (tx, rx) = mpsc::channel();
    if let Some(mut pipe) = pipe {
        let input = input.to_owned();
        thread::spawn(move || {
            let result = match pipe.write_all(input.as_bytes()) {
                // The program may legitimately exit before reading all of its input.
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                other => other,
            };
            let _ = tx.send(result);
        });
    }
    rx
}

/// Forward a stream chunk by chunk; the channel disconnects at end of stream.
fn spawn_reader<R: Read + Send + 'static>(stream: Option<R>) -> Receiver<io::Result<Vec<u8>>> {
    let (tx, rx) = mpsc::channel();
    if let Some(mut stream) = stream {
        thread::spawn(move || {
            let mut chunk = [0u8; READ_CHUNK];
            loop {
                match stream.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(Ok(chunk[..n].to_vec())).is_err() {
                            break;
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
    }
    rx
}

/// Bytes collected from one stream, and whether it reached end of stream.
struct Drained {
    bytes: Vec<u8>,
    closed: bool,
}

fn drain(reader: &Receiver<io::Result<Vec<u8>>>, deadline: Instant, program: &str) -> Result<Drained, InvokeError> {
    let mut bytes = Vec::new();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match reader.recv_timeout(remaining) {
            Ok(Ok(chunk)) => bytes.extend_from_slice(&chunk),
            Ok(Err(source)) => {
                return Err(InvokeError::Io {
                    program: program.to_string(),
                    source,
                });
            }
            Err(RecvTimeoutError::Timeout) => return Ok(Drained { bytes, closed: false }),
            Err(RecvTimeoutError::Disconnected) => return Ok(Drained { bytes, closed: true }),
        }
    }
}

fn wait_bounded(child: &mut Child, start: Instant, timeout: Duration) -> io::Result<Termination> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(termination_of(status));
        }
        if start.elapsed() >= timeout {
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "program timed out, killing it");
            // kill() fails only if the child already exited; the wait below reaps it either way.
            let _ = child.kill();
            child.wait()?;
            return Ok(Termination::TimedOut);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(unix)]
fn termination_of(status: ExitStatus) -> Termination {
    use std::os::unix::process::ExitStatusExt;

    match status.signal() {
        Some(signal) => Termination::Signaled(signal),
        None => Termination::Exited(status.code().unwrap_or(-1)),
    }
}

#[cfg(not(unix))]
fn termination_of(status: ExitStatus) -> Termination {
    Termination::Exited(status.code().unwrap_or(-1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(termination: Termination) -> InvocationResult {
        InvocationResult {
            termination,
            stdout: String::new(),
            stderr: String::new(),
            encoding_violation: false,
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn test_exit_code_conventions() {
        assert_eq!(result(Termination::Exited(3)).exit_code(), Some(3));
        assert_eq!(result(Termination::Signaled(SIGSEGV)).exit_code(), Some(-11));
        assert_eq!(result(Termination::TimedOut).exit_code(), None);
    }

    #[test]
    fn test_fault_signal_only_for_faults() {
        assert_eq!(result(Termination::Signaled(SIGSEGV)).fault_signal(), Some(SIGSEGV));
        // SIGTERM is not a fault.
        assert_eq!(result(Termination::Signaled(15)).fault_signal(), None);
        assert_eq!(result(Termination::Exited(139)).fault_signal(), None);
    }

    #[test]
    fn test_missing_program_is_launch_error() {
        let invoker = ProcessInvoker::new(Duration::from_secs(1));
        let err = invoker
            .invoke(Path::new("./definitely-not-a-real-program"), &[], "")
            .unwrap_err();
        assert!(matches!(err, InvokeError::Launch { .. }), "unexpected error: {err}");
    }
}
