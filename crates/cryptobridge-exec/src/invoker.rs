//! Cryptotool process execution.
//!
//! Runs the configured executable with an argument vector, captures stdout
//! and stderr line by line, and enforces the configured deadline.
//!
//! Both output streams are drained by their own task from the moment the
//! process is spawned, while a third future waits for exit. A child that
//! fills one pipe while nobody reads it would otherwise block forever.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use cryptobridge_types::{BridgeConfig, BridgeError, ProcessResult};

/// Largest single read while discarding output past the cap.
const DISCARD_CHUNK_BYTES: u64 = 64 * 1024;

/// Launches the cryptotool once per call and collects its output.
///
/// Holds only immutable configuration, so one invoker can serve any number
/// of concurrent calls.
#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    executable: PathBuf,
    working_dir: PathBuf,
    timeout: Duration,
    max_output_bytes: usize,
}

impl ProcessInvoker {
    /// Create an invoker from a bridge configuration.
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            executable: config.executable.clone(),
            working_dir: config.working_dir.clone(),
            timeout: config.timeout(),
            max_output_bytes: config.max_output_bytes,
        }
    }

    /// Replace the deadline applied to each run.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run the executable with `args` and wait for it to finish.
    ///
    /// The first argument is treated as the command name for logs and
    /// errors. A non-zero exit status is reported in the result, not as an
    /// error; interpreting it is the caller's job. On deadline expiry the
    /// process and every process it started are killed, the child is
    /// reaped, the readers are aborted, and [`BridgeError::Timeout`] is
    /// returned.
    pub async fn run(&self, args: &[String]) -> Result<ProcessResult, BridgeError> {
        let command = args.first().cloned().unwrap_or_default();
        let start = Instant::now();

        // Arguments can carry private keys; only the command name is logged.
        debug!(
            executable = %self.executable.display(),
            command = %command,
            arg_count = args.len(),
            "spawning cryptotool"
        );

        let mut cmd = Command::new(&self.executable);
        cmd.args(args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so anything the tool starts can be killed with it.
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|source| BridgeError::ProcessLaunch {
            program: self.executable.clone(),
            source,
        })?;
        let mut group = ProcessGroup::new(child.id());

        let stdout = child.stdout.take().ok_or_else(|| BridgeError::Io {
            command: command.clone(),
            source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdout not captured"),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| BridgeError::Io {
            command: command.clone(),
            source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stderr not captured"),
        })?;

        let mut stdout_task = tokio::spawn(drain_lines(stdout, self.max_output_bytes, "stdout"));
        let mut stderr_task = tokio::spawn(drain_lines(stderr, self.max_output_bytes, "stderr"));

        let joined = tokio::time::timeout(self.timeout, async {
            tokio::join!(child.wait(), &mut stdout_task, &mut stderr_task)
        })
        .await;

        let (status, stdout, stderr) = match joined {
            Ok(parts) => {
                group.disarm();
                parts
            }
            Err(_elapsed) => {
                warn!(
                    command = %command,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "cryptotool timed out, killing process"
                );
                group.kill();
                if let Err(e) = child.kill().await {
                    debug!(command = %command, error = %e, "kill after timeout failed");
                }
                stdout_task.abort();
                stderr_task.abort();
                return Err(BridgeError::Timeout {
                    command,
                    timeout: self.timeout,
                });
            }
        };

        let status = status.map_err(|source| BridgeError::Io {
            command: command.clone(),
            source,
        })?;
        let stdout = collect_reader(stdout, &command)?;
        let stderr = collect_reader(stderr, &command)?;

        let result = ProcessResult::new(status.code().unwrap_or(-1), stdout, stderr);

        debug!(
            command = %command,
            status = result.status,
            stdout_lines = result.stdout.len(),
            stderr_lines = result.stderr.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "cryptotool finished"
        );

        Ok(result)
    }
}

type ReaderOutcome = Result<std::io::Result<Vec<String>>, tokio::task::JoinError>;

/// Flatten a finished reader task into its lines.
fn collect_reader(outcome: ReaderOutcome, command: &str) -> Result<Vec<String>, BridgeError> {
    let to_error = |source: std::io::Error| BridgeError::Io {
        command: command.to_string(),
        source,
    };
    outcome
        .map_err(|e| to_error(std::io::Error::new(std::io::ErrorKind::Other, e)))?
        .map_err(to_error)
}

/// Read `reader` to end-of-stream, one line at a time.
///
/// Lines are decoded lossily so a stray non-UTF-8 byte cannot fail the run.
/// No read buffers more than the remaining budget, so the cap also holds for
/// a line that never ends. Once the budget is spent, the rest of the stream
/// is read in bounded chunks and discarded so the child never blocks on a
/// full pipe.
async fn drain_lines<R>(
    reader: R,
    max_bytes: usize,
    stream: &'static str,
) -> std::io::Result<Vec<String>>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut lines = Vec::new();
    let mut retained = 0usize;
    let mut truncated = false;

    loop {
        buf.clear();
        if truncated {
            let read = (&mut reader)
                .take(DISCARD_CHUNK_BYTES)
                .read_until(b'\n', &mut buf)
                .await?;
            if read == 0 {
                break;
            }
            continue;
        }

        // Remaining budget plus room for a `\r\n` terminator.
        let limit = ((max_bytes - retained) as u64).saturating_add(2);
        let read = (&mut reader).take(limit).read_until(b'\n', &mut buf).await?;
        if read == 0 {
            break;
        }
        let complete = buf.ends_with(b"\n") || (read as u64) < limit;
        let line = decode_line(&buf);
        if !complete || retained + line.len() > max_bytes {
            warn!(stream, max_bytes, "cryptotool output exceeds cap, discarding the rest");
            truncated = true;
            continue;
        }
        retained += line.len();
        lines.push(line);
    }

    Ok(lines)
}

/// The child's process group, killed on drop unless disarmed.
///
/// Covers timeouts and cancelled callers alike. A run that finished on its
/// own disarms the guard.
struct ProcessGroup {
    pgid: Option<u32>,
}

impl ProcessGroup {
    fn new(pgid: Option<u32>) -> Self {
        Self { pgid }
    }

    fn kill(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_process_group(pgid);
        }
    }

    fn disarm(&mut self) {
        self.pgid = None;
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(unix)]
fn kill_process_group(pgid: u32) {
    // pid_t is i32; a wrapped or zero id would signal the wrong group.
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return;
    };
    if pgid <= 0 {
        return;
    }
    // SAFETY: killpg takes no pointers; it only signals the given group.
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
        debug!(
            pgid,
            error = %std::io::Error::last_os_error(),
            "failed to kill cryptotool process group"
        );
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pgid: u32) {}

/// Strip a trailing `\n` or `\r\n` and decode.
fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
