//! Error types shared across all cryptobridge crates.

use std::path::PathBuf;
use std::time::Duration;

/// Number of trailing stderr lines included in an error's display string.
const STDERR_TAIL_LINES: usize = 5;

/// Errors that can occur while driving the cryptotool.
///
/// Each variant tells the caller where the fault lies: in the inputs
/// (`InvalidArgument`), the environment (`ProcessLaunch`, `Io`, `ConfigError`),
/// or the external tool (`Timeout`, `NonZeroExit`, `ProtocolViolation`).
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// A caller-supplied parameter failed a precondition. No process was spawned.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The executable could not be started.
    #[error("failed to launch {}: {source}", .program.display())]
    ProcessLaunch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The process exceeded its deadline and was killed.
    #[error("`{command}` timed out after {}ms", .timeout.as_millis())]
    Timeout { command: String, timeout: Duration },

    /// Expected output was missing or malformed.
    #[error("protocol violation in `{command}`: {message}{}", stderr_tail(.stderr))]
    ProtocolViolation {
        command: String,
        message: String,
        stderr: Vec<String>,
    },

    /// The process terminated with a failure status.
    #[error("`{command}` exited with status {status}{}", stderr_tail(.stderr))]
    NonZeroExit {
        command: String,
        status: i32,
        stderr: Vec<String>,
    },

    /// Reading from or waiting on a running process failed.
    #[error("i/o error while running `{command}`: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl BridgeError {
    /// Stderr lines captured from the tool, if this error carries any.
    pub fn stderr(&self) -> &[String] {
        match self {
            BridgeError::ProtocolViolation { stderr, .. } | BridgeError::NonZeroExit { stderr, .. } => {
                stderr
            }
            _ => &[],
        }
    }

    /// Whether the failure was a deadline expiry, so callers can retry with a longer one.
    pub fn is_timeout(&self) -> bool {
        matches!(self, BridgeError::Timeout { .. })
    }

    /// Whether the failure was detected before any process was started.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, BridgeError::InvalidArgument(_))
    }
}

fn stderr_tail(stderr: &[String]) -> String {
    if stderr.is_empty() {
        return String::new();
    }
    let start = stderr.len().saturating_sub(STDERR_TAIL_LINES);
    format!(" (stderr: {})", stderr[start..].join(" | "))
}
