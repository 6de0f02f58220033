//! Raw outcome of one cryptotool process run.

/// Exit status and collected output lines of a finished process.
///
/// Produced once per invocation by the process invoker and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    /// Exit code, or `-1` when the process was terminated by a signal.
    pub status: i32,
    /// Stdout lines in emission order, line terminators stripped.
    pub stdout: Vec<String>,
    /// Stderr lines in emission order, line terminators stripped.
    pub stderr: Vec<String>,
}

impl ProcessResult {
    pub fn new(status: i32, stdout: Vec<String>, stderr: Vec<String>) -> Self {
        Self {
            status,
            stdout,
            stderr,
        }
    }

    /// Whether the process exited with status zero.
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Whether the process wrote anything to stderr.
    pub fn has_errors(&self) -> bool {
        self.stderr.iter().any(|line| !line.trim().is_empty())
    }

    /// Stdout with blank lines and bare line-separator artifacts removed.
    pub fn cleaned_output(&self) -> impl Iterator<Item = &str> {
        self.stdout
            .iter()
            .map(String::as_str)
            .filter(|line| !is_separator_artifact(line))
    }
}

/// A line carrying no payload: empty, whitespace only, or a stray separator.
fn is_separator_artifact(line: &str) -> bool {
    line.trim().is_empty() || line == "\n" || line == "\r\n"
}
