//! Configuration for a cryptotool bridge instance.
//!
//! [`BridgeConfig`] names the cryptotool executable, the directory it runs
//! in, and the limits applied to every invocation. It is loaded from
//! `cryptobridge.toml` or built directly by the caller.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::BridgeError;

/// Conventional file name for a bridge configuration.
pub const CONFIG_FILENAME: &str = "cryptobridge.toml";

/// Default per-invocation deadline. Smaller values produce false timeouts
/// against the reference binary.
pub const DEFAULT_TIMEOUT_MS: u64 = 3_000;

/// Default cap on retained text per output stream (1 MiB).
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Top-level configuration for the bridge.
///
/// ```toml
/// executable = "/opt/cryptotool/bin/crypto-tool"
/// working_dir = "/var/tmp/cryptotool"
/// timeout_ms = 5000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Path to the cryptotool executable.
    pub executable: PathBuf,
    /// Working directory every process is started in.
    pub working_dir: PathBuf,
    /// Wall-clock bound for spawn, drain and exit of one invocation.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum bytes of text retained from each of stdout and stderr.
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_max_output_bytes() -> usize {
    DEFAULT_MAX_OUTPUT_BYTES
}

impl BridgeConfig {
    /// Create a configuration with default limits.
    pub fn new(executable: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            working_dir: working_dir.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }

    /// Replace the per-invocation deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// The per-invocation deadline as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, BridgeError> {
        toml::from_str(content).map_err(|e| BridgeError::ConfigError(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, BridgeError> {
        toml::to_string_pretty(self).map_err(|e| BridgeError::ConfigError(e.to_string()))
    }

    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self, BridgeError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::ConfigError(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Check that the executable and working directory exist and the limits are usable.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if !self.executable.is_file() {
            return Err(BridgeError::ConfigError(format!(
                "executable does not exist: {}",
                self.executable.display()
            )));
        }
        if !self.working_dir.is_dir() {
            return Err(BridgeError::ConfigError(format!(
                "working directory does not exist: {}",
                self.working_dir.display()
            )));
        }
        if self.timeout_ms == 0 {
            return Err(BridgeError::ConfigError(
                "timeout_ms must be greater than zero".into(),
            ));
        }
        if self.max_output_bytes == 0 {
            return Err(BridgeError::ConfigError(
                "max_output_bytes must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
