//! Locating the cryptotool and running async calls from the CLI.

use std::future::Future;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::debug;

use cryptobridge_client::Cryptotool;
use cryptobridge_types::{BridgeConfig, BridgeError, CONFIG_FILENAME};

/// Where the cryptotool lives and how long it may run.
///
/// Flags override values read from the config file.
#[derive(Args, Debug)]
pub struct ToolOptions {
    /// Config file (defaults to ./cryptobridge.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the cryptotool executable
    #[arg(long, env = "CRYPTOTOOL_PATH", global = true)]
    pub executable: Option<PathBuf>,

    /// Working directory for the cryptotool (defaults to the current directory)
    #[arg(long, global = true)]
    pub working_dir: Option<PathBuf>,

    /// Per-invocation timeout in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,
}

impl ToolOptions {
    /// Merge the config file (if any) with the command-line overrides.
    pub fn resolve(&self) -> Result<BridgeConfig> {
        let file = match &self.config {
            Some(path) => Some(path.clone()),
            None => {
                let default = PathBuf::from(CONFIG_FILENAME);
                default.is_file().then_some(default)
            }
        };

        let mut config = match file {
            Some(path) => BridgeConfig::load(&path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => {
                let executable = self.executable.clone().context(
                    "no cryptotool configured: pass --executable, set CRYPTOTOOL_PATH, or use --config",
                )?;
                let working_dir = match &self.working_dir {
                    Some(dir) => dir.clone(),
                    None => std::env::current_dir().context("failed to read current directory")?,
                };
                BridgeConfig::new(executable, working_dir)
            }
        };

        if let Some(executable) = &self.executable {
            config.executable = executable.clone();
        }
        if let Some(dir) = &self.working_dir {
            config.working_dir = dir.clone();
        }
        if let Some(ms) = self.timeout_ms {
            config.timeout_ms = ms;
        }
        debug!(
            executable = %config.executable.display(),
            working_dir = %config.working_dir.display(),
            timeout_ms = config.timeout_ms,
            "resolved cryptotool configuration"
        );
        Ok(config)
    }

    pub fn cryptotool(&self) -> Result<Cryptotool> {
        let config = self.resolve()?;
        Cryptotool::new(&config).context("invalid cryptotool configuration")
    }
}

/// Drive one bridge call to completion on a single-threaded runtime.
pub fn block_on<T, F>(future: F) -> Result<T>
where
    F: Future<Output = Result<T, BridgeError>>,
{
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;
    Ok(rt.block_on(future)?)
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{json}");
    Ok(())
}
