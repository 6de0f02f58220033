mod commands;

use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use cryptobridge_types::Permission;
use tracing_subscriber::EnvFilter;

use crate::commands::tool::ToolOptions;

/// Cryptobridge -- typed front end for the cryptotool.
#[derive(Parser, Debug)]
#[command(name = "cryptobridge", version, about)]
struct Cli {
    #[command(flatten)]
    tool: ToolOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the cryptotool version
    Version,

    /// Generate a new key pair
    Keys,

    /// Sign a message with a private key
    Sign {
        #[arg(long, default_value = "")]
        message: String,

        #[arg(long)]
        private_key: String,
    },

    /// Verify a signature (exits 1 when the signature does not match)
    Verify {
        #[arg(long, default_value = "")]
        message: String,

        #[arg(long)]
        signature: String,

        #[arg(long)]
        public_key: String,
    },

    /// Compute an HMAC over a message
    Hmac {
        #[arg(long, default_value = "")]
        message: String,

        #[arg(long)]
        key: String,
    },

    /// Verify an HMAC (exits 1 when the HMAC does not match)
    HmacVerify {
        #[arg(long, default_value = "")]
        message: String,

        #[arg(long)]
        key: String,

        #[arg(long)]
        hmac: String,
    },

    /// Issue an access certificate in the legacy layout (no issuer)
    AccessV0 {
        #[command(flatten)]
        grant: GrantArgs,
    },

    /// Issue an access certificate signed on behalf of an issuer
    AccessV1 {
        /// Issuer name as hex (e.g. 74414343 for "tACC")
        #[arg(long)]
        issuer: String,

        #[command(flatten)]
        grant: GrantArgs,
    },

    /// Issue a device certificate
    Device {
        /// Issuer name as hex
        #[arg(long)]
        issuer: String,

        #[arg(long)]
        app_id: String,

        #[arg(long)]
        serial: String,

        #[arg(long)]
        public_key: String,
    },

    /// Print the hex encoding of a set of capabilities (does not run the tool)
    Permissions {
        /// Capability names, e.g. door_locks_read
        permissions: Vec<Permission>,

        /// Grant every capability
        #[arg(long, conflicts_with = "permissions")]
        all: bool,
    },
}

/// Parameters shared by both access certificate layouts.
#[derive(Args, Debug)]
struct GrantArgs {
    #[arg(long)]
    providing_serial: String,

    #[arg(long)]
    gaining_serial: String,

    #[arg(long)]
    gaining_public_key: String,

    /// Start of validity, e.g. 2024-01-31T08:00
    #[arg(long)]
    start: String,

    /// End of validity, e.g. 2025-01-31T08:00
    #[arg(long)]
    end: String,

    /// Granted capability (repeatable)
    #[arg(long = "permission")]
    permissions: Vec<Permission>,

    /// Grant every capability
    #[arg(long = "all-permissions", conflicts_with = "permissions")]
    all_permissions: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    // Logs go to stderr so stdout stays machine-readable (e.g. RUST_LOG=debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Permissions { permissions, all } => commands::permissions::run(permissions, all),
        Commands::Version => commands::crypto::version(&cli.tool),
        Commands::Keys => commands::crypto::keys(&cli.tool),
        Commands::Sign {
            message,
            private_key,
        } => commands::crypto::sign(&cli.tool, &message, &private_key),
        Commands::Verify {
            message,
            signature,
            public_key,
        } => commands::crypto::verify(&cli.tool, &message, &signature, &public_key),
        Commands::Hmac { message, key } => commands::crypto::hmac(&cli.tool, &message, &key),
        Commands::HmacVerify { message, key, hmac } => {
            commands::crypto::hmac_verify(&cli.tool, &message, &key, &hmac)
        }
        Commands::AccessV0 { grant } => commands::certificate::access_v0(&cli.tool, &grant),
        Commands::AccessV1 { issuer, grant } => {
            commands::certificate::access_v1(&cli.tool, &issuer, &grant)
        }
        Commands::Device {
            issuer,
            app_id,
            serial,
            public_key,
        } => commands::certificate::device(&cli.tool, &issuer, &app_id, &serial, &public_key),
    }
}
