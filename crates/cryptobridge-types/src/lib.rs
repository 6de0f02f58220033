//! Core types shared across all cryptobridge crates.
//!
//! Defines the error taxonomy, bridge configuration, the raw process result,
//! the typed values decoded from cryptotool output, and the permissions
//! bitmask consumed by access certificates.

pub mod config;
pub mod encoding;
pub mod error;
pub mod permissions;
pub mod process;
pub mod values;

pub use config::{BridgeConfig, CONFIG_FILENAME, DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_TIMEOUT_MS};
pub use encoding::{base64_to_hex, hex_to_base64};
pub use error::BridgeError;
pub use permissions::{Permission, Permissions, PERMISSIONS_IDENTIFIER};
pub use process::ProcessResult;
pub use values::{
    AccessCertificate, CertificateIssuer, DeviceCertificate, Hmac, Keys, Signature, Validity,
    Version, ISSUER_NAME_LENGTH,
};
