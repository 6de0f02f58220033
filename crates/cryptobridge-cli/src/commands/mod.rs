//! CLI command implementations for the `cryptobridge` binary.

pub mod certificate;
pub mod crypto;
pub mod permissions;
pub mod tool;
