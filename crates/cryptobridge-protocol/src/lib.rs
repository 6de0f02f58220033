//! The cryptotool's command/response protocol.
//!
//! - [`command`]: one [`ToolCommand`] per operation, with validated
//!   parameters, the fixed argument order, and the decode rule
//! - [`parser`]: prefix-based extraction of values from stdout lines
//! - [`timestamp`]: the 5-byte validity timestamp encoding used by access
//!   certificates

pub mod command;
pub mod parser;
pub mod timestamp;

pub use command::{
    AccessCommandV0, AccessCommandV1, AccessGrant, DeviceCommand, HmacCommand,
    HmacVerifyCommand, KeysCommand, SignCommand, ToolCommand, VerifyCommand, VersionCommand,
};
pub use parser::{find_value, parse_validity, require_validity, require_value};
pub use timestamp::{decode_timestamp, encode_timestamp, MAX_YEAR, MIN_YEAR};
