//! Extraction of values from the tool's line-oriented stdout.
//!
//! The tool prints one `PREFIX: value` line per result field, possibly
//! interleaved with blank lines and diagnostics. Lines are matched on their
//! prefix; the first matching line wins and everything else is ignored.

use cryptobridge_types::{BridgeError, ProcessResult, Validity};
use tracing::debug;

pub const VERSION_PREFIX: &str = "Cryptotool version";
pub const PRIVATE_KEY_PREFIX: &str = "PRIVATE: ";
pub const PUBLIC_KEY_PREFIX: &str = "PUBLIC: ";
pub const SIGNATURE_PREFIX: &str = "SIGNATURE: ";
pub const VERIFY_PREFIX: &str = "VERIFY: ";
pub const HMAC_PREFIX: &str = "HMAC: ";
pub const HMAC_VERIFY_PREFIX: &str = "HMAC VERIFY: ";
pub const ACCESS_CERT_PREFIX: &str = "ACCESS CERT: ";
pub const DEVICE_CERT_PREFIX: &str = "DEVICE CERT: ";

const VALID_TOKEN: &str = "CORRECT";
const INVALID_TOKEN: &str = "FALSE";

/// Value of the first line starting with `prefix`, prefix stripped and trimmed.
pub fn find_value<'a, I>(prefix: &str, lines: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .find_map(|line| line.strip_prefix(prefix))
        .map(|value| value.trim().to_string())
}

/// Like [`find_value`] over the cleaned stdout of `result`, but a missing or
/// empty value is a [`BridgeError::ProtocolViolation`] carrying the stderr.
pub fn require_value(
    result: &ProcessResult,
    command: &str,
    prefix: &str,
) -> Result<String, BridgeError> {
    match find_value(prefix, result.cleaned_output()) {
        Some(value) if !value.is_empty() => Ok(value),
        Some(_) => Err(violation(
            result,
            command,
            format!("`{}` line carries no value", prefix.trim()),
        )),
        None => Err(violation(
            result,
            command,
            format!("missing field `{}`", prefix.trim()),
        )),
    }
}

/// Map a verification token to a [`Validity`]. Unknown tokens yield `None`.
pub fn parse_validity(token: &str) -> Option<Validity> {
    match token.trim() {
        VALID_TOKEN => Some(Validity::Valid),
        INVALID_TOKEN => Some(Validity::Invalid),
        _ => None,
    }
}

/// Find the verification line for `prefix` and map its token.
///
/// Anything other than `CORRECT` or `FALSE` is a protocol violation, never
/// a silent `Invalid`.
pub fn require_validity(
    result: &ProcessResult,
    command: &str,
    prefix: &str,
) -> Result<Validity, BridgeError> {
    let token = require_value(result, command, prefix)?;
    parse_validity(&token).ok_or_else(|| {
        violation(
            result,
            command,
            format!("unexpected verification token `{token}`"),
        )
    })
}

pub(crate) fn violation(
    result: &ProcessResult,
    command: &str,
    message: impl Into<String>,
) -> BridgeError {
    let message = message.into();
    debug!(
        command,
        %message,
        stdout_lines = result.stdout.len(),
        "cryptotool output does not match protocol"
    );
    BridgeError::ProtocolViolation {
        command: command.to_string(),
        message,
        stderr: result.stderr.clone(),
    }
}
