//! Conversions between the hex keys the cryptotool speaks and base64.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::BridgeError;

/// Decode standard base64 and re-encode it as lowercase hex.
pub fn base64_to_hex(value: &str) -> Result<String, BridgeError> {
    let bytes = STANDARD
        .decode(value.trim())
        .map_err(|e| BridgeError::InvalidArgument(format!("value is not base64: {e}")))?;
    Ok(hex::encode(bytes))
}

/// Decode hex (either case) and re-encode it as standard padded base64.
pub fn hex_to_base64(value: &str) -> Result<String, BridgeError> {
    let bytes = hex::decode(value.trim())
        .map_err(|e| BridgeError::InvalidArgument(format!("value is not hex: {e}")))?;
    Ok(STANDARD.encode(bytes))
}
