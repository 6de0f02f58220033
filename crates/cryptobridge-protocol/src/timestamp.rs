//! Validity timestamp encoding for access certificates.
//!
//! A timestamp is five bytes `[year - 2000, month, day, hour, minute]`
//! rendered as ten uppercase hex characters. Seconds are not representable
//! and are dropped.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use cryptobridge_types::BridgeError;

/// Earliest year a single year-offset byte can express.
pub const MIN_YEAR: i32 = 2000;
/// Latest year a single year-offset byte can express.
pub const MAX_YEAR: i32 = MIN_YEAR + u8::MAX as i32;

const TIMESTAMP_BYTES: usize = 5;

/// Encode a timestamp to its 10-character hex form.
///
/// Years outside [`MIN_YEAR`]..=[`MAX_YEAR`] are rejected rather than wrapped.
pub fn encode_timestamp(timestamp: &NaiveDateTime) -> Result<String, BridgeError> {
    let year = timestamp.year();
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(BridgeError::InvalidArgument(format!(
            "timestamp year {year} is outside {MIN_YEAR}..={MAX_YEAR}"
        )));
    }
    // Every field below fits a byte: month <= 12, day <= 31, hour <= 23, minute <= 59.
    let bytes = [
        (year - MIN_YEAR) as u8,
        timestamp.month() as u8,
        timestamp.day() as u8,
        timestamp.hour() as u8,
        timestamp.minute() as u8,
    ];
    Ok(hex::encode_upper(bytes))
}

/// Decode the 10-character hex form back into a timestamp with zero seconds.
pub fn decode_timestamp(encoded: &str) -> Result<NaiveDateTime, BridgeError> {
    let bytes = hex::decode(encoded.trim())
        .map_err(|e| BridgeError::InvalidArgument(format!("timestamp is not hex: {e}")))?;
    let [year, month, day, hour, minute] = <[u8; TIMESTAMP_BYTES]>::try_from(bytes.as_slice())
        .map_err(|_| {
            BridgeError::InvalidArgument(format!(
                "timestamp must be {TIMESTAMP_BYTES} bytes, got {}",
                bytes.len()
            ))
        })?;

    NaiveDate::from_ymd_opt(MIN_YEAR + i32::from(year), month.into(), day.into())
        .and_then(|date| date.and_hms_opt(hour.into(), minute.into(), 0))
        .ok_or_else(|| {
            BridgeError::InvalidArgument(format!("timestamp {encoded} is not a valid date"))
        })
}
