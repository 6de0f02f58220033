//! Typed values decoded from cryptotool output.
//!
//! Every value is built through a validating constructor, so a value that
//! exists is structurally sound: required payloads are non-empty and an
//! access certificate's validity window is ordered.
//!
//! Deserialization is meant for reading back values this crate serialized
//! and does not re-run the checks.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::BridgeError;

/// Required length of a certificate issuer name, in characters.
pub const ISSUER_NAME_LENGTH: usize = 4;

fn require_non_empty(field: &str, value: String) -> Result<String, BridgeError> {
    if value.trim().is_empty() {
        return Err(BridgeError::InvalidArgument(format!(
            "`{field}` must not be empty"
        )));
    }
    Ok(value)
}

/// Outcome of a signature or HMAC verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Validity {
    Valid,
    Invalid,
}

impl Validity {
    pub fn is_valid(self) -> bool {
        self == Validity::Valid
    }
}

impl fmt::Display for Validity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validity::Valid => f.write_str("VALID"),
            Validity::Invalid => f.write_str("INVALID"),
        }
    }
}

/// A generated key pair, both halves as emitted by the tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keys {
    private_key: String,
    public_key: String,
}

impl Keys {
    pub fn new(
        private_key: impl Into<String>,
        public_key: impl Into<String>,
    ) -> Result<Self, BridgeError> {
        Ok(Self {
            private_key: require_non_empty("private_key", private_key.into())?,
            public_key: require_non_empty("public_key", public_key.into())?,
        })
    }

    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    signature: String,
}

impl Signature {
    pub fn new(signature: impl Into<String>) -> Result<Self, BridgeError> {
        Ok(Self {
            signature: require_non_empty("signature", signature.into())?,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.signature
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hmac {
    hmac: String,
}

impl Hmac {
    pub fn new(hmac: impl Into<String>) -> Result<Self, BridgeError> {
        Ok(Self {
            hmac: require_non_empty("hmac", hmac.into())?,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.hmac
    }
}

/// Version reported by the tool, split into its dotted components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    major: String,
    minor: String,
    patch: String,
}

impl Version {
    pub fn new(
        major: impl Into<String>,
        minor: impl Into<String>,
        patch: impl Into<String>,
    ) -> Self {
        Self {
            major: major.into(),
            minor: minor.into(),
            patch: patch.into(),
        }
    }

    /// Split a dotted version string. Missing components default to `"0"`.
    pub fn parse(text: &str) -> Result<Self, BridgeError> {
        let text = require_non_empty("version", text.trim().to_string())?;
        let mut parts = text.split('.').map(str::trim);
        let mut next = || {
            parts
                .next()
                .filter(|p| !p.is_empty())
                .unwrap_or("0")
                .to_string()
        };
        let major = next();
        let minor = next();
        let patch = next();
        Ok(Self {
            major,
            minor,
            patch,
        })
    }

    pub fn major(&self) -> &str {
        &self.major
    }

    pub fn minor(&self) -> &str {
        &self.minor
    }

    pub fn patch(&self) -> &str {
        &self.patch
    }

    /// `major.minor.patch`.
    pub fn full_version(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// An issued access certificate and the validity window it was requested with.
///
/// The window is carried over from the request; the tool never reports it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessCertificate {
    certificate: String,
    validity_start: NaiveDateTime,
    validity_end: NaiveDateTime,
}

impl AccessCertificate {
    pub fn new(
        certificate: impl Into<String>,
        validity_start: NaiveDateTime,
        validity_end: NaiveDateTime,
    ) -> Result<Self, BridgeError> {
        let certificate = require_non_empty("access_certificate", certificate.into())?;
        if validity_start >= validity_end {
            return Err(BridgeError::InvalidArgument(format!(
                "validity start {validity_start} must be before end {validity_end}"
            )));
        }
        Ok(Self {
            certificate,
            validity_start,
            validity_end,
        })
    }

    pub fn certificate(&self) -> &str {
        &self.certificate
    }

    pub fn validity_start(&self) -> NaiveDateTime {
        self.validity_start
    }

    pub fn validity_end(&self) -> NaiveDateTime {
        self.validity_end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCertificate {
    certificate: String,
}

impl DeviceCertificate {
    pub fn new(certificate: impl Into<String>) -> Result<Self, BridgeError> {
        Ok(Self {
            certificate: require_non_empty("device_certificate", certificate.into())?,
        })
    }

    pub fn certificate(&self) -> &str {
        &self.certificate
    }
}

/// The party whose key pair signs certificates on behalf of a holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateIssuer {
    name: String,
    keys: Keys,
}

impl CertificateIssuer {
    /// Create an issuer. The name must be exactly [`ISSUER_NAME_LENGTH`] characters.
    pub fn new(name: impl Into<String>, keys: Keys) -> Result<Self, BridgeError> {
        let name = name.into();
        let len = name.chars().count();
        if len != ISSUER_NAME_LENGTH {
            return Err(BridgeError::InvalidArgument(format!(
                "issuer name must be {ISSUER_NAME_LENGTH} characters, got {len}"
            )));
        }
        Ok(Self { name, keys })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keys(&self) -> &Keys {
        &self.keys
    }

    /// The issuer name as lowercase hex of its UTF-8 bytes, the form the tool expects.
    pub fn name_hex(&self) -> String {
        hex::encode(self.name.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, min, 0))
            .unwrap()
    }

    #[test]
    fn keys_reject_empty_halves() {
        assert!(Keys::new("", "pub").is_err());
        assert!(Keys::new("priv", "  ").is_err());
        let keys = Keys::new("priv", "pub").unwrap();
        assert_eq!(keys.private_key(), "priv");
        assert_eq!(keys.public_key(), "pub");
    }

    #[test]
    fn version_parse_fills_missing_parts() {
        let v = Version::parse("1.5").unwrap();
        assert_eq!((v.major(), v.minor(), v.patch()), ("1", "5", "0"));
        assert_eq!(v.full_version(), "1.5.0");

        let v = Version::parse(" 2.0.13 ").unwrap();
        assert_eq!(v.to_string(), "2.0.13");

        assert!(Version::parse("   ").is_err());
    }

    #[test]
    fn access_certificate_requires_ordered_window() {
        let start = at(2024, 1, 1, 0, 0);
        let end = at(2024, 6, 1, 12, 30);
        let cert = AccessCertificate::new("abcdef", start, end).unwrap();
        assert_eq!(cert.validity_start(), start);
        assert_eq!(cert.validity_end(), end);

        let err = AccessCertificate::new("abcdef", end, start).unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(AccessCertificate::new("abcdef", start, start).is_err());
    }

    #[test]
    fn issuer_name_length_is_enforced() {
        let keys = Keys::new("priv", "pub").unwrap();
        assert!(CertificateIssuer::new("abc", keys.clone()).is_err());
        assert!(CertificateIssuer::new("abcde", keys.clone()).is_err());

        let issuer = CertificateIssuer::new("tACC", keys).unwrap();
        assert_eq!(issuer.name_hex(), "74414343");
    }

    #[test]
    fn values_read_back_from_json() {
        let keys: Keys =
            serde_json::from_str(r#"{"private_key":"priv","public_key":"pub"}"#).unwrap();
        assert_eq!(keys, Keys::new("priv", "pub").unwrap());

        let validity: Validity = serde_json::from_str("\"INVALID\"").unwrap();
        assert_eq!(validity, Validity::Invalid);

        let cert = AccessCertificate::new("abcdef", at(2024, 1, 1, 0, 0), at(2024, 2, 1, 0, 0))
            .unwrap();
        let json = serde_json::to_string(&cert).unwrap();
        assert_eq!(serde_json::from_str::<AccessCertificate>(&json).unwrap(), cert);

        let issuer = CertificateIssuer::new("tACC", keys).unwrap();
        let json = serde_json::to_string(&issuer).unwrap();
        let back: CertificateIssuer = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name_hex(), "74414343");
    }

    #[test]
    fn validity_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&Validity::Valid).unwrap(),
            "\"VALID\""
        );
        assert_eq!(Validity::Invalid.to_string(), "INVALID");
        assert!(!Validity::Invalid.is_valid());
    }
}
