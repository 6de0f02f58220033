//! One command type per cryptotool operation.
//!
//! Each command validates its parameters when constructed, so a command that
//! exists can always be turned into an argument vector without failing. The
//! argument order of every command is fixed by the tool and must not change.

use chrono::NaiveDateTime;
use cryptobridge_types::{
    AccessCertificate, BridgeError, DeviceCertificate, Hmac, Keys, Permissions, ProcessResult,
    Signature, Validity, Version,
};

use crate::parser::{
    require_validity, require_value, violation, ACCESS_CERT_PREFIX, DEVICE_CERT_PREFIX,
    HMAC_PREFIX, HMAC_VERIFY_PREFIX, PRIVATE_KEY_PREFIX, PUBLIC_KEY_PREFIX, SIGNATURE_PREFIX,
    VERIFY_PREFIX, VERSION_PREFIX,
};
use crate::timestamp::encode_timestamp;

/// Trailing flag that selects the legacy access certificate layout.
const ACCESS_V0_FLAG: &str = "-ac0";

/// A single request to the cryptotool and the rule for reading its answer.
pub trait ToolCommand {
    /// Typed value decoded from a successful run.
    type Output;

    /// Command token, passed as the first argument.
    fn name(&self) -> &'static str;

    /// Arguments following the command token, in wire order.
    fn args(&self) -> Vec<String>;

    /// Full argument vector: the command token followed by [`args`](ToolCommand::args).
    fn argv(&self) -> Vec<String> {
        let mut argv = vec![self.name().to_string()];
        argv.extend(self.args());
        argv
    }

    /// Decode the output of a run that exited with status zero.
    fn decode(&self, result: &ProcessResult) -> Result<Self::Output, BridgeError>;
}

fn require_non_empty(field: &str, value: String) -> Result<String, BridgeError> {
    if value.trim().is_empty() {
        return Err(BridgeError::InvalidArgument(format!(
            "`{field}` must not be empty"
        )));
    }
    Ok(value)
}

/// Turn a value-constructor failure on tool output into a protocol violation.
fn decoded<T>(
    result: &ProcessResult,
    command: &str,
    value: Result<T, BridgeError>,
) -> Result<T, BridgeError> {
    value.map_err(|e| violation(result, command, e.to_string()))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VersionCommand;

impl ToolCommand for VersionCommand {
    type Output = Version;

    fn name(&self) -> &'static str {
        "-v"
    }

    fn args(&self) -> Vec<String> {
        Vec::new()
    }

    fn decode(&self, result: &ProcessResult) -> Result<Version, BridgeError> {
        let text = require_value(result, self.name(), VERSION_PREFIX)?;
        decoded(result, self.name(), Version::parse(&text))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeysCommand;

impl ToolCommand for KeysCommand {
    type Output = Keys;

    fn name(&self) -> &'static str {
        "keys"
    }

    fn args(&self) -> Vec<String> {
        Vec::new()
    }

    fn decode(&self, result: &ProcessResult) -> Result<Keys, BridgeError> {
        let private_key = require_value(result, self.name(), PRIVATE_KEY_PREFIX)?;
        let public_key = require_value(result, self.name(), PUBLIC_KEY_PREFIX)?;
        decoded(result, self.name(), Keys::new(private_key, public_key))
    }
}

/// Sign a message with a private key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignCommand {
    message: String,
    private_key: String,
}

impl SignCommand {
    /// The message may be empty; the key may not.
    pub fn new(
        message: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Result<Self, BridgeError> {
        Ok(Self {
            message: message.into(),
            private_key: require_non_empty("private_key", private_key.into())?,
        })
    }
}

impl ToolCommand for SignCommand {
    type Output = Signature;

    fn name(&self) -> &'static str {
        "sign"
    }

    fn args(&self) -> Vec<String> {
        vec![self.message.clone(), self.private_key.clone()]
    }

    fn decode(&self, result: &ProcessResult) -> Result<Signature, BridgeError> {
        let signature = require_value(result, self.name(), SIGNATURE_PREFIX)?;
        decoded(result, self.name(), Signature::new(signature))
    }
}

/// Check a signature against a message and public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyCommand {
    message: String,
    signature: String,
    public_key: String,
}

impl VerifyCommand {
    pub fn new(
        message: impl Into<String>,
        signature: impl Into<String>,
        public_key: impl Into<String>,
    ) -> Result<Self, BridgeError> {
        Ok(Self {
            message: message.into(),
            signature: require_non_empty("signature", signature.into())?,
            public_key: require_non_empty("public_key", public_key.into())?,
        })
    }
}

impl ToolCommand for VerifyCommand {
    type Output = Validity;

    fn name(&self) -> &'static str {
        "verify"
    }

    fn args(&self) -> Vec<String> {
        vec![
            self.message.clone(),
            self.signature.clone(),
            self.public_key.clone(),
        ]
    }

    fn decode(&self, result: &ProcessResult) -> Result<Validity, BridgeError> {
        require_validity(result, self.name(), VERIFY_PREFIX)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HmacCommand {
    message: String,
    key: String,
}

impl HmacCommand {
    pub fn new(message: impl Into<String>, key: impl Into<String>) -> Result<Self, BridgeError> {
        Ok(Self {
            message: message.into(),
            key: require_non_empty("key", key.into())?,
        })
    }
}

impl ToolCommand for HmacCommand {
    type Output = Hmac;

    fn name(&self) -> &'static str {
        "hmac"
    }

    fn args(&self) -> Vec<String> {
        vec![self.message.clone(), self.key.clone()]
    }

    fn decode(&self, result: &ProcessResult) -> Result<Hmac, BridgeError> {
        let hmac = require_value(result, self.name(), HMAC_PREFIX)?;
        decoded(result, self.name(), Hmac::new(hmac))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HmacVerifyCommand {
    message: String,
    key: String,
    hmac: String,
}

impl HmacVerifyCommand {
    pub fn new(
        message: impl Into<String>,
        key: impl Into<String>,
        hmac: impl Into<String>,
    ) -> Result<Self, BridgeError> {
        Ok(Self {
            message: message.into(),
            key: require_non_empty("key", key.into())?,
            hmac: require_non_empty("hmac", hmac.into())?,
        })
    }
}

impl ToolCommand for HmacVerifyCommand {
    type Output = Validity;

    fn name(&self) -> &'static str {
        "hmacver"
    }

    fn args(&self) -> Vec<String> {
        vec![self.message.clone(), self.key.clone(), self.hmac.clone()]
    }

    fn decode(&self, result: &ProcessResult) -> Result<Validity, BridgeError> {
        require_validity(result, self.name(), HMAC_VERIFY_PREFIX)
    }
}

/// What an access certificate grants: who provides access, who gains it,
/// for how long, and with which capabilities.
///
/// Shared by both access certificate layouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    providing_serial: String,
    gaining_serial: String,
    gaining_public_key: String,
    validity_start: NaiveDateTime,
    validity_end: NaiveDateTime,
    permissions: Permissions,
    start_hex: String,
    end_hex: String,
}

impl AccessGrant {
    /// Validate and encode a grant.
    ///
    /// Fails if a serial or the public key is empty, if either timestamp
    /// falls outside the encodable year range, or if `validity_start` is not
    /// strictly before `validity_end` once both are truncated to the minute.
    pub fn new(
        providing_serial: impl Into<String>,
        gaining_serial: impl Into<String>,
        gaining_public_key: impl Into<String>,
        validity_start: NaiveDateTime,
        validity_end: NaiveDateTime,
        permissions: Permissions,
    ) -> Result<Self, BridgeError> {
        let providing_serial = require_non_empty("providing_serial", providing_serial.into())?;
        let gaining_serial = require_non_empty("gaining_serial", gaining_serial.into())?;
        let gaining_public_key =
            require_non_empty("gaining_public_key", gaining_public_key.into())?;
        let start_hex = encode_timestamp(&validity_start)?;
        let end_hex = encode_timestamp(&validity_end)?;
        // Equal-width uppercase hex sorts like the minutes it encodes.
        if start_hex >= end_hex {
            return Err(BridgeError::InvalidArgument(format!(
                "validity start {validity_start} must be before end {validity_end} \
                 at minute precision"
            )));
        }

        Ok(Self {
            providing_serial,
            gaining_serial,
            gaining_public_key,
            validity_start,
            validity_end,
            permissions,
            start_hex,
            end_hex,
        })
    }

    pub fn providing_serial(&self) -> &str {
        &self.providing_serial
    }

    pub fn gaining_serial(&self) -> &str {
        &self.gaining_serial
    }

    pub fn gaining_public_key(&self) -> &str {
        &self.gaining_public_key
    }

    pub fn validity_start(&self) -> NaiveDateTime {
        self.validity_start
    }

    pub fn validity_end(&self) -> NaiveDateTime {
        self.validity_end
    }

    pub fn permissions(&self) -> &Permissions {
        &self.permissions
    }

    /// Serials, key, window and permissions in wire order.
    fn wire_fields(&self) -> [String; 6] {
        [
            self.providing_serial.clone(),
            self.gaining_serial.clone(),
            self.gaining_public_key.clone(),
            self.start_hex.clone(),
            self.end_hex.clone(),
            self.permissions.to_hex(),
        ]
    }

    fn decode_certificate(
        &self,
        result: &ProcessResult,
        command: &str,
    ) -> Result<AccessCertificate, BridgeError> {
        let certificate = require_value(result, command, ACCESS_CERT_PREFIX)?;
        decoded(
            result,
            command,
            AccessCertificate::new(certificate, self.validity_start, self.validity_end),
        )
    }
}

/// Legacy access certificate without an issuer, selected by a trailing `-ac0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessCommandV0 {
    grant: AccessGrant,
}

impl AccessCommandV0 {
    pub fn new(grant: AccessGrant) -> Self {
        Self { grant }
    }

    pub fn grant(&self) -> &AccessGrant {
        &self.grant
    }
}

impl ToolCommand for AccessCommandV0 {
    type Output = AccessCertificate;

    fn name(&self) -> &'static str {
        "access"
    }

    fn args(&self) -> Vec<String> {
        let mut args = self.grant.wire_fields().to_vec();
        args.push(ACCESS_V0_FLAG.to_string());
        args
    }

    fn decode(&self, result: &ProcessResult) -> Result<AccessCertificate, BridgeError> {
        self.grant.decode_certificate(result, self.name())
    }
}

/// Access certificate signed on behalf of an issuer, who leads the argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessCommandV1 {
    issuer: String,
    grant: AccessGrant,
}

impl AccessCommandV1 {
    pub fn new(issuer: impl Into<String>, grant: AccessGrant) -> Result<Self, BridgeError> {
        Ok(Self {
            issuer: require_non_empty("issuer", issuer.into())?,
            grant,
        })
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn grant(&self) -> &AccessGrant {
        &self.grant
    }
}

impl ToolCommand for AccessCommandV1 {
    type Output = AccessCertificate;

    fn name(&self) -> &'static str {
        "access"
    }

    fn args(&self) -> Vec<String> {
        let mut args = vec![self.issuer.clone()];
        args.extend(self.grant.wire_fields());
        args
    }

    fn decode(&self, result: &ProcessResult) -> Result<AccessCertificate, BridgeError> {
        self.grant.decode_certificate(result, self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCommand {
    issuer: String,
    app_id: String,
    serial: String,
    public_key: String,
}

impl DeviceCommand {
    pub fn new(
        issuer: impl Into<String>,
        app_id: impl Into<String>,
        serial: impl Into<String>,
        public_key: impl Into<String>,
    ) -> Result<Self, BridgeError> {
        Ok(Self {
            issuer: require_non_empty("issuer", issuer.into())?,
            app_id: require_non_empty("app_id", app_id.into())?,
            serial: require_non_empty("serial", serial.into())?,
            public_key: require_non_empty("public_key", public_key.into())?,
        })
    }
}

impl ToolCommand for DeviceCommand {
    type Output = DeviceCertificate;

    fn name(&self) -> &'static str {
        "device"
    }

    fn args(&self) -> Vec<String> {
        vec![
            self.issuer.clone(),
            self.app_id.clone(),
            self.serial.clone(),
            self.public_key.clone(),
        ]
    }

    fn decode(&self, result: &ProcessResult) -> Result<DeviceCertificate, BridgeError> {
        let certificate = require_value(result, self.name(), DEVICE_CERT_PREFIX)?;
        decoded(result, self.name(), DeviceCertificate::new(certificate))
    }
}
