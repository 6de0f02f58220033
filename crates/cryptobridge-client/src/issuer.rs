//! Issuer-bound operations.

use cryptobridge_protocol::AccessGrant;
use cryptobridge_types::{
    AccessCertificate, BridgeError, CertificateIssuer, DeviceCertificate, Signature, Validity,
};

use crate::Cryptotool;

/// A [`Cryptotool`] paired with the issuer whose keys sign on its behalf.
///
/// Signatures use the issuer's private key, verifications its public key,
/// and certificates carry the issuer name in hex.
#[derive(Debug, Clone)]
pub struct IssuerCryptotool {
    base: Cryptotool,
    issuer: CertificateIssuer,
}

impl IssuerCryptotool {
    pub fn new(base: Cryptotool, issuer: CertificateIssuer) -> Self {
        Self { base, issuer }
    }

    /// The wrapped executor, for operations that do not involve the issuer.
    pub fn base(&self) -> &Cryptotool {
        &self.base
    }

    pub fn issuer(&self) -> &CertificateIssuer {
        &self.issuer
    }

    pub async fn generate_signature(&self, message: &str) -> Result<Signature, BridgeError> {
        self.base
            .generate_signature(message, self.issuer.keys().private_key())
            .await
    }

    pub async fn verify_signature(
        &self,
        message: &str,
        signature: &str,
    ) -> Result<Validity, BridgeError> {
        self.base
            .verify_signature(message, signature, self.issuer.keys().public_key())
            .await
    }

    pub async fn create_device_certificate(
        &self,
        app_id: &str,
        serial: &str,
        public_key: &str,
    ) -> Result<DeviceCertificate, BridgeError> {
        self.base
            .create_device_certificate(&self.issuer.name_hex(), app_id, serial, public_key)
            .await
    }

    /// Issue an access certificate in the issuer-signed layout.
    pub async fn create_access_certificate(
        &self,
        grant: AccessGrant,
    ) -> Result<AccessCertificate, BridgeError> {
        self.base
            .create_access_certificate_v1(&self.issuer.name_hex(), grant)
            .await
    }
}
