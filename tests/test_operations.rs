//! Every bridge operation against the scripted cryptotool.

mod common;

use cryptobridge_client::IssuerCryptotool;
use cryptobridge_protocol::AccessGrant;
use cryptobridge_types::{CertificateIssuer, Permission, Permissions, Validity};

use common::{at, fake_cryptotool};

fn door_grant() -> AccessGrant {
    AccessGrant::new(
        "PROVIDER01",
        "GAINER02",
        "gainer-public",
        at(2017, 11, 23, 14, 5),
        at(2018, 1, 1, 0, 0),
        Permissions::none()
            .with(Permission::DoorLocksRead)
            .with(Permission::DoorLocksWrite),
    )
    .expect("grant should be valid")
}

#[tokio::test]
async fn version_is_split_into_components() {
    let (_dir, tool) = fake_cryptotool();
    let version = tool.version().await.unwrap();
    assert_eq!(version.major(), "1");
    assert_eq!(version.minor(), "1");
    assert_eq!(version.patch(), "12");
}

#[tokio::test]
async fn generated_keys_have_both_halves() {
    let (_dir, tool) = fake_cryptotool();
    let keys = tool.generate_keys().await.unwrap();
    assert!(keys.private_key().starts_with("priv"));
    assert!(keys.public_key().starts_with("pub"));
    assert_eq!(&keys.private_key()[4..], &keys.public_key()[3..]);
}

#[tokio::test]
async fn sign_then_verify_round_trip() {
    let (_dir, tool) = fake_cryptotool();
    let keys = tool.generate_keys().await.unwrap();

    let signature = tool
        .generate_signature("open the doors", keys.private_key())
        .await
        .unwrap();
    let validity = tool
        .verify_signature("open the doors", signature.as_str(), keys.public_key())
        .await
        .unwrap();
    assert_eq!(validity, Validity::Valid);

    let tampered = tool
        .verify_signature("open the trunk", signature.as_str(), keys.public_key())
        .await
        .unwrap();
    assert_eq!(tampered, Validity::Invalid);
}

#[tokio::test]
async fn empty_message_can_be_signed() {
    let (_dir, tool) = fake_cryptotool();
    let signature = tool.generate_signature("", "priv42").await.unwrap();
    assert_eq!(signature.as_str(), "42:");
}

#[tokio::test]
async fn hmac_then_verify_round_trip() {
    let (_dir, tool) = fake_cryptotool();
    let hmac = tool.generate_hmac("payload", "secret").await.unwrap();
    assert_eq!(hmac.as_str(), "h:secret:payload");

    assert_eq!(
        tool.verify_hmac("payload", "secret", hmac.as_str())
            .await
            .unwrap(),
        Validity::Valid
    );
    assert_eq!(
        tool.verify_hmac("payload", "other", hmac.as_str())
            .await
            .unwrap(),
        Validity::Invalid
    );
}

#[tokio::test]
async fn access_v0_passes_encoded_window_and_permissions() {
    let (_dir, tool) = fake_cryptotool();
    let grant = door_grant();
    let cert = tool
        .create_access_certificate_v0(grant.clone())
        .await
        .unwrap();
    assert_eq!(
        cert.certificate(),
        "v0-PROVIDER01-GAINER02-110B170E05-1201010000-10001800000000"
    );
    assert_eq!(cert.validity_start(), grant.validity_start());
    assert_eq!(cert.validity_end(), grant.validity_end());
}

#[tokio::test]
async fn access_v1_passes_issuer_first() {
    let (_dir, tool) = fake_cryptotool();
    let cert = tool
        .create_access_certificate_v1("74414343", door_grant())
        .await
        .unwrap();
    assert_eq!(
        cert.certificate(),
        "v1-74414343-PROVIDER01-110B170E05-1201010000-10001800000000"
    );
}

#[tokio::test]
async fn device_certificate_arguments_in_order() {
    let (_dir, tool) = fake_cryptotool();
    let cert = tool
        .create_device_certificate("74414343", "APP1", "SERIAL9", "device-public")
        .await
        .unwrap();
    assert_eq!(cert.certificate(), "dev-74414343-APP1-SERIAL9-device-public");
}

#[tokio::test]
async fn issuer_wrapper_uses_issuer_keys_and_name() {
    let (_dir, tool) = fake_cryptotool();
    let keys = tool.generate_keys().await.unwrap();
    let issuer = CertificateIssuer::new("tACC", keys).unwrap();
    let bound = IssuerCryptotool::new(tool, issuer);

    let signature = bound.generate_signature("hello").await.unwrap();
    assert_eq!(
        bound
            .verify_signature("hello", signature.as_str())
            .await
            .unwrap(),
        Validity::Valid
    );

    let device = bound
        .create_device_certificate("APP1", "SERIAL9", "device-public")
        .await
        .unwrap();
    assert!(device.certificate().starts_with("dev-74414343-"));

    let access = bound.create_access_certificate(door_grant()).await.unwrap();
    assert!(access.certificate().starts_with("v1-74414343-"));

    assert!(bound.base().version().await.is_ok());
}

#[tokio::test]
async fn all_permissions_are_passed_verbatim() {
    let (_dir, tool) = fake_cryptotool();
    let grant = AccessGrant::new(
        "P",
        "G",
        "K",
        at(2020, 1, 1, 0, 0),
        at(2020, 1, 1, 0, 1),
        Permissions::all(),
    )
    .unwrap();
    let cert = tool.create_access_certificate_v0(grant).await.unwrap();
    assert!(cert.certificate().ends_with("-1007FFFFFFFFFF"));
}
