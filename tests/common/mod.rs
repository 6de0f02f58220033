//! Shared helpers for integration tests.
//!
//! Each integration test file compiles common/ as its own module, so not
//! every helper is used in every file.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use tempfile::TempDir;

use cryptobridge_client::Cryptotool;
use cryptobridge_types::BridgeConfig;

/// A stand-in cryptotool speaking the real line protocol.
///
/// Keys are derived from the process id, so concurrent runs produce distinct
/// pairs. A signature is `<key id>:<message>` and verifies against the public
/// key with the same id. Output is padded with blank and CR-only lines.
pub const FAKE_CRYPTOTOOL: &str = r#"#!/bin/sh
echo ""
printf '\r\n'
case "$1" in
  -v)
    echo "Cryptotool version 1.1.12"
    ;;
  keys)
    echo "PRIVATE: priv$$"
    echo "   "
    echo "PUBLIC: pub$$"
    ;;
  sign)
    echo "SIGNATURE: ${3#priv}:$2"
    ;;
  verify)
    if [ "$3" = "${4#pub}:$2" ]; then echo "VERIFY: CORRECT"; else echo "VERIFY: FALSE"; fi
    ;;
  hmac)
    echo "HMAC: h:$3:$2"
    ;;
  hmacver)
    if [ "$4" = "h:$3:$2" ]; then echo "HMAC VERIFY: CORRECT"; else echo "HMAC VERIFY: FALSE"; fi
    ;;
  access)
    if [ "$8" = "-ac0" ]; then
      echo "ACCESS CERT: v0-$2-$3-$5-$6-$7"
    else
      echo "ACCESS CERT: v1-$2-$3-$6-$7-$8"
    fi
    ;;
  device)
    echo "DEVICE CERT: dev-$2-$3-$4-$5"
    ;;
  *)
    echo "unknown command: $1" >&2
    exit 64
    ;;
esac
echo ""
"#;

/// Write an executable script named `cryptotool` into `dir`.
pub fn write_tool(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("cryptotool");
    std::fs::write(&path, contents).expect("should write fake cryptotool");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("should make fake cryptotool executable");
    }

    path
}

/// A bridge over [`FAKE_CRYPTOTOOL`]. Keep the `TempDir` alive for the test.
pub fn fake_cryptotool() -> (TempDir, Cryptotool) {
    scripted_cryptotool(FAKE_CRYPTOTOOL, Duration::from_secs(10))
}

/// A bridge over a custom `/bin/sh` script body.
pub fn scripted_cryptotool(script: &str, timeout: Duration) -> (TempDir, Cryptotool) {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let contents = if script.starts_with("#!") {
        script.to_string()
    } else {
        format!("#!/bin/sh\n{script}\n")
    };
    let exe = write_tool(dir.path(), &contents);
    let config = BridgeConfig::new(exe, dir.path()).with_timeout(timeout);
    let tool = Cryptotool::new(&config).expect("fake cryptotool config should be valid");
    (dir, tool)
}

pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .expect("test timestamp should be valid")
}
