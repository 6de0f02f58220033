use std::process::ExitCode;

use anyhow::Result;
use serde_json::json;

use cryptobridge_types::Validity;

use crate::commands::tool::{block_on, print_json, ToolOptions};

pub fn version(tool: &ToolOptions) -> Result<ExitCode> {
    let cryptotool = tool.cryptotool()?;
    let version = block_on(cryptotool.version())?;
    print_json(&json!({
        "version": version.full_version(),
        "major": version.major(),
        "minor": version.minor(),
        "patch": version.patch(),
    }))?;
    Ok(ExitCode::SUCCESS)
}

pub fn keys(tool: &ToolOptions) -> Result<ExitCode> {
    let cryptotool = tool.cryptotool()?;
    let keys = block_on(cryptotool.generate_keys())?;
    print_json(&keys)?;
    Ok(ExitCode::SUCCESS)
}

pub fn sign(tool: &ToolOptions, message: &str, private_key: &str) -> Result<ExitCode> {
    let cryptotool = tool.cryptotool()?;
    let signature = block_on(cryptotool.generate_signature(message, private_key))?;
    print_json(&signature)?;
    Ok(ExitCode::SUCCESS)
}

pub fn verify(
    tool: &ToolOptions,
    message: &str,
    signature: &str,
    public_key: &str,
) -> Result<ExitCode> {
    let cryptotool = tool.cryptotool()?;
    let validity = block_on(cryptotool.verify_signature(message, signature, public_key))?;
    report_validity(validity)
}

pub fn hmac(tool: &ToolOptions, message: &str, key: &str) -> Result<ExitCode> {
    let cryptotool = tool.cryptotool()?;
    let hmac = block_on(cryptotool.generate_hmac(message, key))?;
    print_json(&hmac)?;
    Ok(ExitCode::SUCCESS)
}

pub fn hmac_verify(tool: &ToolOptions, message: &str, key: &str, hmac: &str) -> Result<ExitCode> {
    let cryptotool = tool.cryptotool()?;
    let validity = block_on(cryptotool.verify_hmac(message, key, hmac))?;
    report_validity(validity)
}

/// Print the outcome; a mismatch exits 1 so scripts can branch on it.
fn report_validity(validity: Validity) -> Result<ExitCode> {
    print_json(&json!({ "validity": validity }))?;
    Ok(if validity.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}
