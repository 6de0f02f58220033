use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;

use cryptobridge_protocol::AccessGrant;
use cryptobridge_types::Permissions;

use crate::commands::tool::{block_on, print_json, ToolOptions};
use crate::GrantArgs;

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];

pub fn access_v0(tool: &ToolOptions, args: &GrantArgs) -> Result<ExitCode> {
    let grant = grant(args)?;
    let cryptotool = tool.cryptotool()?;
    let certificate = block_on(cryptotool.create_access_certificate_v0(grant))?;
    print_json(&certificate)?;
    Ok(ExitCode::SUCCESS)
}

pub fn access_v1(tool: &ToolOptions, issuer: &str, args: &GrantArgs) -> Result<ExitCode> {
    let grant = grant(args)?;
    let cryptotool = tool.cryptotool()?;
    let certificate = block_on(cryptotool.create_access_certificate_v1(issuer, grant))?;
    print_json(&certificate)?;
    Ok(ExitCode::SUCCESS)
}

pub fn device(
    tool: &ToolOptions,
    issuer: &str,
    app_id: &str,
    serial: &str,
    public_key: &str,
) -> Result<ExitCode> {
    let cryptotool = tool.cryptotool()?;
    let certificate =
        block_on(cryptotool.create_device_certificate(issuer, app_id, serial, public_key))?;
    print_json(&certificate)?;
    Ok(ExitCode::SUCCESS)
}

fn grant(args: &GrantArgs) -> Result<AccessGrant> {
    let start = parse_timestamp(&args.start).context("invalid --start")?;
    let end = parse_timestamp(&args.end).context("invalid --end")?;
    let permissions = if args.all_permissions {
        Permissions::all()
    } else {
        args.permissions.iter().copied().collect()
    };
    let grant = AccessGrant::new(
        args.providing_serial.as_str(),
        args.gaining_serial.as_str(),
        args.gaining_public_key.as_str(),
        start,
        end,
        permissions,
    )?;
    Ok(grant)
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .with_context(|| format!("unrecognized timestamp `{value}`, expected YYYY-MM-DDTHH:MM"))
}
