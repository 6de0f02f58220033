use std::process::ExitCode;

use anyhow::Result;
use serde::Serialize;

use cryptobridge_types::{Permission, Permissions};

use crate::commands::tool::print_json;

#[derive(Serialize)]
struct Encoded {
    hex: String,
    permissions: Permissions,
}

/// Print the access-certificate encoding of the named capabilities.
pub fn run(names: Vec<Permission>, all: bool) -> Result<ExitCode> {
    let permissions: Permissions = if all {
        Permissions::all()
    } else {
        names.into_iter().collect()
    };
    print_json(&Encoded {
        hex: permissions.to_hex(),
        permissions,
    })?;
    Ok(ExitCode::SUCCESS)
}
