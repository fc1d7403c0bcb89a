//! Module listing commands
//!
//! Read-only views of the registry and the live status of each module.

use anyhow::{Context, Result};
use clap::Args;
use sysmod_core::ProgramId;

use crate::integration::Session;
use crate::render::{self, Snapshot};

/// Arguments for the list command
#[derive(Args)]
pub struct ListArgs {
    /// Print a JSON snapshot instead of text
    #[clap(long)]
    pub json: bool,
}

/// Arguments for the status command
#[derive(Args)]
pub struct StatusArgs {
    /// Hexadecimal program id
    pub program_id: ProgramId,
}

/// Implementation of the list command
pub fn execute_list(session: &Session, args: &ListArgs) -> Result<()> {
    if args.json {
        let snapshot = Snapshot::take(session);
        let json =
            serde_json::to_string_pretty(&snapshot).context("Failed to serialize snapshot")?;
        println!("{}", json);
    } else {
        print!("{}", render::module_list(session));
    }
    Ok(())
}

/// Implementation of the status command
pub fn execute_status(session: &Session, args: &StatusArgs) -> Result<()> {
    let module = session
        .engine
        .registry()
        .get(args.program_id)
        .with_context(|| format!("Unknown module: {}", args.program_id))?;

    let status = session.engine.status(module.program_id)?;

    println!("{}", render::status_line(module, status));
    Ok(())
}
