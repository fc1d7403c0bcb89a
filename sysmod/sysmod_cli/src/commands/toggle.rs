//! Toggle commands
//!
//! `toggle` and `auto-start` both dispatch into the engine and then print
//! the module's freshly read status, whether or not the action succeeded.

use anyhow::{Context, Result};
use clap::Args;
use sysmod_core::{ProgramId, SystemModule, ToggleAction, ToggleOutcome};

use crate::integration::Session;
use crate::render;

/// Arguments for the toggle and auto-start commands
#[derive(Args)]
pub struct ToggleArgs {
    /// Hexadecimal program id
    pub program_id: ProgramId,
}

/// Implementation of the toggle and auto-start commands
pub fn execute_toggle(session: &Session, args: &ToggleArgs, action: ToggleAction) -> Result<()> {
    let module = session
        .engine
        .registry()
        .get(args.program_id)
        .with_context(|| format!("Unknown module: {}", args.program_id))?;

    let result = session.engine.dispatch(module.program_id, action);

    if let Ok(outcome) = &result {
        println!("{}", describe(module, *outcome));
    }

    let status = session.engine.status(module.program_id)?;
    println!("{}", render::status_line(module, status));

    result
        .map(|_| ())
        .with_context(|| format!("Action on {} did not complete", module.name))
}

fn describe(module: &SystemModule, outcome: ToggleOutcome) -> String {
    match outcome {
        ToggleOutcome::Ignored => format!(
            "{} needs a reboot to take effect; use auto-start instead",
            module.name
        ),
        ToggleOutcome::Stopped { flag_cleared: true } => {
            format!("Stopped {} and disabled auto-start", module.name)
        }
        ToggleOutcome::Stopped { flag_cleared: false } => format!("Stopped {}", module.name),
        ToggleOutcome::Started { flag_set: true } => {
            format!("Started {} and enabled auto-start", module.name)
        }
        ToggleOutcome::Started { flag_set: false } => format!("Started {}", module.name),
        ToggleOutcome::AutoStartEnabled => format!("Enabled auto-start for {}", module.name),
        ToggleOutcome::AutoStartDisabled => format!("Disabled auto-start for {}", module.name),
    }
}
