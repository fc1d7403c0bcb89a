//! Text and JSON rendering of module status.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sysmod_core::{ModuleStatus, ProgramId, SystemModule};

use crate::integration::Session;

/// One status line: id, name and label.
pub fn status_line(module: &SystemModule, status: ModuleStatus) -> String {
    format!(
        "{}  {:<24}  {}",
        module.program_id,
        module.name,
        status.label()
    )
}

/// The full module list, grouped into live-toggleable and reboot-only sections.
pub fn module_list(session: &Session) -> String {
    if let Some(message) = session.scan.empty_message() {
        return format!("{}\n", message);
    }

    let batch = session.engine.refresh();
    let mut out = String::new();

    let dynamic: Vec<_> = batch.iter().filter(|(m, _)| !m.requires_reboot).collect();
    if !dynamic.is_empty() {
        out.push_str("Dynamic  |  toggle  |  auto-start\n");
        out.push_str("  These modules can be toggled at any time.\n");
        for (module, status) in dynamic {
            out.push_str(&format!("  {}\n", status_line(module, *status)));
        }
    }

    let fixed: Vec<_> = batch.iter().filter(|(m, _)| m.requires_reboot).collect();
    if !fixed.is_empty() {
        out.push_str("Static  |  auto-start\n");
        out.push_str("  These modules need a reboot to work.\n");
        for (module, status) in fixed {
            out.push_str(&format!("  {}\n", status_line(module, *status)));
        }
    }

    out
}

/// Machine-readable snapshot of one refresh.
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    /// When the statuses were read
    pub refreshed_at: DateTime<Utc>,

    /// Discovery result: `ok`, `empty` or `failed`
    pub scan: &'static str,

    /// Modules in discovery order
    pub modules: Vec<SnapshotEntry<'a>>,
}

/// One module in a [`Snapshot`].
#[derive(Debug, Serialize)]
pub struct SnapshotEntry<'a> {
    /// Program id as 16 hex digits
    pub program_id: ProgramId,

    /// Display name
    pub name: &'a str,

    /// Whether the module only takes effect after a reboot
    pub requires_reboot: bool,

    /// Whether a live process was reported
    pub running: bool,

    /// Whether the auto-start flag is set
    pub auto_start: bool,

    /// Status label as shown in text output
    pub label: &'static str,
}

impl<'a> Snapshot<'a> {
    /// Refresh every module of the session.
    pub fn take(session: &'a Session) -> Self {
        let modules = session
            .engine
            .refresh()
            .into_iter()
            .map(|(module, status)| SnapshotEntry {
                program_id: module.program_id,
                name: &module.name,
                requires_reboot: module.requires_reboot,
                running: status.running,
                auto_start: status.auto_start,
                label: status.label().as_str(),
            })
            .collect();

        Self {
            refreshed_at: Utc::now(),
            scan: session.scan.as_str(),
            modules,
        }
    }
}

