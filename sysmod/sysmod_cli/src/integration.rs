//! Wiring between the CLI and `sysmod_core`.
//!
//! Discovery runs once per invocation; the resulting engine serves every
//! status read and action for the rest of the session.

use sysmod_core::{
    CommandProcessController, FsFlagStore, ModuleRegistry, SysmodConfig, ToggleEngine,
};
use tracing::warn;

/// Engine type used by the CLI.
pub type Engine = ToggleEngine<CommandProcessController, FsFlagStore>;

/// Outcome of the startup scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// At least one module was found
    Populated,

    /// The root was scanned but held no manageable module
    Empty,

    /// The root could not be scanned
    Failed,
}

impl ScanState {
    /// Message shown instead of the module list, if any.
    pub fn empty_message(&self) -> Option<&'static str> {
        match self {
            Self::Populated => None,
            Self::Empty => Some("No sysmodules found!"),
            Self::Failed => Some("Scan failed!"),
        }
    }

    /// Short name used in machine-readable output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Populated => "ok",
            Self::Empty => "empty",
            Self::Failed => "failed",
        }
    }
}

/// One CLI session: a scanned registry and the engine over it.
pub struct Session {
    /// The toggle engine
    pub engine: Engine,

    /// How discovery went
    pub scan: ScanState,
}

impl Session {
    /// Scan the configured contents root and build the engine.
    ///
    /// A failed scan is not an error; the session simply has no modules.
    pub fn open(config: &SysmodConfig) -> Self {
        let layout = config.layout();

        let (registry, scan) =
            match ModuleRegistry::discover(&layout, config.reserved_program_id) {
                Ok(registry) if registry.is_empty() => (registry, ScanState::Empty),
                Ok(registry) => (registry, ScanState::Populated),
                Err(e) => {
                    warn!("{}", e);
                    (ModuleRegistry::default(), ScanState::Failed)
                }
            };

        let engine = ToggleEngine::new(
            registry,
            CommandProcessController::new(&config.process),
            FsFlagStore::new(layout),
        );

        Self { engine, scan }
    }
}
