//! Toggle Engine
//!
//! Reconciles operator actions against the live `(running, auto_start)`
//! state of a module. State is never cached: every decision starts from a
//! fresh query of the process service and the flag store, so a mutation that
//! silently failed shows up unchanged on the next refresh.

use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{EngineError, Result};
use crate::id::ProgramId;
use crate::process::ProcessController;
use crate::registry::{ModuleRegistry, SystemModule};
use crate::store::FlagStore;

/// Operator actions, scoped to one module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    /// Start or stop the module, reconciling its auto-start flag
    Primary,

    /// Flip the auto-start flag only
    AutoStart,
}

/// Live state of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModuleStatus {
    /// Whether the process service reports a live process
    pub running: bool,

    /// Whether the auto-start flag is set
    pub auto_start: bool,
}

impl ModuleStatus {
    /// Display label for this state.
    pub fn label(&self) -> StatusLabel {
        match (self.running, self.auto_start) {
            (false, false) => StatusLabel::Off,
            (false, true) => StatusLabel::OffAutoStart,
            (true, false) => StatusLabel::On,
            (true, true) => StatusLabel::OnAutoStart,
        }
    }
}

/// The four fixed status labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusLabel {
    /// Stopped, no flag
    Off,
    /// Stopped, starts on next boot
    OffAutoStart,
    /// Running, no flag
    On,
    /// Running, starts on next boot
    OnAutoStart,
}

impl StatusLabel {
    /// Text shown next to the module name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "Off | -",
            Self::OffAutoStart => "Off | boot",
            Self::On => "On | -",
            Self::OnAutoStart => "On | boot",
        }
    }
}

impl fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a dispatched action did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Primary toggle on a reboot-required module; nothing was touched
    Ignored,

    /// The process was asked to stop
    Stopped {
        /// Whether a set flag was cleared afterwards
        flag_cleared: bool,
    },

    /// The process was asked to start
    Started {
        /// Whether the flag was set afterwards
        flag_set: bool,
    },

    /// The auto-start flag was set
    AutoStartEnabled,

    /// The auto-start flag was cleared
    AutoStartDisabled,
}

/// Single entry point for module status and operator actions.
pub struct ToggleEngine<P, F> {
    registry: ModuleRegistry,
    processes: P,
    flags: F,
}

impl<P: ProcessController, F: FlagStore> ToggleEngine<P, F> {
    /// Create an engine over a discovered registry.
    pub fn new(registry: ModuleRegistry, processes: P, flags: F) -> Self {
        Self {
            registry,
            processes,
            flags,
        }
    }

    /// The registry this engine manages.
    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// The process controller.
    pub fn processes(&self) -> &P {
        &self.processes
    }

    /// The flag store.
    pub fn flags(&self) -> &F {
        &self.flags
    }

    /// Fresh status of one module.
    pub fn status(&self, id: ProgramId) -> Result<ModuleStatus> {
        let module = self.module(id)?;
        Ok(self.query(module))
    }

    /// Fresh status of every module, in registry order.
    pub fn refresh(&self) -> Vec<(&SystemModule, ModuleStatus)> {
        self.registry
            .modules()
            .iter()
            .map(|module| (module, self.query(module)))
            .collect()
    }

    /// Apply an operator action to a module.
    ///
    /// The process is always mutated before the flag. A failed process
    /// request stops the action there and leaves the flag alone.
    pub fn dispatch(&self, id: ProgramId, action: ToggleAction) -> Result<ToggleOutcome> {
        let module = self.module(id)?;

        match action {
            ToggleAction::Primary => self.primary_toggle(module),
            ToggleAction::AutoStart => self.auto_start_toggle(module),
        }
    }

    fn module(&self, id: ProgramId) -> Result<&SystemModule> {
        self.registry
            .get(id)
            .ok_or_else(|| EngineError::UnknownModule(id).into())
    }

    fn query(&self, module: &SystemModule) -> ModuleStatus {
        ModuleStatus {
            running: self.processes.is_running(module.program_id),
            auto_start: self.flags.has_auto_start(module.program_id),
        }
    }

    fn primary_toggle(&self, module: &SystemModule) -> Result<ToggleOutcome> {
        let id = module.program_id;

        if module.requires_reboot {
            info!("{} requires a reboot; ignoring toggle", module.name);
            return Ok(ToggleOutcome::Ignored);
        }

        if self.processes.is_running(id) {
            self.processes.stop(id).inspect_err(|e| {
                warn!("Failed to stop {}: {}", module.name, e);
            })?;
            info!("Stopped {}", module.name);

            let flag_cleared = self.flags.has_auto_start(id);
            if flag_cleared {
                self.set_flag(module, false)?;
            }

            Ok(ToggleOutcome::Stopped { flag_cleared })
        } else {
            self.processes.start(id).inspect_err(|e| {
                warn!("Failed to start {}: {}", module.name, e);
            })?;
            info!("Started {}", module.name);

            let flag_set = !self.flags.has_auto_start(id);
            if flag_set {
                self.set_flag(module, true)?;
            }

            Ok(ToggleOutcome::Started { flag_set })
        }
    }

    fn auto_start_toggle(&self, module: &SystemModule) -> Result<ToggleOutcome> {
        if self.flags.has_auto_start(module.program_id) {
            self.set_flag(module, false)?;
            Ok(ToggleOutcome::AutoStartDisabled)
        } else {
            self.set_flag(module, true)?;
            Ok(ToggleOutcome::AutoStartEnabled)
        }
    }

    fn set_flag(&self, module: &SystemModule, enabled: bool) -> Result<()> {
        self.flags
            .set_auto_start(module.program_id, enabled)
            .inspect_err(|e| warn!("Failed to update auto-start of {}: {}", module.name, e))?;

        info!(
            "{} auto-start for {}",
            if enabled { "Enabled" } else { "Disabled" },
            module.name
        );
        Ok(())
    }
}

/// Decides which ticks trigger a status refresh.
///
/// The first tick always fires, then every `every`th tick after it.
#[derive(Debug, Clone)]
pub struct RefreshTicker {
    every: u32,
    counter: u32,
}

impl RefreshTicker {
    /// Create a ticker firing once per `every` ticks. Zero is treated as one.
    pub fn new(every: u32) -> Self {
        Self {
            every: every.max(1),
            counter: 0,
        }
    }

    /// Advance by one tick; returns whether a refresh is due.
    pub fn tick(&mut self) -> bool {
        let due = self.counter % self.every == 0;
        self.counter = (self.counter + 1) % self.every;
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, FlagError, ProcessError};
    use crate::id::RESERVED_PROGRAM_ID;
    use std::cell::{Cell, RefCell};
    use std::collections::HashSet;
    use std::path::PathBuf;

    const FOO: ProgramId = ProgramId::new(0x0100_0000_0000_0001);
    const BAR: ProgramId = ProgramId::new(0x0100_0000_0000_0002);

    #[derive(Default)]
    struct MockProcesses {
        running: RefCell<HashSet<ProgramId>>,
        fail_requests: Cell<bool>,
        requests: Cell<usize>,
    }

    impl ProcessController for MockProcesses {
        fn is_running(&self, id: ProgramId) -> bool {
            self.running.borrow().contains(&id)
        }

        fn start(&self, id: ProgramId) -> std::result::Result<(), ProcessError> {
            self.requests.set(self.requests.get() + 1);
            if self.fail_requests.get() {
                return Err(ProcessError::NotConfigured("launch"));
            }
            self.running.borrow_mut().insert(id);
            Ok(())
        }

        fn stop(&self, id: ProgramId) -> std::result::Result<(), ProcessError> {
            self.requests.set(self.requests.get() + 1);
            if self.fail_requests.get() {
                return Err(ProcessError::NotConfigured("terminate"));
            }
            self.running.borrow_mut().remove(&id);
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockFlags {
        set: RefCell<HashSet<ProgramId>>,
        fail_writes: Cell<bool>,
    }

    impl FlagStore for MockFlags {
        fn has_auto_start(&self, id: ProgramId) -> bool {
            self.set.borrow().contains(&id)
        }

        fn set_auto_start(
            &self,
            id: ProgramId,
            enabled: bool,
        ) -> std::result::Result<(), FlagError> {
            if self.fail_writes.get() {
                return Err(FlagError::Create {
                    path: PathBuf::from("/read-only"),
                    source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
                });
            }
            if enabled {
                self.set.borrow_mut().insert(id);
            } else {
                self.set.borrow_mut().remove(&id);
            }
            Ok(())
        }
    }

    fn engine() -> ToggleEngine<MockProcesses, MockFlags> {
        let registry = ModuleRegistry::from_modules(
            vec![
                SystemModule {
                    program_id: FOO,
                    name: "Foo".to_string(),
                    requires_reboot: false,
                },
                SystemModule {
                    program_id: BAR,
                    name: "Bar".to_string(),
                    requires_reboot: true,
                },
            ],
            RESERVED_PROGRAM_ID,
        );
        ToggleEngine::new(registry, MockProcesses::default(), MockFlags::default())
    }

    fn status(running: bool, auto_start: bool) -> ModuleStatus {
        ModuleStatus {
            running,
            auto_start,
        }
    }

    #[test]
    fn test_primary_from_off_starts_and_flags() {
        let engine = engine();

        let outcome = engine.dispatch(FOO, ToggleAction::Primary).unwrap();

        assert_eq!(outcome, ToggleOutcome::Started { flag_set: true });
        assert_eq!(engine.status(FOO).unwrap(), status(true, true));
    }

    #[test]
    fn test_primary_from_on_with_flag_stops_and_clears() {
        let engine = engine();
        engine.processes.running.borrow_mut().insert(FOO);
        engine.flags.set.borrow_mut().insert(FOO);

        let outcome = engine.dispatch(FOO, ToggleAction::Primary).unwrap();

        assert_eq!(outcome, ToggleOutcome::Stopped { flag_cleared: true });
        assert_eq!(engine.status(FOO).unwrap(), status(false, false));
    }

    #[test]
    fn test_primary_from_on_without_flag_leaves_flag_alone() {
        let engine = engine();
        engine.processes.running.borrow_mut().insert(FOO);

        let outcome = engine.dispatch(FOO, ToggleAction::Primary).unwrap();

        assert_eq!(outcome, ToggleOutcome::Stopped { flag_cleared: false });
        assert_eq!(engine.status(FOO).unwrap(), status(false, false));
    }

    #[test]
    fn test_primary_from_off_with_flag_keeps_flag() {
        let engine = engine();
        engine.flags.set.borrow_mut().insert(FOO);

        let outcome = engine.dispatch(FOO, ToggleAction::Primary).unwrap();

        assert_eq!(outcome, ToggleOutcome::Started { flag_set: false });
        assert_eq!(engine.status(FOO).unwrap(), status(true, true));
    }

    #[test]
    fn test_auto_start_never_touches_process() {
        let engine = engine();

        for running in [false, true] {
            if running {
                engine.processes.running.borrow_mut().insert(FOO);
            }

            assert_eq!(
                engine.dispatch(FOO, ToggleAction::AutoStart).unwrap(),
                ToggleOutcome::AutoStartEnabled
            );
            assert_eq!(engine.status(FOO).unwrap(), status(running, true));

            assert_eq!(
                engine.dispatch(FOO, ToggleAction::AutoStart).unwrap(),
                ToggleOutcome::AutoStartDisabled
            );
            assert_eq!(engine.status(FOO).unwrap(), status(running, false));
        }

        assert_eq!(engine.processes.requests.get(), 0);
    }

    #[test]
    fn test_reboot_required_ignores_primary() {
        let engine = engine();

        assert_eq!(
            engine.dispatch(BAR, ToggleAction::Primary).unwrap(),
            ToggleOutcome::Ignored
        );
        assert_eq!(engine.status(BAR).unwrap(), status(false, false));
        assert_eq!(engine.processes.requests.get(), 0);

        assert_eq!(
            engine.dispatch(BAR, ToggleAction::AutoStart).unwrap(),
            ToggleOutcome::AutoStartEnabled
        );
        assert_eq!(engine.status(BAR).unwrap(), status(false, true));
    }

    #[test]
    fn test_failed_start_leaves_flag_untouched() {
        let engine = engine();
        engine.processes.fail_requests.set(true);

        let err = engine.dispatch(FOO, ToggleAction::Primary).unwrap_err();

        assert!(matches!(err, Error::Process(_)));
        assert_eq!(engine.status(FOO).unwrap(), status(false, false));
    }

    #[test]
    fn test_failed_stop_leaves_module_running_and_flagged() {
        let engine = engine();
        engine.processes.running.borrow_mut().insert(FOO);
        engine.flags.set.borrow_mut().insert(FOO);
        engine.processes.fail_requests.set(true);

        assert!(engine.dispatch(FOO, ToggleAction::Primary).is_err());
        assert_eq!(engine.status(FOO).unwrap(), status(true, true));

        engine.processes.fail_requests.set(false);
        engine.dispatch(FOO, ToggleAction::Primary).unwrap();
        assert_eq!(engine.status(FOO).unwrap(), status(false, false));
    }

    #[test]
    fn test_failed_flag_write_after_start_reports_true_state() {
        let engine = engine();
        engine.flags.fail_writes.set(true);

        let err = engine.dispatch(FOO, ToggleAction::Primary).unwrap_err();

        assert!(matches!(err, Error::Flag(_)));
        assert_eq!(engine.status(FOO).unwrap(), status(true, false));
    }

    #[test]
    fn test_unknown_module_is_rejected() {
        let engine = engine();

        for id in [ProgramId::new(0xdead), RESERVED_PROGRAM_ID] {
            assert!(matches!(
                engine.dispatch(id, ToggleAction::Primary),
                Err(Error::Engine(EngineError::UnknownModule(_)))
            ));
            assert!(engine.status(id).is_err());
        }
    }

    #[test]
    fn test_refresh_is_ordered_and_pure() {
        let engine = engine();
        engine.processes.running.borrow_mut().insert(FOO);

        let first: Vec<_> = engine
            .refresh()
            .into_iter()
            .map(|(m, s)| (m.program_id, s))
            .collect();
        let second: Vec<_> = engine
            .refresh()
            .into_iter()
            .map(|(m, s)| (m.program_id, s))
            .collect();

        assert_eq!(first, vec![(FOO, status(true, false)), (BAR, status(false, false))]);
        assert_eq!(first, second);
        assert_eq!(engine.processes.requests.get(), 0);
    }

    #[test]
    fn test_labels() {
        assert_eq!(status(false, false).label().as_str(), "Off | -");
        assert_eq!(status(false, true).label().as_str(), "Off | boot");
        assert_eq!(status(true, false).label().as_str(), "On | -");
        assert_eq!(status(true, true).label().to_string(), "On | boot");
    }

    #[test]
    fn test_ticker_fires_on_first_and_every_nth_tick() {
        let mut ticker = RefreshTicker::new(3);
        let fired: Vec<bool> = (0..7).map(|_| ticker.tick()).collect();
        assert_eq!(fired, vec![true, false, false, true, false, false, true]);

        let mut every_tick = RefreshTicker::new(0);
        assert!(every_tick.tick());
        assert!(every_tick.tick());
    }
}
