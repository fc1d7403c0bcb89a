//! # sysmod core
//!
//! `sysmod_core` discovers installable background modules from their
//! descriptors and toggles two independent pieces of state per module:
//! whether its process is running, and whether it is flagged to start on
//! the next boot.
//!
//! ## Crate Structure
//!
//! - **id**: Program identifiers and the reserved host id
//! - **error**: Error types for every subsystem
//! - **config**: TOML configuration
//! - **layout**: On-disk paths for descriptors and flags
//! - **store**: Auto-start flag persistence
//! - **process**: Process service access
//! - **registry**: Module discovery
//! - **engine**: The toggle state machine and refresh ticker
//!
//! Everything runs on the caller's thread. Status is read fresh on every
//! refresh and every action; nothing is cached between calls.

pub mod config;
pub mod engine;
pub mod error;
pub mod id;
pub mod layout;
pub mod process;
pub mod registry;
pub mod store;

pub use config::{ConfigOverrides, LogLevel, ProcessConfig, SysmodConfig};
pub use engine::{
    ModuleStatus, RefreshTicker, StatusLabel, ToggleAction, ToggleEngine, ToggleOutcome,
};
pub use error::{Error, Result};
pub use id::{ProgramId, RESERVED_PROGRAM_ID};
pub use layout::ContentsLayout;
pub use process::{CommandProcessController, ProcessController};
pub use registry::{ModuleRegistry, SystemModule};
pub use store::{FlagStore, FsFlagStore};
