//! CLI commands
//!
//! Each submodule holds the argument struct and implementation for one
//! group of commands.

pub mod modules;
pub mod toggle;
pub mod watch;
