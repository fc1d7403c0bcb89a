//! Log output for the CLI.
//!
//! The subscriber is installed before the configuration is read, so that
//! configuration warnings are visible, and its level is adjusted once the
//! configured level is known.

use std::io::IsTerminal;

use sysmod_core::LogLevel;
use tracing::warn;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, Registry};

/// Handle for changing the level of the installed subscriber.
pub struct LogHandle(reload::Handle<LevelFilter, Registry>);

impl LogHandle {
    /// Switch to `level`.
    pub fn set_level(&self, level: LogLevel) {
        if let Err(e) = self.0.modify(|filter| *filter = filter_for(level)) {
            warn!("Failed to change log level: {}", e);
        }
    }
}

fn filter_for(level: LogLevel) -> LevelFilter {
    LevelFilter::from_level(level.to_tracing())
}

/// Install a stderr subscriber at `level`, leaving stdout to command output.
pub fn init(level: LogLevel) -> LogHandle {
    let (filter, handle) = reload::Layer::new(filter_for(level));

    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
            .with_target(false),
    );
    let _ = tracing::subscriber::set_global_default(subscriber);

    LogHandle(handle)
}
