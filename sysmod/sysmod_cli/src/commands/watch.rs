//! Watch command
//!
//! Drives a frame loop on the current thread and prints the status batch
//! whenever the refresh ticker fires.

use std::thread;
use std::time::Duration;

use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use clap::Args;
use sysmod_core::{RefreshTicker, SysmodConfig};
use tracing::debug;

use crate::integration::Session;
use crate::render;

/// Arguments for the watch command
#[derive(Args)]
pub struct WatchArgs {
    /// Stop after this many frames; runs until interrupted when omitted
    #[clap(long)]
    pub ticks: Option<u64>,

    /// Frame duration in milliseconds
    #[clap(long, default_value_t = 50)]
    pub frame_ms: u64,

    /// Refresh every N frames, overriding the configured period
    #[clap(long)]
    pub refresh_every: Option<u32>,
}

/// Implementation of the watch command
pub fn execute_watch(session: &Session, config: &SysmodConfig, args: &WatchArgs) -> Result<()> {
    let every = args.refresh_every.unwrap_or(config.refresh_every_ticks);
    let mut ticker = RefreshTicker::new(every);
    let frame = Duration::from_millis(args.frame_ms);

    debug!("Watching with a refresh every {} frames", every);

    let mut tick = 0u64;
    while args.ticks.map_or(true, |limit| tick < limit) {
        if ticker.tick() {
            println!(
                "[{}]",
                Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
            );
            print!("{}", render::module_list(session));
        }

        tick += 1;
        if !frame.is_zero() {
            thread::sleep(frame);
        }
    }

    Ok(())
}
