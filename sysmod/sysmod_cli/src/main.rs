use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sysmod_core::{ConfigOverrides, LogLevel, SysmodConfig, ToggleAction};

mod commands;
mod integration;
mod logging;
mod render;

use commands::modules::{ListArgs, StatusArgs};
use commands::toggle::ToggleArgs;
use commands::watch::WatchArgs;
use integration::Session;

/// sysmod - toggle background modules and their auto-start flags
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Path to a TOML configuration file
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding one subdirectory per module
    #[clap(long, global = true)]
    contents_root: Option<PathBuf>,

    /// Log at debug level
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List discovered modules with their current status
    List(ListArgs),

    /// Show the status of one module
    Status(StatusArgs),

    /// Start or stop a module, reconciling its auto-start flag
    Toggle(ToggleArgs),

    /// Flip the auto-start flag of a module
    #[clap(name = "auto-start")]
    AutoStart(ToggleArgs),

    /// Refresh module status periodically
    Watch(WatchArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let initial_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    let log = logging::init(initial_level);

    let config = SysmodConfig::load_with_overrides(
        cli.config.as_deref(),
        ConfigOverrides {
            contents_root: cli.contents_root,
            log_level: cli.verbose.then_some(LogLevel::Debug),
        },
    )
    .context("Failed to load configuration")?;

    log.set_level(config.log_level);

    let session = Session::open(&config);

    match cli.command {
        Commands::List(args) => commands::modules::execute_list(&session, &args),
        Commands::Status(args) => commands::modules::execute_status(&session, &args),
        Commands::Toggle(args) => {
            commands::toggle::execute_toggle(&session, &args, ToggleAction::Primary)
        }
        Commands::AutoStart(args) => {
            commands::toggle::execute_toggle(&session, &args, ToggleAction::AutoStart)
        }
        Commands::Watch(args) => commands::watch::execute_watch(&session, &config, &args),
    }
}
