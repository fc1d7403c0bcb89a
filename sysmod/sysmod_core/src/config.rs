//! Configuration for sysmod
//!
//! Handles loading, validating and overriding the TOML configuration.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::id::{ProgramId, RESERVED_PROGRAM_ID};
use crate::layout::ContentsLayout;

/// Log level.
///
/// Ordered by increasing severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose debug information.
    Trace,

    /// Debug information.
    Debug,

    /// Informational messages.
    Info,

    /// Warning messages.
    #[serde(alias = "warn")]
    Warning,

    /// Error messages.
    #[serde(alias = "err")]
    Error,
}

impl LogLevel {
    /// Get the name of this log level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Convert to the matching `tracing` level.
    pub fn to_tracing(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warning => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "error" | "err" => Ok(Self::Error),
            _ => Err(ConfigError::Invalid(format!("Unknown log level: {}", s))),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commands used to reach the external process service.
///
/// Each template may contain `{program_id}`, replaced by the 16-digit
/// hexadecimal id before the command is handed to `shell -c`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessConfig {
    /// Shell used to run the templates
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Prints the live process id of a program, or 0 when it is not running
    #[serde(default)]
    pub query: Option<String>,

    /// Requests a program launch
    #[serde(default)]
    pub launch: Option<String>,

    /// Requests a program termination
    #[serde(default)]
    pub terminate: Option<String>,
}

fn default_shell() -> String {
    "sh".to_string()
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            query: None,
            launch: None,
            terminate: None,
        }
    }
}

/// sysmod configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SysmodConfig {
    /// Directory holding one subdirectory per module
    #[serde(default = "default_contents_root")]
    pub contents_root: PathBuf,

    /// Descriptor file name inside each module directory
    #[serde(default = "default_descriptor_file")]
    pub descriptor_file: String,

    /// Flag subdirectory name inside each module directory
    #[serde(default = "default_flag_dir")]
    pub flag_dir: String,

    /// Auto-start marker file name
    #[serde(default = "default_flag_file")]
    pub flag_file: String,

    /// Program id that is never manageable
    #[serde(default = "default_reserved_program_id")]
    pub reserved_program_id: ProgramId,

    /// Status refresh period, in ticks
    #[serde(default = "default_refresh_every_ticks")]
    pub refresh_every_ticks: u32,

    /// Maximum log level
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,

    /// Process service commands
    #[serde(default)]
    pub process: ProcessConfig,
}

fn default_contents_root() -> PathBuf {
    PathBuf::from("/atmosphere/contents")
}

fn default_descriptor_file() -> String {
    "toolbox.json".to_string()
}

fn default_flag_dir() -> String {
    "flags".to_string()
}

fn default_flag_file() -> String {
    "boot2.flag".to_string()
}

fn default_reserved_program_id() -> ProgramId {
    RESERVED_PROGRAM_ID
}

fn default_refresh_every_ticks() -> u32 {
    20
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

impl Default for SysmodConfig {
    fn default() -> Self {
        Self {
            contents_root: default_contents_root(),
            descriptor_file: default_descriptor_file(),
            flag_dir: default_flag_dir(),
            flag_file: default_flag_file(),
            reserved_program_id: default_reserved_program_id(),
            refresh_every_ticks: default_refresh_every_ticks(),
            log_level: default_log_level(),
            process: ProcessConfig::default(),
        }
    }
}

/// Values that take precedence over the configuration file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Replacement contents root
    pub contents_root: Option<PathBuf>,

    /// Replacement log level
    pub log_level: Option<LogLevel>,
}

impl SysmodConfig {
    /// Load configuration from a file
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_overrides(path, ConfigOverrides::default())
    }

    /// Load configuration from a file, apply overrides, then validate once
    pub fn load_with_overrides(
        path: Option<&Path>,
        overrides: ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let mut config = SysmodConfig::default();

        if let Some(path) = path {
            info!("Loading configuration from {}", path.display());

            if path.exists() {
                let content =
                    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                        path: path.to_path_buf(),
                        source,
                    })?;

                config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?;
            } else {
                warn!("Configuration file not found: {}", path.display());
            }
        }

        config.merge(overrides);
        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.contents_root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "Contents root cannot be empty".to_string(),
            ));
        }

        for (key, value) in [
            ("descriptor_file", &self.descriptor_file),
            ("flag_dir", &self.flag_dir),
            ("flag_file", &self.flag_file),
        ] {
            if value.is_empty() {
                return Err(ConfigError::Invalid(format!("{} cannot be empty", key)));
            }
            if value.contains('/') || value.contains('\\') {
                return Err(ConfigError::Invalid(format!(
                    "{} must be a single path component",
                    key
                )));
            }
        }

        if self.refresh_every_ticks == 0 {
            return Err(ConfigError::Invalid(
                "Refresh period cannot be zero".to_string(),
            ));
        }

        if self.process.shell.is_empty() {
            return Err(ConfigError::Invalid("Process shell cannot be empty".to_string()));
        }

        if self.process.query.is_none() {
            warn!("No process query command configured; every module will report as stopped");
        }

        Ok(())
    }

    /// Apply overrides on top of the loaded values
    pub fn merge(&mut self, overrides: ConfigOverrides) {
        if let Some(root) = overrides.contents_root {
            self.contents_root = root;
        }

        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
    }

    /// On-disk layout described by this configuration
    pub fn layout(&self) -> ContentsLayout {
        ContentsLayout::new(
            self.contents_root.clone(),
            self.descriptor_file.clone(),
            self.flag_dir.clone(),
            self.flag_file.clone(),
        )
    }
}
