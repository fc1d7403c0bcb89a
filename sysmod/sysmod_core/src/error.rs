//! Error types for sysmod.
//!
//! Errors are organized by subsystem. The root error type, `Error`, wraps
//! each subsystem error so callers can use a single `Result` alias.
//!
//! Only a few of these ever reach an operator. Discovery skips bad
//! descriptors locally and status queries collapse failures to `false`;
//! what remains are configuration problems, unknown ids, and failed
//! process or flag mutations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::id::ProgramId;

/// Root error type for sysmod.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid program identifiers
    #[error("Id error: {0}")]
    Id(#[from] IdError),

    /// Module discovery errors
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Auto-start flag errors
    #[error("Flag error: {0}")]
    Flag(#[from] FlagError),

    /// Process service errors
    #[error("Process error: {0}")]
    Process(#[from] ProcessError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Toggle engine errors
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Errors related to program identifiers.
#[derive(Debug, Error)]
pub enum IdError {
    /// The string is not a 1-16 digit hexadecimal number
    #[error("Invalid hexadecimal program id: {0:?}")]
    InvalidHex(String),
}

/// Errors that abort a whole discovery scan.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The contents root could not be enumerated
    #[error("Failed to scan {path}: {source}")]
    ScanFailed {
        /// Root that was scanned
        path: PathBuf,

        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Reasons a single descriptor is skipped during discovery.
///
/// These never leave the registry; they are logged and the scan moves on.
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// The descriptor file could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Descriptor path
        path: PathBuf,

        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The descriptor is not valid JSON or does not match the schema
    #[error("Failed to parse {path}: {source}")]
    Parse {
        /// Descriptor path
        path: PathBuf,

        /// Underlying parse error
        #[source]
        source: serde_json::Error,
    },

    /// The `tid` field is not a valid hexadecimal id
    #[error("Invalid program id in {path}: {source}")]
    InvalidId {
        /// Descriptor path
        path: PathBuf,

        /// Underlying id error
        #[source]
        source: IdError,
    },

    /// The descriptor names the reserved program id
    #[error("Program {0} is reserved")]
    Reserved(ProgramId),

    /// Another descriptor already registered this program id
    #[error("Program {0} is already registered")]
    Duplicate(ProgramId),
}

/// Errors related to auto-start flag mutation.
#[derive(Debug, Error)]
pub enum FlagError {
    /// The flag directory could not be created
    #[error("Failed to create flag directory {path}: {source}")]
    CreateDir {
        /// Directory path
        path: PathBuf,

        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The marker file could not be created
    #[error("Failed to create flag {path}: {source}")]
    Create {
        /// Marker path
        path: PathBuf,

        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The marker file could not be removed
    #[error("Failed to remove flag {path}: {source}")]
    Remove {
        /// Marker path
        path: PathBuf,

        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Errors related to process start and stop requests.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// No command is configured for the requested operation
    #[error("No {0} command configured")]
    NotConfigured(&'static str),

    /// The service command could not be spawned
    #[error("Failed to spawn {operation} command for {program_id}: {source}")]
    Spawn {
        /// Operation name
        operation: &'static str,

        /// Target program
        program_id: ProgramId,

        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The service command ran but reported failure
    #[error("{operation} command for {program_id} failed: {status}")]
    CommandFailed {
        /// Operation name
        operation: &'static str,

        /// Target program
        program_id: ProgramId,

        /// Exit status description
        status: String,
    },
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read configuration {path}: {source}")]
    Read {
        /// Configuration path
        path: PathBuf,

        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid TOML for the schema
    #[error("Failed to parse configuration {path}: {source}")]
    Parse {
        /// Configuration path
        path: PathBuf,

        /// Underlying TOML error
        #[source]
        source: toml::de::Error,
    },

    /// A value failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised by the toggle engine itself.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The program id is not in the registry
    #[error("Unknown module: {0}")]
    UnknownModule(ProgramId),
}

/// Result type used throughout sysmod.
pub type Result<T> = std::result::Result<T, Error>;
