//! Error types for the regression harness
//!
//! Messages are written for the operator running the regression: they name
//! the flag or environment variable that resolves the problem.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the regression harness
#[derive(Error, Debug)]
pub enum Error {
    // === Setup/Configuration Errors ===
    #[error("Please either pass --cfg or set the SETUP_DIR environment variable, not both")]
    AmbiguousSetupDir,

    #[error("No setup directory. Pass --cfg or set SETUP_DIR to a folder containing config.yaml")]
    SetupDirMissing,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file '{path}': {error}")]
    ConfigParse { path: String, error: String },

    // === Path Errors ===
    #[error("Could not determine the tgen folder under test, try setting the TGEN_UNDER_TEST environment variable")]
    ProductTreeNotFound,

    // === Remote Errors ===
    #[error("Could not resolve server address '{0}'")]
    HostResolve(String),

    #[error("Required tool '{0}' not found on PATH")]
    ToolNotFound(String),

    #[error("Remote command failed with status {status}: {command}")]
    RemoteCommandFailed { command: String, status: i32 },

    #[error("tgen is already running on the server. Re-run with --kill-running to take over")]
    CoreAlreadyRunning,

    #[error("Failed copying the product tree to the server: {0}")]
    SyncFailed(String),

    // === Engine Errors ===
    #[error("Test engine '{name}' not found. Searched: {searched}")]
    EngineNotFound { name: String, searched: String },

    #[error("Test engine failed to start: {0}")]
    EngineStartFailed(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an engine not found error with search locations
    pub fn engine_not_found<S: AsRef<str>>(name: &str, searched: &[S]) -> Self {
        Self::EngineNotFound {
            name: name.to_string(),
            searched: searched
                .iter()
                .map(|s| s.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Create a config parse error for a file
    pub fn config_parse(path: &std::path::Path, error: impl std::fmt::Display) -> Self {
        Self::ConfigParse {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Create a file read error
    pub fn file_read(path: &std::path::Path, error: impl std::fmt::Display) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }
}
