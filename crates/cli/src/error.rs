//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Logger could not be started
    #[error("Failed to initialize logger: {0}")]
    Logger(#[from] logger::LoggerError),

    /// Emission loop failed
    #[error("Emitter failed: {message}")]
    Emitter { message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn emitter(message: impl Into<String>) -> Self {
        Self::Emitter {
            message: message.into(),
        }
    }
}
