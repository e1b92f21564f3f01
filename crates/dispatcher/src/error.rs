//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Pool settings rejected at startup
    #[error("invalid settings for pool '{pool}': {message}")]
    InvalidSettings { pool: String, message: String },

    /// Pool started outside of a Tokio runtime
    #[error("pool '{pool}' must be started inside a tokio runtime")]
    NoRuntime { pool: String },

    /// Queue full - returned by `try_submit` only
    #[error("dispatch queue full for pool '{pool}'")]
    Full { pool: String },

    /// Pool already shut down
    #[error("pool '{pool}' is shut down")]
    Closed { pool: String },
}

impl DispatcherError {
    /// Create an invalid settings error
    pub fn invalid_settings(pool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSettings {
            pool: pool.into(),
            message: message.into(),
        }
    }
}
