//! Logger error types

use broker::BrokerError;
use contracts::ContractError;
use thiserror::Error;

/// Errors returned while setting up the logger
#[derive(Debug, Error)]
pub enum LoggerError {
    /// Configuration rejected
    #[error(transparent)]
    Config(#[from] ContractError),

    /// Log directory or file could not be opened
    #[error("log file error: {0}")]
    Io(#[from] std::io::Error),

    /// Producer could not be started
    #[error(transparent)]
    Broker(#[from] BrokerError),
}
