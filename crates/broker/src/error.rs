//! Broker error types

use contracts::ContractError;
use dispatcher::DispatcherError;
use thiserror::Error;

/// Errors surfaced by the producer adapter
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Zero-length payloads are never enqueued
    #[error("empty payload")]
    EmptyPayload,

    /// Adapter never started or already shut down
    #[error("producer adapter is not initialized")]
    NotInitialized,

    /// Broker unreachable at startup
    #[error("failed to connect producer: {0}")]
    Connection(#[source] ContractError),

    /// Worker pool rejected the task
    #[error(transparent)]
    Pool(#[from] DispatcherError),

    /// Config error from the contract layer
    #[error(transparent)]
    Contract(#[from] ContractError),
}
