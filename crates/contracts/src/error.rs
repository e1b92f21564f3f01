//! Layered error definitions
//!
//! Categorized by source: config / broker / io

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Broker Errors =====
    /// Broker connection error
    #[error("broker connection error ({hosts}): {message}")]
    BrokerConnection { hosts: String, message: String },

    /// Broker delivery error for a single record
    #[error("delivery to topic '{topic}' failed: {message}")]
    BrokerDelivery { topic: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create broker connection error
    pub fn broker_connection(hosts: &[String], message: impl Into<String>) -> Self {
        Self::BrokerConnection {
            hosts: hosts.join(","),
            message: message.into(),
        }
    }

    /// Create broker delivery error
    pub fn broker_delivery(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BrokerDelivery {
            topic: topic.into(),
            message: message.into(),
        }
    }
}
