//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Data Model
//! - Encoded log records are opaque bytes; only the `msg` field is ever inspected
//! - Broker records carry no key and land on a random partition

mod config;
mod envelope;
mod error;
mod pool;
mod transport;

pub use config::*;
pub use envelope::LogEnvelope;
pub use error::*;
pub use pool::*;
pub use transport::{BrokerTransport, LocalBrokerTransport};
