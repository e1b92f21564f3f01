//! BrokerTransport trait - producer output interface
//!
//! Defines the abstract interface the async producer delivers records through.

use bytes::Bytes;

use crate::ContractError;

/// Broker delivery trait
///
/// All transport implementations must implement this trait.
#[trait_variant::make(BrokerTransport: Send)]
pub trait LocalBrokerTransport {
    /// Transport name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver one record with no key to a partition chosen by the transport
    ///
    /// Resolves once the broker acknowledged the record.
    ///
    /// # Errors
    /// Returns delivery error (should include topic context)
    async fn deliver(&self, topic: &str, payload: &Bytes) -> Result<(), ContractError>;
}
