//! Transports carrying the Improv protocol to peers

use trait_variant::make;

use crate::core::{
    error::TransportResult,
    types::{Capabilities, ErrorCode, ProvisioningState},
};

pub mod ble;
pub mod hub;
pub mod unix_socket;

#[cfg(test)]
pub mod mock_transport;

pub use hub::{NotificationHub, TransportEvent};

/// Outbound side of a transport
///
/// Calls are made from the service loop in the order the engine produced them.
/// A failed call is logged by the caller and never retried.
#[make(Send)]
pub trait Transport: Sync + 'static {
    async fn notify_state(&self, state: ProvisioningState) -> TransportResult<()>;

    async fn notify_error(&self, error: ErrorCode) -> TransportResult<()>;

    async fn notify_result(&self, frame: &[u8]) -> TransportResult<()>;

    /// Refresh the advertised state and capabilities
    async fn update_broadcast(
        &self,
        state: ProvisioningState,
        capabilities: Capabilities,
    ) -> TransportResult<()>;
}
