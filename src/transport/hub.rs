//! Fan-out of engine notifications to every connected transport

use tokio::sync::broadcast;
use tracing::trace;

use crate::{
    codec::status::{STATUS_PAYLOAD_LEN, encode_status},
    core::{
        error::TransportResult,
        types::{Capabilities, ErrorCode, ProvisioningState},
    },
    transport::Transport,
};

/// Notification published to transport subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    State(ProvisioningState),
    Error(ErrorCode),
    RpcResult(Vec<u8>),
    Broadcast([u8; STATUS_PAYLOAD_LEN]),
}

/// Publishes transport events on a broadcast channel
///
/// BLE characteristics and socket clients each hold their own receiver. Having
/// no subscriber is not an error.
#[derive(Debug, Clone)]
pub struct NotificationHub {
    tx: broadcast::Sender<TransportEvent>,
}

impl NotificationHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.tx.subscribe()
    }

    fn publish(&self, event: TransportEvent) {
        if self.tx.send(event).is_err() {
            trace!("No transport subscribers");
        }
    }
}

impl Transport for NotificationHub {
    async fn notify_state(&self, state: ProvisioningState) -> TransportResult<()> {
        self.publish(TransportEvent::State(state));
        Ok(())
    }

    async fn notify_error(&self, error: ErrorCode) -> TransportResult<()> {
        self.publish(TransportEvent::Error(error));
        Ok(())
    }

    async fn notify_result(&self, frame: &[u8]) -> TransportResult<()> {
        self.publish(TransportEvent::RpcResult(frame.to_vec()));
        Ok(())
    }

    async fn update_broadcast(
        &self,
        state: ProvisioningState,
        capabilities: Capabilities,
    ) -> TransportResult<()> {
        self.publish(TransportEvent::Broadcast(encode_status(state, capabilities)));
        Ok(())
    }
}
