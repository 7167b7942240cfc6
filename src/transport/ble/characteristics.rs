//! BLE characteristic handlers

use bluer::gatt::local::{CharacteristicNotifier, ReqError};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, warn};

use crate::{core::service::ServiceHandle, transport::hub::TransportEvent};

/// Serves reads and writes on the Improv characteristics
#[derive(Debug, Clone)]
pub struct CharacteristicHandler {
    service: ServiceHandle,
}

impl CharacteristicHandler {
    pub fn new(service: ServiceHandle) -> Self {
        Self { service }
    }

    /// Handle a write to the RPC command characteristic
    ///
    /// The frame is queued as-is; decode errors surface through the error
    /// state characteristic, not as a GATT error.
    pub async fn handle_rpc_write(&self, value: Vec<u8>) -> Result<(), ReqError> {
        debug!("RPC command write received ({} bytes)", value.len());

        self.service.submit_frame(value).await.map_err(|e| {
            error!("Cannot forward RPC command: {}", e);
            ReqError::Failed
        })
    }

    pub fn handle_state_read(&self) -> Result<Vec<u8>, ReqError> {
        Ok(vec![self.service.status().state.into()])
    }

    pub fn handle_error_read(&self) -> Result<Vec<u8>, ReqError> {
        Ok(vec![self.service.status().error.into()])
    }

    pub fn handle_capabilities_read(&self) -> Result<Vec<u8>, ReqError> {
        Ok(vec![self.service.status().capabilities.into()])
    }

    /// Last result frame, empty until provisioning produced one
    pub fn handle_result_read(&self) -> Result<Vec<u8>, ReqError> {
        Ok(self.service.status().last_result)
    }
}

/// Characteristics that push hub events to subscribed centrals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyCharacteristic {
    State,
    Error,
    RpcResult,
}

impl NotifyCharacteristic {
    /// Value to notify for `event`, if it concerns this characteristic
    pub fn value_for(self, event: &TransportEvent) -> Option<Vec<u8>> {
        match (self, event) {
            (Self::State, TransportEvent::State(state)) => Some(vec![(*state).into()]),
            (Self::Error, TransportEvent::Error(error)) => Some(vec![(*error).into()]),
            (Self::RpcResult, TransportEvent::RpcResult(frame)) => Some(frame.clone()),
            _ => None,
        }
    }
}

/// Push matching hub events to one subscribed central until it unsubscribes
pub async fn forward_notifications(
    kind: NotifyCharacteristic,
    mut notifier: CharacteristicNotifier,
    mut events: broadcast::Receiver<TransportEvent>,
) {
    debug!("Central subscribed to {:?}", kind);

    while !notifier.is_stopped() {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(n)) => {
                warn!("{:?} notifications lagged by {} events", kind, n);
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        let Some(value) = kind.value_for(&event) else {
            continue;
        };

        if let Err(e) = notifier.notify(value).await {
            debug!("{:?} notification failed: {}", kind, e);
            break;
        }
    }

    debug!("Central unsubscribed from {:?}", kind);
}
