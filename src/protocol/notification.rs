//! Notification message types (server-to-client events)

use serde::{Deserialize, Serialize};

use crate::{
    core::types::{ErrorCode, ProvisioningState},
    transport::TransportEvent,
};

/// Server-to-client notifications
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "method", content = "params")]
#[serde(rename_all = "snake_case")]
pub enum Notification {
    StateChanged(StateChangedParams),

    ErrorChanged(ErrorChangedParams),

    /// Encoded RPC result frame
    RpcResult(RpcResultParams),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateChangedParams {
    pub state: ProvisioningState,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorChangedParams {
    pub error: ErrorCode,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RpcResultParams {
    /// Hex-encoded result frame
    pub frame: String,
}

impl Notification {
    /// Map a hub event to a client notification
    ///
    /// Broadcast updates only concern BLE advertising and yield `None`.
    pub fn from_event(event: &TransportEvent) -> Option<Self> {
        match event {
            TransportEvent::State(state) => {
                Some(Self::StateChanged(StateChangedParams { state: *state }))
            }
            TransportEvent::Error(error) => {
                Some(Self::ErrorChanged(ErrorChangedParams { error: *error }))
            }
            TransportEvent::RpcResult(frame) => Some(Self::RpcResult(RpcResultParams {
                frame: hex::encode(frame),
            })),
            TransportEvent::Broadcast(_) => None,
        }
    }
}
