//! Request message types

use serde::{Deserialize, Serialize};

use crate::core::types::ErrorCode;

/// Control requests from a local client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "method", content = "params")]
#[serde(rename_all = "snake_case")]
pub enum Request {
    /// Read the current state, error and capabilities
    GetStatus,

    /// Physical authorization was granted
    Authorize,

    /// Latch an error code reported by the host
    SetError(SetErrorParams),

    /// Feed a raw command frame, as a serial transport would
    SendFrame(SendFrameParams),
}

impl Request {
    /// Method names accepted on the control channel
    pub const METHODS: [&'static str; 4] = ["get_status", "authorize", "set_error", "send_frame"];

    pub fn is_known_method(method: &str) -> bool {
        Self::METHODS.contains(&method)
    }
}

/// Parameters for set_error request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SetErrorParams {
    /// Improv error code
    pub code: u8,
}

impl SetErrorParams {
    pub fn error_code(&self) -> Result<ErrorCode, String> {
        ErrorCode::try_from(self.code).map_err(|()| format!("Unknown error code {:#04x}", self.code))
    }
}

/// Parameters for send_frame request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendFrameParams {
    /// Hex-encoded command frame
    pub frame: String,
}

impl SendFrameParams {
    pub fn new(frame: &[u8]) -> Self {
        Self {
            frame: hex::encode(frame),
        }
    }

    /// Decode the hex frame into raw bytes
    pub fn decode_frame(&self) -> Result<Vec<u8>, String> {
        hex::decode(&self.frame).map_err(|e| format!("Invalid hex frame: {}", e))
    }
}
