//! Response message types

use serde::{Deserialize, Serialize};

use crate::core::types::{Capabilities, ErrorCode, ProvisioningState, StatusSnapshot};

/// Response messages from server to client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Response {
    /// Status response
    Status(StatusResponse),

    /// Acknowledgement without data
    Ack(AckResponse),
}

/// Response for get_status request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusResponse {
    pub state: ProvisioningState,
    pub error: ErrorCode,
    pub capabilities: Capabilities,
}

/// Response for requests that only report acceptance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AckResponse {
    pub status: String,
}

impl From<&StatusSnapshot> for StatusResponse {
    fn from(snapshot: &StatusSnapshot) -> Self {
        Self {
            state: snapshot.state,
            error: snapshot.error,
            capabilities: snapshot.capabilities,
        }
    }
}

impl AckResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }

    /// The request was queued; its outcome arrives as notifications
    pub fn accepted() -> Self {
        Self {
            status: "accepted".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_response() {
        let snapshot = StatusSnapshot {
            state: ProvisioningState::Provisioning,
            error: ErrorCode::None,
            capabilities: Capabilities::IDENTIFY,
            last_result: vec![0x01],
        };

        let response = Response::Status(StatusResponse::from(&snapshot));
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(
            json,
            r#"{"state":"provisioning","error":"none","capabilities":1}"#
        );

        let deserialized: Response = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, response);
    }

    #[test]
    fn test_ack_responses() {
        let json = serde_json::to_string(&AckResponse::ok()).unwrap();
        assert_eq!(json, r#"{"status":"ok"}"#);

        let json = serde_json::to_string(&AckResponse::accepted()).unwrap();
        assert_eq!(json, r#"{"status":"accepted"}"#);

        let deserialized: Response = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, Response::Ack(AckResponse::accepted()));
    }
}
