//! JSON-RPC request handler for Unix socket transport

use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    core::service::ServiceHandle,
    protocol::{
        AckResponse, JsonRpcError, JsonRpcRequest, JsonRpcResponse, Request, RequestId, Response,
        SendFrameParams, SetErrorParams, StatusResponse,
    },
};

/// Parse one request line, or produce the error response to send back
pub fn parse_request(line: &str) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let value: Value = serde_json::from_str(line)
        .map_err(|_| JsonRpcResponse::error(JsonRpcError::parse_error(), RequestId::Null))?;

    let id = value
        .get("id")
        .and_then(|id| serde_json::from_value(id.clone()).ok())
        .unwrap_or(RequestId::Null);

    if value.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
        return Err(JsonRpcResponse::error(
            JsonRpcError::invalid_request("Expected jsonrpc 2.0"),
            id,
        ));
    }

    match value.get("method").and_then(Value::as_str) {
        None => {
            return Err(JsonRpcResponse::error(
                JsonRpcError::invalid_request("Missing method"),
                id,
            ));
        }
        Some(method) if !Request::is_known_method(method) => {
            return Err(JsonRpcResponse::error(JsonRpcError::method_not_found(), id));
        }
        Some(_) => {}
    }

    serde_json::from_value(value)
        .map_err(|e| JsonRpcResponse::error(JsonRpcError::invalid_params(e.to_string()), id))
}

/// JSON-RPC request handler
#[derive(Debug, Clone)]
pub struct RequestHandler {
    service: ServiceHandle,
}

impl RequestHandler {
    pub fn new(service: ServiceHandle) -> Self {
        Self { service }
    }

    /// Handle one raw request line
    pub async fn handle_line(&self, line: &str) -> JsonRpcResponse {
        match parse_request(line) {
            Ok(request) => self.handle_request(request).await,
            Err(response) => {
                warn!("Invalid JSON-RPC request: {:?}", response.error);
                response
            }
        }
    }

    /// Handle a JSON-RPC request
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        match request.request {
            Request::GetStatus => self.handle_get_status(request.id),
            Request::Authorize => self.handle_authorize(request.id).await,
            Request::SetError(params) => self.handle_set_error(params, request.id).await,
            Request::SendFrame(params) => self.handle_send_frame(params, request.id).await,
        }
    }

    fn handle_get_status(&self, id: RequestId) -> JsonRpcResponse {
        let status = StatusResponse::from(&self.service.status());
        JsonRpcResponse::success(Response::Status(status), id)
    }

    async fn handle_authorize(&self, id: RequestId) -> JsonRpcResponse {
        match self.service.authorize().await {
            Ok(()) => JsonRpcResponse::success(Response::Ack(AckResponse::ok()), id),
            Err(_) => JsonRpcResponse::error(JsonRpcError::service_unavailable(), id),
        }
    }

    async fn handle_set_error(&self, params: SetErrorParams, id: RequestId) -> JsonRpcResponse {
        let code = match params.error_code() {
            Ok(code) => code,
            Err(e) => return JsonRpcResponse::error(JsonRpcError::invalid_params(e), id),
        };

        match self.service.set_error(code).await {
            Ok(()) => JsonRpcResponse::success(Response::Ack(AckResponse::ok()), id),
            Err(_) => JsonRpcResponse::error(JsonRpcError::service_unavailable(), id),
        }
    }

    async fn handle_send_frame(&self, params: SendFrameParams, id: RequestId) -> JsonRpcResponse {
        let frame = match params.decode_frame() {
            Ok(frame) => frame,
            Err(e) => return JsonRpcResponse::error(JsonRpcError::invalid_params(e), id),
        };

        debug!("Control frame: {} bytes", frame.len());
        match self.service.submit_frame(frame).await {
            Ok(()) => JsonRpcResponse::success(Response::Ack(AckResponse::accepted()), id),
            Err(_) => JsonRpcResponse::error(JsonRpcError::service_unavailable(), id),
        }
    }
}
