//! Control channel message definitions

pub mod jsonrpc;
pub mod notification;
pub mod request;
pub mod response;

pub use {
    jsonrpc::{JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, RequestId},
    notification::{ErrorChangedParams, Notification, RpcResultParams, StateChangedParams},
    request::{Request, SendFrameParams, SetErrorParams},
    response::{AckResponse, Response, StatusResponse},
};
