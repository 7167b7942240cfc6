//! Improv Wi-Fi Provisioning Service
//!
//! Implements the device side of the Improv Wi-Fi protocol over:
//! - Bluetooth Low Energy (GATT)
//! - Unix Domain Sockets (JSON-RPC 2.0 control channel)

pub mod backend;
pub mod codec;
pub mod config;
pub mod core;
pub mod protocol;
pub mod transport;

pub use core::{
    engine::{EngineConfig, ProvisioningEngine},
    error::{ConfigError, FrameError, ServiceError, TransportError, WifiError},
    service::{ProvisioningService, ServiceHandle},
    types::{Capabilities, CommandGating, ErrorCode, ProvisioningState, StatusSnapshot},
};
