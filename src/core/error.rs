//! Error types for the Improv provisioning service

use thiserror::Error;

/// Result type for frame decoding and encoding
pub type FrameResult<T> = Result<T, FrameError>;

/// Result type for Wi-Fi connector operations
pub type WifiResult<T> = Result<T, WifiError>;

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors raised while decoding or encoding Improv frames
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("Frame too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error("Length mismatch: declared payload of {declared} bytes in a {actual} byte frame")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("Checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    #[error("Truncated {field}: declared {declared} bytes, {available} available")]
    Truncated {
        field: &'static str,
        declared: usize,
        available: usize,
    },

    #[error("Payload too large: {len} bytes exceeds maximum of {max}")]
    PayloadTooLarge { len: usize, max: usize },
}

/// Errors related to joining a Wi-Fi network
#[derive(Error, Debug, Clone)]
pub enum WifiError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection timed out after {attempts} attempts")]
    Timeout { attempts: u8 },

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Invalid SSID: {0}")]
    InvalidSsid(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("wpa_supplicant error: {0}")]
    WpaSupplicantError(String),
}

/// Errors related to the provisioning service runtime
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Service is not running")]
    Stopped,
}

/// Errors related to transport layer
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while validating runtime settings
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("At least one transport (BLE or Unix socket) must be enabled")]
    NoTransport,

    #[error("Invalid socket mode '{0}': expected an octal permission value")]
    InvalidSocketMode(String),

    #[error("Redirect URL is {len} bytes, maximum is {max}")]
    RedirectUrlTooLong { len: usize, max: usize },

    #[error("Connect attempts must be at least 1")]
    NoConnectAttempts,
}
