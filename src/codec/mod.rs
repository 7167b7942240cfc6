//! Improv wire format
//!
//! Bit-exact encoding and decoding of the frames exchanged with a provisioning
//! peer. Every decoder here is total: malformed input yields a [`FrameError`],
//! never a panic or an out-of-bounds read.
//!
//! [`FrameError`]: crate::core::error::FrameError

pub mod checksum;
pub mod credentials;
pub mod frame;
pub mod status;

pub use {
    checksum::checksum,
    credentials::{WifiCredentials, decode_wifi_credentials},
    frame::{CommandFrame, ResultFrame, decode_command, encode_provisioned_url, encode_result},
    status::encode_status,
};
