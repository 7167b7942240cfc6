//! Advertised status payload

use crate::core::types::{Capabilities, ProvisioningState};

/// Length of the status service data
pub const STATUS_PAYLOAD_LEN: usize = 6;

/// Encode `[state][caps][0][0][0][0]`
///
/// The trailing bytes are reserved and always zero.
pub fn encode_status(state: ProvisioningState, caps: Capabilities) -> [u8; STATUS_PAYLOAD_LEN] {
    [state.into(), caps.bits(), 0, 0, 0, 0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_status() {
        assert_eq!(
            encode_status(ProvisioningState::Authorized, Capabilities::IDENTIFY),
            [0x02, 0x01, 0, 0, 0, 0]
        );
        assert_eq!(
            encode_status(ProvisioningState::Provisioned, Capabilities::empty()),
            [0x04, 0x00, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_reserved_bytes_are_zero() {
        let payload = encode_status(ProvisioningState::AuthRequired, Capabilities::from_bits(0xFF));
        assert_eq!(&payload[2..], &[0, 0, 0, 0]);
    }
}
