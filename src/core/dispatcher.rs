//! Command dispatch

use crate::{
    codec::credentials::{WifiCredentials, decode_wifi_credentials},
    core::{error::FrameError, types::Command},
};

/// What a decoded command asks the state machine to do
#[derive(Debug)]
pub enum DispatchOutcome {
    ConnectRequested(WifiCredentials),
    IdentifyRequested,
    BadPacket(FrameError),
    UnknownCommand(u8),
}

/// Map a command code and its payload to a state machine request
pub fn dispatch(command_code: u8, payload: &[u8]) -> DispatchOutcome {
    match Command::try_from(command_code) {
        Ok(Command::SendWifi) => match decode_wifi_credentials(payload) {
            Ok(credentials) => DispatchOutcome::ConnectRequested(credentials),
            Err(e) => DispatchOutcome::BadPacket(e),
        },
        Ok(Command::Identify) => DispatchOutcome::IdentifyRequested,
        Err(()) => DispatchOutcome::UnknownCommand(command_code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_send_wifi() {
        let payload = [0x03, b'a', b'b', b'c', 0x02, b'h', b'i'];
        match dispatch(0x01, &payload) {
            DispatchOutcome::ConnectRequested(creds) => {
                assert_eq!(creds.ssid(), b"abc");
                assert_eq!(creds.password(), b"hi");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_dispatch_send_wifi_bad_payload() {
        assert!(matches!(
            dispatch(0x01, &[0x09, b'a']),
            DispatchOutcome::BadPacket(FrameError::Truncated { field: "ssid", .. })
        ));
        assert!(matches!(
            dispatch(0x01, &[]),
            DispatchOutcome::BadPacket(FrameError::TooShort { .. })
        ));
    }

    #[test]
    fn test_dispatch_identify_ignores_payload() {
        assert!(matches!(dispatch(0x02, &[]), DispatchOutcome::IdentifyRequested));
        assert!(matches!(
            dispatch(0x02, &[0xAA]),
            DispatchOutcome::IdentifyRequested
        ));
    }

    #[test]
    fn test_dispatch_unknown() {
        for code in [0x00, 0x03, 0x7F, 0xFF] {
            assert!(matches!(
                dispatch(code, &[]),
                DispatchOutcome::UnknownCommand(c) if c == code
            ));
        }
    }
}
