//! RPC command and result frames
//!
//! Both directions share one layout: `[code][len][payload:len][checksum]`,
//! where the checksum covers every byte before it.

use crate::{
    codec::checksum::checksum,
    core::{
        error::{FrameError, FrameResult},
        types::Command,
    },
};

/// Smallest valid frame: code, length and checksum with an empty payload
pub const MIN_FRAME_LEN: usize = 3;

/// Largest payload a single length byte can describe
pub const MAX_PAYLOAD_LEN: usize = u8::MAX as usize;

/// Inbound RPC command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    pub command: u8,
    pub payload: Vec<u8>,
}

impl CommandFrame {
    pub fn new(command: impl Into<u8>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            command: command.into(),
            payload: payload.into(),
        }
    }

    /// Serialize back into wire bytes
    pub fn encode(&self) -> FrameResult<Vec<u8>> {
        encode_frame(self.command, &self.payload)
    }
}

/// Outbound RPC result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultFrame {
    pub last_command: u8,
    pub payload: Vec<u8>,
}

impl ResultFrame {
    pub fn encode(&self) -> FrameResult<Vec<u8>> {
        encode_frame(self.last_command, &self.payload)
    }
}

/// Decode an inbound command frame
pub fn decode_command(raw: &[u8]) -> FrameResult<CommandFrame> {
    let too_short = || FrameError::TooShort {
        expected: MIN_FRAME_LEN,
        actual: raw.len(),
    };

    if raw.len() < MIN_FRAME_LEN {
        return Err(too_short());
    }

    let (&received, body) = raw.split_last().ok_or_else(too_short)?;
    let [command, declared, payload @ ..] = body else {
        return Err(too_short());
    };

    let declared = usize::from(*declared);
    if raw.len() != declared + MIN_FRAME_LEN {
        return Err(FrameError::LengthMismatch {
            declared,
            actual: raw.len(),
        });
    }

    let expected = checksum(body);
    if expected != received {
        return Err(FrameError::ChecksumMismatch {
            expected,
            actual: received,
        });
    }

    Ok(CommandFrame {
        command: *command,
        payload: payload.to_vec(),
    })
}

/// Encode a result frame answering `last_command`
///
/// Payloads longer than [`MAX_PAYLOAD_LEN`] are rejected rather than truncated.
pub fn encode_result(last_command: u8, payload: &[u8]) -> FrameResult<Vec<u8>> {
    encode_frame(last_command, payload)
}

/// Encode the Send-Wi-Fi result carrying an optional follow-up URL
///
/// An empty `url` produces `[0x01, 0x01, 0x00, 0x02]`.
pub fn encode_provisioned_url(url: &str) -> FrameResult<Vec<u8>> {
    let url = url.as_bytes();
    let url_len = u8::try_from(url.len()).map_err(|_| FrameError::PayloadTooLarge {
        len: url.len() + 1,
        max: MAX_PAYLOAD_LEN,
    })?;

    let mut payload = Vec::with_capacity(url.len() + 1);
    payload.push(url_len);
    payload.extend_from_slice(url);

    encode_result(Command::SendWifi.into(), &payload)
}

fn encode_frame(code: u8, payload: &[u8]) -> FrameResult<Vec<u8>> {
    let len = u8::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge {
        len: payload.len(),
        max: MAX_PAYLOAD_LEN,
    })?;

    let mut out = Vec::with_capacity(payload.len() + MIN_FRAME_LEN);
    out.push(code);
    out.push(len);
    out.extend_from_slice(payload);
    out.push(checksum(&out));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_identify() {
        let frame = decode_command(&[0x02, 0x00, 0x02]).unwrap();
        assert_eq!(frame, CommandFrame::new(Command::Identify, vec![]));
    }

    #[test]
    fn test_decode_with_payload() {
        let raw = [0x01, 0x02, 0xAA, 0xBB, 0x68];
        let frame = decode_command(&raw).unwrap();
        assert_eq!(frame.command, 0x01);
        assert_eq!(frame.payload, vec![0xAA, 0xBB]);
    }

    #[test]
    fn test_decode_too_short() {
        for raw in [&[][..], &[0x01][..], &[0x01, 0x00][..]] {
            assert_eq!(
                decode_command(raw),
                Err(FrameError::TooShort {
                    expected: 3,
                    actual: raw.len()
                })
            );
        }
    }

    #[test]
    fn test_decode_length_mismatch() {
        // Declared 5 payload bytes but only 3 present
        let raw = [0x01, 0x05, 0x00, 0x00, 0x00, 0x06];
        assert_eq!(
            decode_command(&raw),
            Err(FrameError::LengthMismatch {
                declared: 5,
                actual: 6
            })
        );

        // Trailing garbage after the checksum is a mismatch too
        let raw = [0x02, 0x00, 0x02, 0x00];
        assert!(matches!(
            decode_command(&raw),
            Err(FrameError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_decode_max_declared_length_on_short_buffer() {
        let raw = [0x01, 0xFF, 0x00];
        assert_eq!(
            decode_command(&raw),
            Err(FrameError::LengthMismatch {
                declared: 255,
                actual: 3
            })
        );
    }

    #[test]
    fn test_decode_checksum_mismatch() {
        assert_eq!(
            decode_command(&[0x02, 0x00, 0x03]),
            Err(FrameError::ChecksumMismatch {
                expected: 0x02,
                actual: 0x03
            })
        );
    }

    #[test]
    fn test_decode_encode_round_trip() {
        let payloads: [&[u8]; 4] = [&[], &[0x00], &[0xFF; 16], &[0x7F; 255]];
        for payload in payloads {
            let original = encode_result(0x01, payload).unwrap();
            let decoded = decode_command(&original).unwrap();
            assert_eq!(decoded.encode().unwrap(), original);
        }
    }

    #[test]
    fn test_encode_result_layout() {
        let frame = encode_result(0x01, &[0x10, 0x20]).unwrap();
        assert_eq!(frame, vec![0x01, 0x02, 0x10, 0x20, 0x33]);

        let frame = ResultFrame {
            last_command: 0x01,
            payload: vec![0x10, 0x20],
        };
        assert_eq!(frame.encode().unwrap(), vec![0x01, 0x02, 0x10, 0x20, 0x33]);
    }

    #[test]
    fn test_encode_result_rejects_oversized_payload() {
        assert_eq!(
            encode_result(0x01, &[0u8; 256]),
            Err(FrameError::PayloadTooLarge { len: 256, max: 255 })
        );
    }

    #[test]
    fn test_encode_provisioned_url_empty() {
        assert_eq!(encode_provisioned_url("").unwrap(), vec![0x01, 0x01, 0x00, 0x02]);
    }

    #[test]
    fn test_encode_provisioned_url() {
        let frame = encode_provisioned_url("http://x").unwrap();
        assert_eq!(frame[0], 0x01);
        assert_eq!(frame[1], 9);
        assert_eq!(frame[2], 8);
        assert_eq!(&frame[3..11], b"http://x");
        assert_eq!(frame[11], checksum(&frame[..11]));
    }

    #[test]
    fn test_encode_provisioned_url_limits() {
        assert!(encode_provisioned_url(&"a".repeat(254)).is_ok());
        assert!(matches!(
            encode_provisioned_url(&"a".repeat(255)),
            Err(FrameError::PayloadTooLarge { .. })
        ));
    }
}
