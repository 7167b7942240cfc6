//! Send-Wi-Fi command payload

use std::fmt;

use secrecy::{ExposeSecret, SecretSlice};

use crate::core::error::{FrameError, FrameResult};

/// Network credentials decoded from a Send-Wi-Fi command
///
/// SSID and password are opaque byte strings. The password lives in a
/// zeroize-on-drop container and is never printed.
pub struct WifiCredentials {
    ssid: Vec<u8>,
    password: SecretSlice<u8>,
}

impl WifiCredentials {
    pub fn new(ssid: impl Into<Vec<u8>>, password: impl Into<Vec<u8>>) -> Self {
        Self {
            ssid: ssid.into(),
            password: SecretSlice::from(password.into()),
        }
    }

    pub fn ssid(&self) -> &[u8] {
        &self.ssid
    }

    /// SSID for log output; invalid UTF-8 is replaced
    pub fn ssid_lossy(&self) -> String {
        String::from_utf8_lossy(&self.ssid).into_owned()
    }

    pub fn password(&self) -> &[u8] {
        self.password.expose_secret()
    }

    /// Encode as `[ssid_len][ssid][pass_len][password]`
    pub fn encode(&self) -> FrameResult<Vec<u8>> {
        let password = self.password();
        let ssid_len = field_len(&self.ssid)?;
        let pass_len = field_len(password)?;

        let mut out = Vec::with_capacity(self.ssid.len() + password.len() + 2);
        out.push(ssid_len);
        out.extend_from_slice(&self.ssid);
        out.push(pass_len);
        out.extend_from_slice(password);
        Ok(out)
    }
}

impl fmt::Debug for WifiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WifiCredentials")
            .field("ssid", &self.ssid_lossy())
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Decode a Send-Wi-Fi payload
///
/// Every length byte is checked against the remaining buffer before the field
/// it describes is read. Bytes following the password are ignored.
pub fn decode_wifi_credentials(payload: &[u8]) -> FrameResult<WifiCredentials> {
    if payload.len() < 2 {
        return Err(FrameError::TooShort {
            expected: 2,
            actual: payload.len(),
        });
    }

    let (ssid, rest) = read_field(payload, "ssid")?;
    let (password, _trailing) = read_field(rest, "password")?;

    Ok(WifiCredentials::new(ssid, password))
}

/// Split one `[len][bytes:len]` field off the front of `buf`
fn read_field<'a>(buf: &'a [u8], field: &'static str) -> FrameResult<(&'a [u8], &'a [u8])> {
    let (&len, rest) = buf.split_first().ok_or(FrameError::Truncated {
        field,
        declared: 1,
        available: 0,
    })?;

    let len = usize::from(len);
    if len > rest.len() {
        return Err(FrameError::Truncated {
            field,
            declared: len,
            available: rest.len(),
        });
    }

    Ok(rest.split_at(len))
}

fn field_len(bytes: &[u8]) -> FrameResult<u8> {
    u8::try_from(bytes.len()).map_err(|_| FrameError::PayloadTooLarge {
        len: bytes.len(),
        max: usize::from(u8::MAX),
    })
}
