//! wpa_supplicant connector built on wifi-ctrl

use secrecy::{ExposeSecret, SecretString};
use tokio::{
    sync::broadcast,
    time::{Instant, timeout_at},
};
use tracing::{debug, error, info, warn};
use wifi_ctrl::sta::{Broadcast, BroadcastReceiver, RequestClient, WifiSetup};

use crate::{
    backend::{ConnectPolicy, WifiConnector},
    codec::credentials::WifiCredentials,
    core::error::{WifiError, WifiResult},
};

const MAX_SSID_LEN: usize = 32;
const MIN_PASSPHRASE_LEN: usize = 8;
const MAX_PASSPHRASE_LEN: usize = 63;
const RAW_PSK_LEN: usize = 64;

/// SSID in the form wpa_supplicant is given
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkSsid {
    /// UTF-8 name, sent quoted
    Text(String),
    /// Any other bytes, sent as unquoted hex
    Hex(String),
}

impl NetworkSsid {
    fn from_bytes(ssid: &[u8]) -> Self {
        match std::str::from_utf8(ssid) {
            Ok(text) => Self::Text(text.to_string()),
            Err(_) => Self::Hex(hex::encode(ssid)),
        }
    }
}

impl std::fmt::Display for NetworkSsid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{}", text),
            Self::Hex(hex) => write!(f, "<hex {}>", hex),
        }
    }
}

/// Network security derived from the received password
#[derive(Debug)]
pub enum NetworkKey {
    /// Empty password
    Open,
    /// WPA passphrase, 8 to 63 characters
    Passphrase(SecretString),
    /// Pre-computed PSK as 64 hex digits
    RawPsk(SecretString),
}

/// Check credentials against what wpa_supplicant accepts
pub fn validate_credentials(
    credentials: &WifiCredentials,
) -> WifiResult<(NetworkSsid, NetworkKey)> {
    let ssid = credentials.ssid();
    if ssid.is_empty() || ssid.len() > MAX_SSID_LEN {
        return Err(WifiError::InvalidSsid(format!(
            "length {} outside 1..={}",
            ssid.len(),
            MAX_SSID_LEN
        )));
    }

    let password = std::str::from_utf8(credentials.password())
        .map_err(|_| WifiError::InvalidPassword("not valid UTF-8".to_string()))?;

    let key = match password.len() {
        0 => NetworkKey::Open,
        RAW_PSK_LEN if password.chars().all(|c| c.is_ascii_hexdigit()) => {
            NetworkKey::RawPsk(SecretString::from(password.to_string()))
        }
        MIN_PASSPHRASE_LEN..=MAX_PASSPHRASE_LEN => {
            NetworkKey::Passphrase(SecretString::from(password.to_string()))
        }
        len => {
            return Err(WifiError::InvalidPassword(format!(
                "length {} outside {}..={}",
                len, MIN_PASSPHRASE_LEN, MAX_PASSPHRASE_LEN
            )));
        }
    };

    Ok((NetworkSsid::from_bytes(ssid), key))
}

pub struct WifiCtrlBackend {
    interface: String,
    policy: ConnectPolicy,
    client: RequestClient,
    broadcast_receiver: BroadcastReceiver,
}

impl WifiCtrlBackend {
    pub fn new(interface: String, policy: ConnectPolicy) -> WifiResult<Self> {
        let path = format!("/var/run/wpa_supplicant/{}", interface);
        let mut setup =
            WifiSetup::new().map_err(|e| WifiError::BackendUnavailable(e.to_string()))?;
        setup.set_socket_path(path);

        let client = setup.get_request_client();
        let broadcast_receiver = setup.get_broadcast_receiver();
        let station = setup.complete();

        tokio::spawn(async move {
            if let Err(e) = station.run().await {
                error!("WifiStation runtime error: {}", e);
            }
        });

        Ok(Self {
            interface,
            policy,
            client,
            broadcast_receiver,
        })
    }

    async fn configure(
        &self,
        network_id: usize,
        ssid: NetworkSsid,
        key: NetworkKey,
    ) -> WifiResult<()> {
        let result = match ssid {
            NetworkSsid::Text(text) => self.client.set_network_ssid(network_id, text).await,
            NetworkSsid::Hex(hex) => {
                self.client
                    .send_custom(format!("SET_NETWORK {} ssid {}", network_id, hex))
                    .await
                    .map(|_| ())
            }
        };
        result.map_err(|e| WifiError::WpaSupplicantError(format!("Failed to set SSID: {}", e)))?;

        match key {
            NetworkKey::Open => {
                self.client
                    .send_custom(format!("SET_NETWORK {} key_mgmt NONE", network_id))
                    .await
                    .map_err(|e| {
                        WifiError::WpaSupplicantError(format!("Failed to set key_mgmt: {}", e))
                    })?;
            }
            NetworkKey::Passphrase(passphrase) => {
                self.client
                    .set_network_psk(network_id, passphrase.expose_secret().to_string())
                    .await
                    .map_err(|e| {
                        WifiError::WpaSupplicantError(format!("Failed to set PSK: {}", e))
                    })?;
            }
            NetworkKey::RawPsk(psk) => {
                // Unquoted so wpa_supplicant reads it as hex, not as a passphrase
                self.client
                    .send_custom(format!(
                        "SET_NETWORK {} psk {}",
                        network_id,
                        psk.expose_secret()
                    ))
                    .await
                    .map_err(|e| {
                        WifiError::WpaSupplicantError(format!("Failed to set PSK: {}", e))
                    })?;
            }
        }

        self.client.select_network(network_id).await.map_err(|e| {
            WifiError::WpaSupplicantError(format!("Failed to select network: {}", e))
        })?;

        Ok(())
    }

    /// Wait for association, one `attempt_delay` window per attempt
    async fn wait_connected(&self, receiver: &mut BroadcastReceiver) -> WifiResult<()> {
        for attempt in 1..=self.policy.max_attempts {
            let deadline = Instant::now() + self.policy.attempt_delay;

            loop {
                match timeout_at(deadline, receiver.recv()).await {
                    Ok(Ok(Broadcast::Connected)) => return Ok(()),
                    Ok(Ok(Broadcast::WrongPsk)) => {
                        return Err(WifiError::ConnectionFailed("Wrong password".to_string()));
                    }
                    Ok(Ok(event)) => debug!("Ignoring broadcast event: {:?}", event),
                    Ok(Err(broadcast::error::RecvError::Lagged(n))) => {
                        warn!("Broadcast receiver lagged by {} events", n);
                    }
                    Ok(Err(broadcast::error::RecvError::Closed)) => {
                        return Err(WifiError::BackendUnavailable(
                            "Broadcast channel closed".to_string(),
                        ));
                    }
                    Err(_) => break,
                }
            }

            debug!(
                "Not connected after attempt {}/{}",
                attempt, self.policy.max_attempts
            );
        }

        Err(WifiError::Timeout {
            attempts: self.policy.max_attempts,
        })
    }

    async fn remove_network(&self, network_id: usize) {
        if let Err(e) = self
            .client
            .send_custom(format!("REMOVE_NETWORK {}", network_id))
            .await
        {
            warn!("Failed to remove network {}: {}", network_id, e);
        }
    }
}

impl WifiConnector for WifiCtrlBackend {
    async fn connect(&self, credentials: &WifiCredentials) -> WifiResult<()> {
        let (ssid, key) = validate_credentials(credentials)?;
        info!("Connecting {} to '{}'", self.interface, ssid);

        // Subscribe before selecting the network so no event is missed
        let mut receiver = self.broadcast_receiver.resubscribe();

        let network_id =
            self.client.add_network().await.map_err(|e| {
                WifiError::WpaSupplicantError(format!("Failed to add network: {}", e))
            })?;

        let result = match self.configure(network_id, ssid, key).await {
            Ok(()) => self.wait_connected(&mut receiver).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                if let Err(e) = self.client.save_config().await {
                    warn!("Failed to save wpa_supplicant config: {}", e);
                }
                info!("Connected on {}", self.interface);
                Ok(())
            }
            Err(e) => {
                self.remove_network(network_id).await;
                Err(e)
            }
        }
    }
}
