//! Wi-Fi connector trait definition

use std::time::Duration;

use trait_variant::make;

use crate::{codec::credentials::WifiCredentials, core::error::WifiResult};

/// Default number of connection checks, matching the Improv reference firmware
pub const DEFAULT_CONNECT_ATTEMPTS: u8 = 20;

/// Default wait between connection checks
pub const DEFAULT_ATTEMPT_DELAY: Duration = Duration::from_millis(500);

/// How long a connector may try before reporting failure
///
/// The total budget is `max_attempts * attempt_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectPolicy {
    pub max_attempts: u8,
    pub attempt_delay: Duration,
}

impl ConnectPolicy {
    pub fn budget(&self) -> Duration {
        self.attempt_delay * u32::from(self.max_attempts)
    }
}

impl Default for ConnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_CONNECT_ATTEMPTS,
            attempt_delay: DEFAULT_ATTEMPT_DELAY,
        }
    }
}

/// Joins the device to a Wi-Fi network
///
/// Implementations may take as long as their [`ConnectPolicy`] allows. The
/// engine only learns whether the attempt succeeded; error details are logged
/// by the caller.
#[make(Send)]
pub trait WifiConnector: Sync + 'static {
    async fn connect(&self, credentials: &WifiCredentials) -> WifiResult<()>;
}
