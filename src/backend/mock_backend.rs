//! Mock collaborators for testing

use std::sync::Arc;
use tokio::sync::{Mutex, Notify, watch};

use crate::{
    backend::{IdentifyHandler, WifiConnector},
    codec::credentials::WifiCredentials,
    core::error::{WifiError, WifiResult},
};

/// Internal state for the mock connector
#[derive(Debug, Default)]
struct MockState {
    should_fail_connect: bool,
    hold_connect: bool,
    attempts: Vec<(Vec<u8>, Vec<u8>)>,
}

/// Mock Wi-Fi connector
///
/// Records every attempt and can be told to fail or to block until released.
#[derive(Debug, Clone, Default)]
pub struct MockWifiConnector {
    inner: Arc<Mutex<MockState>>,
    release: Arc<Notify>,
}

impl MockWifiConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure mock to fail connect operations
    pub async fn set_connect_failure(&self, should_fail: bool) {
        self.inner.lock().await.should_fail_connect = should_fail;
    }

    /// Block connect calls until [`release`](Self::release) is called
    pub async fn set_hold(&self, hold: bool) {
        self.inner.lock().await.hold_connect = hold;
    }

    /// Let one held connect call finish
    pub fn release(&self) {
        self.release.notify_one();
    }

    /// SSID/password pairs seen so far
    pub async fn attempts(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.inner.lock().await.attempts.clone()
    }
}

impl WifiConnector for MockWifiConnector {
    async fn connect(&self, credentials: &WifiCredentials) -> WifiResult<()> {
        let hold = {
            let mut state = self.inner.lock().await;
            state
                .attempts
                .push((credentials.ssid().to_vec(), credentials.password().to_vec()));
            state.hold_connect
        };

        if hold {
            self.release.notified().await;
        }

        if self.inner.lock().await.should_fail_connect {
            Err(WifiError::ConnectionFailed("Mock connect failure".into()))
        } else {
            Ok(())
        }
    }
}

/// Counts identify requests
#[derive(Debug, Clone)]
pub struct MockIdentifyHandler {
    calls: Arc<watch::Sender<usize>>,
}

impl Default for MockIdentifyHandler {
    fn default() -> Self {
        Self {
            calls: Arc::new(watch::channel(0).0),
        }
    }
}

impl MockIdentifyHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        *self.calls.borrow()
    }

    /// Resolve once at least `n` identify requests arrived
    pub async fn wait_for_calls(&self, n: usize) {
        let mut calls = self.calls.subscribe();
        let _ = calls.wait_for(|seen| *seen >= n).await;
    }
}

impl IdentifyHandler for MockIdentifyHandler {
    async fn identify(&self) {
        self.calls.send_modify(|calls| *calls += 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_mock_connector_records_attempts() {
        let connector = MockWifiConnector::new();
        let creds = WifiCredentials::new("MyNetwork", "secret");

        assert_ok!(connector.connect(&creds).await);

        let attempts = connector.attempts().await;
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].0, b"MyNetwork".to_vec());
        assert_eq!(attempts[0].1, b"secret".to_vec());
    }

    #[tokio::test]
    async fn test_mock_connector_failure() {
        let connector = MockWifiConnector::new();
        connector.set_connect_failure(true).await;

        assert_err!(connector.connect(&WifiCredentials::new("net", "pw")).await);
    }

    #[tokio::test]
    async fn test_mock_connector_hold() {
        let connector = MockWifiConnector::new();
        connector.set_hold(true).await;

        let task = tokio::spawn({
            let connector = connector.clone();
            async move { connector.connect(&WifiCredentials::new("net", "pw")).await }
        });

        tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
        assert!(!task.is_finished());

        connector.release();
        assert_ok!(task.await.unwrap());
    }

    #[tokio::test]
    async fn test_mock_identify_counts() {
        let identify = MockIdentifyHandler::new();
        identify.identify().await;
        identify.identify().await;
        assert_eq!(identify.calls(), 2);
    }
}
