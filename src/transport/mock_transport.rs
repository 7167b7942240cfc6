//! Transport that records every call

use std::sync::{
    Arc, OnceLock,
    atomic::{AtomicBool, Ordering},
};
use tokio::sync::{Mutex, watch};

use crate::{
    core::{
        error::{TransportError, TransportResult},
        types::{Capabilities, ErrorCode, ProvisioningState, StatusSnapshot},
    },
    transport::Transport,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    State(ProvisioningState),
    Error(ErrorCode),
    Result(Vec<u8>),
    Broadcast(ProvisioningState, Capabilities),
}

#[derive(Debug, Clone)]
pub struct RecordingTransport {
    calls: Arc<Mutex<Vec<Recorded>>>,
    count: Arc<watch::Sender<usize>>,
    fail: Arc<AtomicBool>,
    status: Arc<OnceLock<watch::Receiver<StatusSnapshot>>>,
    observed: Arc<Mutex<Vec<(Recorded, StatusSnapshot)>>>,
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self {
            calls: Arc::default(),
            count: Arc::new(watch::channel(0).0),
            fail: Arc::default(),
            status: Arc::default(),
            observed: Arc::default(),
        }
    }
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail after recording it
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Capture the published status alongside every later call
    pub fn observe_status(&self, status: watch::Receiver<StatusSnapshot>) {
        let _ = self.status.set(status);
    }

    pub async fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().await.clone()
    }

    /// Calls paired with the status readers could see at that moment
    pub async fn observed(&self) -> Vec<(Recorded, StatusSnapshot)> {
        self.observed.lock().await.clone()
    }

    /// Resolve once at least `n` calls were recorded
    pub async fn wait_for_calls(&self, n: usize) {
        let mut count = self.count.subscribe();
        let _ = count.wait_for(|seen| *seen >= n).await;
    }

    async fn record(&self, call: Recorded) -> TransportResult<()> {
        if let Some(status) = self.status.get() {
            let snapshot = status.borrow().clone();
            self.observed.lock().await.push((call.clone(), snapshot));
        }
        self.calls.lock().await.push(call);
        self.count.send_modify(|count| *count += 1);

        if self.fail.load(Ordering::SeqCst) {
            Err(TransportError::Protocol("Mock transport failure".into()))
        } else {
            Ok(())
        }
    }
}

impl Transport for RecordingTransport {
    async fn notify_state(&self, state: ProvisioningState) -> TransportResult<()> {
        self.record(Recorded::State(state)).await
    }

    async fn notify_error(&self, error: ErrorCode) -> TransportResult<()> {
        self.record(Recorded::Error(error)).await
    }

    async fn notify_result(&self, frame: &[u8]) -> TransportResult<()> {
        self.record(Recorded::Result(frame.to_vec())).await
    }

    async fn update_broadcast(
        &self,
        state: ProvisioningState,
        capabilities: Capabilities,
    ) -> TransportResult<()> {
        self.record(Recorded::Broadcast(state, capabilities)).await
    }
}
