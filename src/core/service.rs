//! Provisioning service runtime
//!
//! Owns the [`ProvisioningEngine`] and serializes every input through one
//! event channel, so the engine never sees concurrent calls. Effects are
//! applied in order: notifications go to the transport, identify requests to
//! the identify handler, and connect requests to a spawned worker whose
//! outcome comes back as another event.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::{
    backend::{IdentifyHandler, WifiConnector},
    codec::credentials::WifiCredentials,
    core::{
        engine::{Effect, EngineEffects, ProvisioningEngine},
        error::{ServiceError, ServiceResult},
        types::{ErrorCode, StatusSnapshot},
    },
    transport::Transport,
};

const EVENT_QUEUE_DEPTH: usize = 32;

/// Input to the service loop
pub enum ServiceEvent {
    /// Raw RPC command bytes written by a peer
    Inbound(Vec<u8>),
    Authorize,
    SetError(ErrorCode),
    ConnectFinished(bool),
}

// Inbound frames may carry a password
impl std::fmt::Debug for ServiceEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inbound(frame) => write!(f, "Inbound({} bytes)", frame.len()),
            Self::Authorize => write!(f, "Authorize"),
            Self::SetError(code) => write!(f, "SetError({:?})", code),
            Self::ConnectFinished(connected) => write!(f, "ConnectFinished({})", connected),
        }
    }
}

/// Cloneable handle used by transports and the host to drive the service
#[derive(Debug, Clone)]
pub struct ServiceHandle {
    tx: mpsc::Sender<ServiceEvent>,
    status: watch::Receiver<StatusSnapshot>,
}

impl ServiceHandle {
    /// Queue a raw command frame for processing
    pub async fn submit_frame(&self, frame: Vec<u8>) -> ServiceResult<()> {
        self.send(ServiceEvent::Inbound(frame)).await
    }

    /// Report that physical authorization was granted
    pub async fn authorize(&self) -> ServiceResult<()> {
        self.send(ServiceEvent::Authorize).await
    }

    pub async fn set_error(&self, code: ErrorCode) -> ServiceResult<()> {
        self.send(ServiceEvent::SetError(code)).await
    }

    /// Latest published state
    pub fn status(&self) -> StatusSnapshot {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<StatusSnapshot> {
        self.status.clone()
    }

    async fn send(&self, event: ServiceEvent) -> ServiceResult<()> {
        self.tx.send(event).await.map_err(|_| ServiceError::Stopped)
    }
}

/// Event loop around the engine
///
/// The loop holds only a weak sender to itself, so [`run`](Self::run) returns
/// once every [`ServiceHandle`] and in-flight connect worker is gone.
pub struct ProvisioningService<C, I, T> {
    engine: ProvisioningEngine,
    connector: Arc<C>,
    identify: Arc<I>,
    transport: Arc<T>,
    rx: mpsc::Receiver<ServiceEvent>,
    tx: mpsc::WeakSender<ServiceEvent>,
    status: watch::Sender<StatusSnapshot>,
    last_result: Vec<u8>,
}

impl<C, I, T> ProvisioningService<C, I, T>
where
    C: WifiConnector,
    I: IdentifyHandler,
    T: Transport,
{
    pub fn new(
        engine: ProvisioningEngine,
        connector: Arc<C>,
        identify: Arc<I>,
        transport: Arc<T>,
    ) -> (Self, ServiceHandle) {
        let (tx, rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let (status, status_rx) = watch::channel(StatusSnapshot {
            state: engine.state(),
            error: engine.error(),
            capabilities: engine.capabilities(),
            last_result: Vec::new(),
        });

        let service = Self {
            engine,
            connector,
            identify,
            transport,
            rx,
            tx: tx.downgrade(),
            status,
            last_result: Vec::new(),
        };
        let handle = ServiceHandle {
            tx,
            status: status_rx,
        };

        (service, handle)
    }

    /// Announce the initial state, then process events until all handles drop
    pub async fn run(mut self) {
        info!(
            "Provisioning service started in state {:?}",
            self.engine.state()
        );

        let effects = self.engine.announce();
        self.apply(effects).await;

        while let Some(event) = self.rx.recv().await {
            debug!("Service event: {:?}", event);
            let effects = match event {
                ServiceEvent::Inbound(frame) => self.engine.handle_inbound(&frame),
                ServiceEvent::Authorize => self.engine.authorize(),
                ServiceEvent::SetError(code) => self.engine.set_error(code),
                ServiceEvent::ConnectFinished(connected) => {
                    self.engine.complete_connect(connected)
                }
            };
            self.apply(effects).await;
        }

        info!("Provisioning service stopped");
    }

    async fn apply(&mut self, effects: EngineEffects) {
        // Readers must see the new values by the time a peer is notified
        if let Some(frame) = effects.iter().rev().find_map(|effect| match effect {
            Effect::RpcResult(frame) => Some(frame),
            _ => None,
        }) {
            self.last_result = frame.clone();
        }
        self.publish_status();

        for effect in effects {
            let result = match effect {
                Effect::StateChanged(state) => self.transport.notify_state(state).await,
                Effect::ErrorChanged(error) => self.transport.notify_error(error).await,
                Effect::Broadcast {
                    state,
                    capabilities,
                } => self.transport.update_broadcast(state, capabilities).await,
                Effect::RpcResult(frame) => self.transport.notify_result(&frame).await,
                Effect::Identify => {
                    self.identify.identify().await;
                    Ok(())
                }
                Effect::Connect(credentials) => {
                    self.spawn_connect(credentials);
                    Ok(())
                }
            };

            if let Err(e) = result {
                warn!("Transport notification failed: {}", e);
            }
        }
    }

    fn publish_status(&self) {
        self.status.send_replace(StatusSnapshot {
            state: self.engine.state(),
            error: self.engine.error(),
            capabilities: self.engine.capabilities(),
            last_result: self.last_result.clone(),
        });
    }

    fn spawn_connect(&self, credentials: WifiCredentials) {
        let Some(tx) = self.tx.upgrade() else {
            warn!("Service is shutting down, dropping connect request");
            return;
        };
        let connector = self.connector.clone();

        tokio::spawn(async move {
            let connected = match connector.connect(&credentials).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(
                        "Connecting to '{}' failed: {}",
                        credentials.ssid_lossy(),
                        e
                    );
                    false
                }
            };

            if tx
                .send(ServiceEvent::ConnectFinished(connected))
                .await
                .is_err()
            {
                debug!("Service stopped before connect finished");
            }
        });
    }
}
