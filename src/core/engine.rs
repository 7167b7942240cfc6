//! Improv provisioning state machine
//!
//! The engine is synchronous and owns the state/error/capability triple. Every
//! operation returns the [`EngineEffects`] it produced instead of calling the
//! transport or the Wi-Fi connector itself; the service runtime applies them.

use tracing::{debug, info, warn};

use crate::{
    codec::{
        credentials::WifiCredentials, frame::decode_command, frame::encode_provisioned_url,
        status::encode_status,
    },
    core::{
        dispatcher::{DispatchOutcome, dispatch},
        error::FrameResult,
        types::{Capabilities, CommandGating, ErrorCode, ProvisioningState},
    },
};

/// Static engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub initial_state: ProvisioningState,
    pub capabilities: Capabilities,
    pub gating: CommandGating,
    /// URL handed to the peer once provisioning succeeds
    pub redirect_url: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_state: ProvisioningState::Authorized,
            capabilities: Capabilities::IDENTIFY,
            gating: CommandGating::Gated,
            redirect_url: None,
        }
    }
}

/// A single observable consequence of an engine operation
#[derive(Debug)]
pub enum Effect {
    StateChanged(ProvisioningState),
    ErrorChanged(ErrorCode),
    Broadcast {
        state: ProvisioningState,
        capabilities: Capabilities,
    },
    RpcResult(Vec<u8>),
    Identify,
    Connect(WifiCredentials),
}

/// Ordered effects produced by one engine operation
#[derive(Debug, Default)]
pub struct EngineEffects(Vec<Effect>);

impl EngineEffects {
    fn push(&mut self, effect: Effect) {
        self.0.push(effect);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Effect> {
        self.0.iter()
    }
}

impl IntoIterator for EngineEffects {
    type Item = Effect;
    type IntoIter = std::vec::IntoIter<Effect>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Improv protocol engine
#[derive(Debug)]
pub struct ProvisioningEngine {
    state: ProvisioningState,
    error: ErrorCode,
    capabilities: Capabilities,
    gating: CommandGating,
    provisioned_result: Vec<u8>,
}

impl ProvisioningEngine {
    /// Create an engine, failing if the redirect URL cannot be framed
    pub fn new(config: EngineConfig) -> FrameResult<Self> {
        let provisioned_result =
            encode_provisioned_url(config.redirect_url.as_deref().unwrap_or_default())?;

        Ok(Self {
            state: config.initial_state,
            error: ErrorCode::None,
            capabilities: config.capabilities,
            gating: config.gating,
            provisioned_result,
        })
    }

    pub fn state(&self) -> ProvisioningState {
        self.state
    }

    pub fn error(&self) -> ErrorCode {
        self.error
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn gating(&self) -> CommandGating {
        self.gating
    }

    /// Current advertised status payload
    pub fn status_payload(&self) -> [u8; 6] {
        encode_status(self.state, self.capabilities)
    }

    /// Publish the full current state, used once a transport comes up
    pub fn announce(&self) -> EngineEffects {
        let mut effects = EngineEffects::default();
        effects.push(Effect::StateChanged(self.state));
        effects.push(Effect::ErrorChanged(self.error));
        self.broadcast(&mut effects);
        effects
    }

    /// Process one raw RPC command write
    pub fn handle_inbound(&mut self, raw: &[u8]) -> EngineEffects {
        debug!(
            "Inbound frame: {} bytes, command {:#04x}",
            raw.len(),
            raw.first().copied().unwrap_or_default()
        );

        let frame = match decode_command(raw) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Rejecting frame: {}", e);
                return self.fail(ErrorCode::BadPacket);
            }
        };

        match dispatch(frame.command, &frame.payload) {
            DispatchOutcome::ConnectRequested(credentials) => self.request_connect(credentials),
            DispatchOutcome::IdentifyRequested => self.request_identify(),
            DispatchOutcome::BadPacket(e) => {
                warn!("Rejecting Send-Wi-Fi payload: {}", e);
                self.fail(ErrorCode::BadPacket)
            }
            DispatchOutcome::UnknownCommand(code) => {
                warn!("Unknown command: {:#04x}", code);
                self.fail(ErrorCode::UnknownCommand)
            }
        }
    }

    /// Physical authorization was granted
    ///
    /// Only leaves `AuthRequired`; in every other state this is a no-op that
    /// produces no notifications.
    pub fn authorize(&mut self) -> EngineEffects {
        let mut effects = EngineEffects::default();
        if self.state != ProvisioningState::AuthRequired {
            debug!("Authorize ignored in state {:?}", self.state);
            return effects;
        }

        self.transition(ProvisioningState::Authorized, &mut effects);
        self.broadcast(&mut effects);
        effects
    }

    /// Latch an error reported by the host
    pub fn set_error(&mut self, code: ErrorCode) -> EngineEffects {
        self.fail(code)
    }

    pub fn request_identify(&self) -> EngineEffects {
        let mut effects = EngineEffects::default();
        if self.capabilities.contains(Capabilities::IDENTIFY) {
            debug!("Identify requested");
            effects.push(Effect::Identify);
        } else {
            debug!("Identify requested but not supported");
        }
        effects
    }

    pub fn request_connect(&mut self, credentials: WifiCredentials) -> EngineEffects {
        match (self.state, self.gating) {
            (ProvisioningState::Provisioning, _) => {
                warn!("Connect already in progress, rejecting new credentials");
                return self.fail(ErrorCode::Unknown);
            }
            (ProvisioningState::AuthRequired, CommandGating::Gated) => {
                warn!("Credentials received before authorization");
                return self.fail(ErrorCode::NotAuthorized);
            }
            _ => {}
        }

        info!("Provisioning network '{}'", credentials.ssid_lossy());

        let mut effects = EngineEffects::default();
        if self.error != ErrorCode::None {
            self.latch(ErrorCode::None, &mut effects);
        }
        self.transition(ProvisioningState::Provisioning, &mut effects);
        self.broadcast(&mut effects);
        effects.push(Effect::Connect(credentials));
        effects
    }

    /// Feed back the outcome of a connect attempt
    pub fn complete_connect(&mut self, connected: bool) -> EngineEffects {
        let mut effects = EngineEffects::default();
        if self.state != ProvisioningState::Provisioning {
            warn!("Ignoring connect completion in state {:?}", self.state);
            return effects;
        }

        if connected {
            info!("Provisioning succeeded");
            self.transition(ProvisioningState::Provisioned, &mut effects);
            self.broadcast(&mut effects);
            effects.push(Effect::RpcResult(self.provisioned_result.clone()));
        } else {
            warn!("Provisioning failed, could not connect");
            self.latch(ErrorCode::CouldNotConnect, &mut effects);
            self.transition(ProvisioningState::Authorized, &mut effects);
            self.broadcast(&mut effects);
        }
        effects
    }

    fn fail(&mut self, code: ErrorCode) -> EngineEffects {
        let mut effects = EngineEffects::default();
        self.latch(code, &mut effects);
        self.broadcast(&mut effects);
        effects
    }

    fn transition(&mut self, to: ProvisioningState, effects: &mut EngineEffects) {
        debug!("State {:?} -> {:?}", self.state, to);
        self.state = to;
        effects.push(Effect::StateChanged(to));
    }

    fn latch(&mut self, code: ErrorCode, effects: &mut EngineEffects) {
        self.error = code;
        effects.push(Effect::ErrorChanged(code));
    }

    fn broadcast(&self, effects: &mut EngineEffects) {
        effects.push(Effect::Broadcast {
            state: self.state,
            capabilities: self.capabilities,
        });
    }
}
