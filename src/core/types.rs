//! Domain types for Improv provisioning

use serde::{Deserialize, Serialize};

/// Improv provisioning state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ProvisioningState {
    AuthRequired = 0x01,
    Authorized = 0x02,
    Provisioning = 0x03,
    Provisioned = 0x04,
}

impl TryFrom<u8> for ProvisioningState {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, <Self as TryFrom<u8>>::Error> {
        match value {
            0x01 => Ok(ProvisioningState::AuthRequired),
            0x02 => Ok(ProvisioningState::Authorized),
            0x03 => Ok(ProvisioningState::Provisioning),
            0x04 => Ok(ProvisioningState::Provisioned),
            _ => Err(()),
        }
    }
}

impl From<ProvisioningState> for u8 {
    fn from(state: ProvisioningState) -> Self {
        state as u8
    }
}

/// Latched Improv error state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ErrorCode {
    None = 0x00,
    BadPacket = 0x01,
    UnknownCommand = 0x02,
    CouldNotConnect = 0x03,
    NotAuthorized = 0x04,
    Unknown = 0xFF,
}

impl TryFrom<u8> for ErrorCode {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, <Self as TryFrom<u8>>::Error> {
        match value {
            0x00 => Ok(ErrorCode::None),
            0x01 => Ok(ErrorCode::BadPacket),
            0x02 => Ok(ErrorCode::UnknownCommand),
            0x03 => Ok(ErrorCode::CouldNotConnect),
            0x04 => Ok(ErrorCode::NotAuthorized),
            0xFF => Ok(ErrorCode::Unknown),
            _ => Err(()),
        }
    }
}

impl From<ErrorCode> for u8 {
    fn from(code: ErrorCode) -> Self {
        code as u8
    }
}

/// RPC command codes understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    SendWifi = 0x01,
    Identify = 0x02,
}

impl TryFrom<u8> for Command {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, <Self as TryFrom<u8>>::Error> {
        match value {
            0x01 => Ok(Command::SendWifi),
            0x02 => Ok(Command::Identify),
            _ => Err(()),
        }
    }
}

impl From<Command> for u8 {
    fn from(command: Command) -> Self {
        command as u8
    }
}

/// Device capability bitmask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capabilities(u8);

impl Capabilities {
    /// Device can identify itself (blink, beep, ...)
    pub const IDENTIFY: Capabilities = Capabilities(0x01);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Capabilities) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn with(self, other: Capabilities) -> Self {
        Self(self.0 | other.0)
    }
}

impl From<Capabilities> for u8 {
    fn from(caps: Capabilities) -> Self {
        caps.bits()
    }
}

/// Whether commands are checked against the current state before acting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandGating {
    /// Send-Wi-Fi is refused with `NotAuthorized` while authorization is required
    #[default]
    Gated,
    /// Credentials are accepted in any idle state, as early firmware did
    Ungated,
}

/// Observable engine state published to readers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub state: ProvisioningState,
    pub error: ErrorCode,
    pub capabilities: Capabilities,
    /// Last encoded RPC result frame, empty until one is produced
    #[serde(skip)]
    pub last_result: Vec<u8>,
}

/// Session identifier for transport connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(uuid::Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
