//! Runtime settings

use std::{path::PathBuf, time::Duration};

use crate::{
    backend::ConnectPolicy,
    codec::frame::MAX_PAYLOAD_LEN,
    config::CliArgs,
    core::{
        engine::EngineConfig,
        error::ConfigError,
        types::{Capabilities, CommandGating, ProvisioningState},
    },
};

/// Longest redirect URL that fits the provisioned result frame
pub const MAX_REDIRECT_URL_LEN: usize = MAX_PAYLOAD_LEN - 1;

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct Settings {
    pub interface: String,
    pub device_name: String,
    pub enable_ble: bool,
    pub enable_unix_socket: bool,
    pub socket_path: PathBuf,
    pub socket_mode: u32,
    pub engine: EngineConfig,
    pub connect_policy: ConnectPolicy,
    pub identify_command: Option<String>,
}

impl TryFrom<CliArgs> for Settings {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if !args.enable_ble && !args.enable_unix_socket {
            return Err(ConfigError::NoTransport);
        }

        let socket_mode = u32::from_str_radix(&args.socket_mode, 8)
            .ok()
            .filter(|mode| *mode <= 0o777)
            .ok_or_else(|| ConfigError::InvalidSocketMode(args.socket_mode.clone()))?;

        if let Some(len) = args
            .redirect_url
            .as_ref()
            .map(String::len)
            .filter(|len| *len > MAX_REDIRECT_URL_LEN)
        {
            return Err(ConfigError::RedirectUrlTooLong {
                len,
                max: MAX_REDIRECT_URL_LEN,
            });
        }

        if args.connect_attempts == 0 {
            return Err(ConfigError::NoConnectAttempts);
        }

        let engine = EngineConfig {
            initial_state: if args.require_authorization {
                ProvisioningState::AuthRequired
            } else {
                ProvisioningState::Authorized
            },
            capabilities: if args.no_identify {
                Capabilities::empty()
            } else {
                Capabilities::IDENTIFY
            },
            gating: if args.accept_unauthorized {
                CommandGating::Ungated
            } else {
                CommandGating::Gated
            },
            redirect_url: args.redirect_url,
        };

        Ok(Settings {
            interface: args.interface,
            device_name: args.device_name,
            enable_ble: args.enable_ble,
            enable_unix_socket: args.enable_unix_socket,
            socket_path: PathBuf::from(args.socket_path),
            socket_mode,
            engine,
            connect_policy: ConnectPolicy {
                max_attempts: args.connect_attempts,
                attempt_delay: Duration::from_millis(args.connect_attempt_delay_ms),
            },
            identify_command: args.identify_command,
        })
    }
}
