//! Identify handling

use tokio::process::Command;
use tracing::{debug, info, warn};
use trait_variant::make;

/// Makes the device noticeable to a nearby user
#[make(Send)]
pub trait IdentifyHandler: Sync + 'static {
    /// Fire-and-forget; must not wait for the identify signal to finish
    async fn identify(&self);
}

/// Logs identify requests and optionally runs a host command
#[derive(Debug, Clone)]
pub struct HostIdentify {
    device_name: String,
    command: Option<Vec<String>>,
}

impl HostIdentify {
    pub fn new(device_name: String) -> Self {
        Self {
            device_name,
            command: None,
        }
    }

    /// Run `command_line` (split on whitespace) on every identify request
    pub fn with_command(mut self, command_line: &str) -> Self {
        let parts: Vec<String> = command_line.split_whitespace().map(str::to_string).collect();
        self.command = (!parts.is_empty()).then_some(parts);
        self
    }

    pub fn command(&self) -> Option<&[String]> {
        self.command.as_deref()
    }
}

impl IdentifyHandler for HostIdentify {
    async fn identify(&self) {
        info!("Identify requested for '{}'", self.device_name);

        let Some((program, args)) = self.command.as_ref().and_then(|c| c.split_first()) else {
            return;
        };

        match Command::new(program).args(args).spawn() {
            Ok(mut child) => {
                let program = program.clone();
                tokio::spawn(async move {
                    match child.wait().await {
                        Ok(status) => debug!("Identify command '{}' exited: {}", program, status),
                        Err(e) => warn!("Identify command '{}' failed: {}", program, e),
                    }
                });
            }
            Err(e) => warn!("Failed to run identify command '{}': {}", program, e),
        }
    }
}
