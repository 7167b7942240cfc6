//! Command-line argument parsing

use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[clap(name = "improv-provisioning", version, author)]
#[clap(about = "Improv Wi-Fi provisioning service with BLE and Unix socket support")]
pub struct CliArgs {
    /// Wireless network interface name
    #[clap(short, long, default_value = "wlan0")]
    pub interface: String,

    /// Name advertised over BLE
    #[clap(short = 'n', long, default_value = "improv-device")]
    pub device_name: String,

    /// Enable BLE transport
    #[clap(long, action = ArgAction::Set, default_value_t = true)]
    pub enable_ble: bool,

    /// Enable Unix socket control channel
    #[clap(long)]
    pub enable_unix_socket: bool,

    /// Path for Unix socket
    #[clap(long, default_value = "/run/improv-provisioning.sock")]
    pub socket_path: String,

    /// Socket file permissions (octal, e.g., 660)
    #[clap(long, default_value = "660")]
    pub socket_mode: String,

    /// Start in AuthRequired; SIGUSR1 or the control channel authorizes
    #[clap(long)]
    pub require_authorization: bool,

    /// Accept credentials while authorization is still required
    #[clap(long)]
    pub accept_unauthorized: bool,

    /// Do not advertise the identify capability
    #[clap(long)]
    pub no_identify: bool,

    /// Command run on identify requests, e.g. "gpio-blink 17"
    #[clap(long)]
    pub identify_command: Option<String>,

    /// Connection checks before giving up
    #[clap(long, default_value_t = 20)]
    pub connect_attempts: u8,

    /// Delay between connection checks in milliseconds
    #[clap(long, default_value_t = 500)]
    pub connect_attempt_delay_ms: u64,

    /// URL handed to the client after provisioning
    #[clap(long)]
    pub redirect_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::try_parse_from(["improv-provisioning"]).unwrap();

        assert_eq!(args.interface, "wlan0");
        assert!(args.enable_ble);
        assert!(!args.enable_unix_socket);
        assert_eq!(args.socket_mode, "660");
        assert!(!args.require_authorization);
        assert_eq!(args.connect_attempts, 20);
        assert_eq!(args.connect_attempt_delay_ms, 500);
        assert!(args.redirect_url.is_none());
    }

    #[test]
    fn test_disable_ble() {
        let args = CliArgs::try_parse_from([
            "improv-provisioning",
            "--enable-ble",
            "false",
            "--enable-unix-socket",
        ])
        .unwrap();

        assert!(!args.enable_ble);
        assert!(args.enable_unix_socket);
    }

    #[test]
    fn test_invalid_attempts_rejected_by_parser() {
        assert!(
            CliArgs::try_parse_from(["improv-provisioning", "--connect-attempts", "300"]).is_err()
        );
    }
}
