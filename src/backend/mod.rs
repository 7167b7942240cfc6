//! Wi-Fi and identify backends

pub mod connector;
pub mod identify;
pub mod wifi_ctrl_backend;

#[cfg(test)]
pub mod mock_backend;

pub use connector::{ConnectPolicy, WifiConnector};
pub use identify::{HostIdentify, IdentifyHandler};
pub use wifi_ctrl_backend::WifiCtrlBackend;

#[cfg(test)]
pub use mock_backend::{MockIdentifyHandler, MockWifiConnector};
