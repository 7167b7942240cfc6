//! Unix socket server implementation

use std::{fs::Permissions, os::unix::fs::PermissionsExt, path::Path};
use tokio::{
    fs,
    net::{UnixListener, UnixStream},
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::{
    protocol::{JsonRpcNotification, Notification},
    transport::{
        hub::{NotificationHub, TransportEvent},
        unix_socket::{
            handler::RequestHandler,
            session::{SessionReader, UnixSocketSession},
        },
    },
};

/// Take a listener passed by the service manager (socket activation)
pub fn inherited_listener() -> std::io::Result<Option<UnixListener>> {
    let mut listenfd = listenfd::ListenFd::from_env();
    match listenfd.take_unix_listener(0)? {
        Some(listener) => {
            listener.set_nonblocking(true)?;
            Ok(Some(UnixListener::from_std(listener)?))
        }
        None => Ok(None),
    }
}

/// Bind a fresh listener, replacing a stale socket file
pub async fn bind_listener(socket_path: &Path, mode: u32) -> std::io::Result<UnixListener> {
    if fs::try_exists(socket_path).await? {
        fs::remove_file(socket_path).await?;
    }

    let listener = UnixListener::bind(socket_path)?;
    fs::set_permissions(socket_path, Permissions::from_mode(mode)).await?;
    Ok(listener)
}

/// Newline-delimited JSON-RPC control server
pub struct UnixSocketServer {
    handler: RequestHandler,
    hub: NotificationHub,
}

impl UnixSocketServer {
    pub fn new(handler: RequestHandler, hub: NotificationHub) -> Self {
        Self { handler, hub }
    }

    /// Accept clients until the listener fails
    pub async fn serve(&self, listener: UnixListener) -> std::io::Result<()> {
        info!("Unix socket server listening");

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let handler = self.handler.clone();
                    // Subscribe before any request is read so no event is missed
                    let events = self.hub.subscribe();
                    tokio::spawn(async move {
                        if let Err(e) = Self::handle_client(stream, handler, events).await {
                            error!("Error handling client: {}", e);
                        }
                    });
                }
                Err(e) => {
                    warn!("Error accepting connection: {}", e);
                }
            }
        }
    }

    async fn handle_client(
        stream: UnixStream,
        handler: RequestHandler,
        events: broadcast::Receiver<TransportEvent>,
    ) -> std::io::Result<()> {
        let (read_half, write_half) = stream.into_split();
        let session = UnixSocketSession::new(write_half);
        let mut reader = SessionReader::new(read_half);

        info!("New client connected: {}", session.id());
        let forwarder = Self::forward_notifications(session.clone(), events);

        while let Some(line) = reader.read_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let response = handler.handle_line(&line).await;
            if let Err(e) = session.send_response(&response).await {
                error!("Error sending response: {}", e);
                break;
            }
        }

        info!("Client disconnected: {}", session.id());
        forwarder.abort();
        Ok(())
    }

    fn forward_notifications(
        session: UnixSocketSession,
        mut events: broadcast::Receiver<TransportEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let event = match events.recv().await {
                    Ok(event) => event,
                    Err(RecvError::Lagged(n)) => {
                        warn!("Client {} missed {} notifications", session.id(), n);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };

                let Some(notification) = Notification::from_event(&event) else {
                    continue;
                };

                if let Err(e) = session
                    .send_notification(&JsonRpcNotification::from(notification))
                    .await
                {
                    debug!("Stopping notifications for {}: {}", session.id(), e);
                    break;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        backend::{MockIdentifyHandler, MockWifiConnector},
        core::{
            engine::{EngineConfig, ProvisioningEngine},
            service::ProvisioningService,
            types::ProvisioningState,
        },
        protocol::{JsonRpcResponse, RequestId, StateChangedParams},
    };
    use std::sync::Arc;
    use tempfile::tempdir;
    use tokio::{
        io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
        time::{Duration, timeout},
    };

    fn start_server(listener: UnixListener, initial_state: ProvisioningState) {
        let hub = NotificationHub::new(16);
        let engine = ProvisioningEngine::new(EngineConfig {
            initial_state,
            ..EngineConfig::default()
        })
        .unwrap();
        let (service, handle) = ProvisioningService::new(
            engine,
            Arc::new(MockWifiConnector::new()),
            Arc::new(MockIdentifyHandler::new()),
            Arc::new(hub.clone()),
        );
        tokio::spawn(service.run());

        let server = UnixSocketServer::new(RequestHandler::new(handle), hub);
        tokio::spawn(async move {
            server.serve(listener).await.ok();
        });
    }

    #[tokio::test]
    async fn test_bind_sets_mode_and_replaces_stale_socket() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("improv.sock");
        std::fs::write(&socket_path, b"stale").unwrap();

        let _listener = bind_listener(&socket_path, 0o660).await.unwrap();

        let mode = std::fs::metadata(&socket_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o660);
    }

    #[tokio::test]
    async fn test_request_and_notification() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("improv.sock");
        let listener = bind_listener(&socket_path, 0o600).await.unwrap();
        start_server(listener, ProvisioningState::AuthRequired);

        let client = UnixStream::connect(&socket_path).await.unwrap();
        let (read_half, mut write_half) = client.into_split();
        let mut lines = BufReader::new(read_half).lines();

        // Let the server subscribe this client before anything is published
        tokio::time::sleep(Duration::from_millis(50)).await;

        write_half
            .write_all(b"{\"jsonrpc\":\"2.0\",\"method\":\"authorize\",\"id\":1}\n")
            .await
            .unwrap();

        let mut saw_response = false;
        let mut saw_state = false;
        while !(saw_response && saw_state) {
            let line = timeout(Duration::from_secs(2), lines.next_line())
                .await
                .unwrap()
                .unwrap()
                .unwrap();

            if let Ok(response) = serde_json::from_str::<JsonRpcResponse>(&line) {
                assert_eq!(response.id, RequestId::Number(1));
                assert!(response.error.is_none());
                saw_response = true;
            } else {
                let notification: JsonRpcNotification = serde_json::from_str(&line).unwrap();
                if notification.notification
                    == Notification::StateChanged(StateChangedParams {
                        state: ProvisioningState::Authorized,
                    })
                {
                    saw_state = true;
                }
            }
        }
    }

    #[tokio::test]
    async fn test_parse_error_keeps_connection() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("improv.sock");
        let listener = bind_listener(&socket_path, 0o600).await.unwrap();
        start_server(listener, ProvisioningState::Authorized);

        let client = UnixStream::connect(&socket_path).await.unwrap();
        let (read_half, mut write_half) = client.into_split();
        let mut lines = BufReader::new(read_half).lines();

        write_half.write_all(b"garbage\n").await.unwrap();
        write_half
            .write_all(b"{\"jsonrpc\":\"2.0\",\"method\":\"get_status\",\"id\":2}\n")
            .await
            .unwrap();

        let mut ids = Vec::new();
        while ids.len() < 2 {
            let line = timeout(Duration::from_secs(2), lines.next_line())
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            if let Ok(response) = serde_json::from_str::<JsonRpcResponse>(&line) {
                ids.push(response.id);
            }
        }

        assert_eq!(ids, vec![RequestId::Null, RequestId::Number(2)]);
    }
}
