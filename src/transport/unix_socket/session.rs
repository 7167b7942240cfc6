//! Unix socket session management

use serde::Serialize;
use std::sync::Arc;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::unix::{OwnedReadHalf, OwnedWriteHalf},
    sync::Mutex,
};

use crate::{
    core::{error::TransportResult, types::SessionId},
    protocol::{JsonRpcNotification, JsonRpcResponse},
};

/// Write side of a connected control client
///
/// Cloned between the request loop and the notification forwarder; writes
/// are serialized so lines never interleave.
#[derive(Debug, Clone)]
pub struct UnixSocketSession {
    id: SessionId,
    writer: Arc<Mutex<OwnedWriteHalf>>,
}

impl UnixSocketSession {
    pub fn new(writer: OwnedWriteHalf) -> Self {
        Self {
            id: SessionId::new(),
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub async fn send_response(&self, response: &JsonRpcResponse) -> TransportResult<()> {
        self.send_line(response).await
    }

    pub async fn send_notification(
        &self,
        notification: &JsonRpcNotification,
    ) -> TransportResult<()> {
        self.send_line(notification).await
    }

    async fn send_line<T: Serialize>(&self, message: &T) -> TransportResult<()> {
        let mut json = serde_json::to_vec(message)?;
        json.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(&json).await?;
        writer.flush().await?;

        Ok(())
    }
}

/// Line reader for incoming requests
pub struct SessionReader {
    reader: BufReader<OwnedReadHalf>,
}

impl SessionReader {
    pub fn new(reader: OwnedReadHalf) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Read the next line, `None` once the peer closed the connection
    pub async fn read_line(&mut self) -> std::io::Result<Option<String>> {
        let mut line = String::new();
        let bytes_read = self.reader.read_line(&mut line).await?;

        if bytes_read == 0 {
            return Ok(None);
        }

        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);

        Ok(Some(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::types::ErrorCode,
        protocol::{ErrorChangedParams, Notification},
    };
    use tokio::net::UnixStream;

    #[tokio::test]
    async fn test_session_ids_are_unique() {
        let (client, server) = UnixStream::pair().unwrap();
        let first = UnixSocketSession::new(server.into_split().1);
        let second = UnixSocketSession::new(client.into_split().1);

        assert_ne!(first.id(), second.id());
    }

    #[tokio::test]
    async fn test_notification_is_one_line() {
        let (client, server) = UnixStream::pair().unwrap();
        let session = UnixSocketSession::new(server.into_split().1);
        let mut reader = SessionReader::new(client.into_split().0);

        let notification =
            JsonRpcNotification::from(Notification::ErrorChanged(ErrorChangedParams {
                error: ErrorCode::BadPacket,
            }));
        session.send_notification(&notification).await.unwrap();

        let line = reader.read_line().await.unwrap().unwrap();
        let received: JsonRpcNotification = serde_json::from_str(&line).unwrap();
        assert_eq!(received, notification);
    }

    #[tokio::test]
    async fn test_reader_strips_crlf() {
        let (client, server) = UnixStream::pair().unwrap();
        let mut reader = SessionReader::new(server.into_split().0);
        let (_client_read, mut client_write) = client.into_split();

        client_write.write_all(b"{\"a\":1}\r\n").await.unwrap();
        client_write.flush().await.unwrap();

        assert_eq!(reader.read_line().await.unwrap().unwrap(), "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_session_reader_eof() {
        let (client, server) = UnixStream::pair().unwrap();
        let (read_half, _) = server.into_split();
        let mut reader = SessionReader::new(read_half);

        drop(client);

        let line = reader.read_line().await.unwrap();
        assert!(line.is_none());
    }
}
