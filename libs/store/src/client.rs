//! TCP transport for the time-series engine.

use crate::{read_reply, Command, CommandRunner, Reply, StoreError};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufStream};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::debug;

/// Connection options for the store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub addr: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            addr: "localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(3),
            write_timeout: Duration::from_secs(3),
        }
    }
}

/// A store client over a single engine connection.
///
/// Commands are serialized through an async mutex, so one client can be
/// shared by independent callers; each call is a full request/reply round
/// trip with no state left behind.
pub struct StoreClient {
    conn: Mutex<BufStream<TcpStream>>,
    config: StoreConfig,
}

impl StoreClient {
    /// Connect to the engine at `config.addr`.
    pub async fn connect(config: StoreConfig) -> Result<Self, StoreError> {
        let stream = timeout(config.connect_timeout, TcpStream::connect(&config.addr))
            .await
            .map_err(|_| StoreError::Timeout {
                operation: "connect",
            })??;
        stream.set_nodelay(true)?;
        debug!(addr = %config.addr, "connected to time-series store");
        Ok(Self {
            conn: Mutex::new(BufStream::new(stream)),
            config,
        })
    }
}

#[async_trait]
impl CommandRunner for StoreClient {
    async fn run(&self, command: Command) -> Result<Reply, StoreError> {
        let mut conn = self.conn.lock().await;

        let frame = command.encode();
        timeout(self.config.write_timeout, async {
            conn.write_all(&frame).await?;
            conn.flush().await
        })
        .await
        .map_err(|_| StoreError::Timeout { operation: "write" })??;

        let reply = timeout(self.config.read_timeout, read_reply(&mut *conn))
            .await
            .map_err(|_| StoreError::Timeout { operation: "read" })??;

        match reply {
            Reply::Error(message) => Err(StoreError::Command {
                command: command.name(),
                message,
            }),
            other => Ok(other),
        }
    }
}
