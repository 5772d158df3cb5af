//! Fake IRC server.
//!
//! Binds an ephemeral local port and hands out one [`TestClient`] per
//! connection the session makes.

use std::time::Duration;

use driftwood::NetworkConfig;
use tokio::net::TcpListener;
use tokio::time::timeout;

use super::TestClient;

/// Name the fake server uses as its prefix.
pub const SERVER_NAME: &str = "test.server";

/// A listening fake server.
pub struct TestServer {
    listener: TcpListener,
    port: u16,
}

#[allow(dead_code)]
impl TestServer {
    /// Bind a fresh server on an ephemeral port.
    pub async fn spawn() -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        Ok(Self { listener, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Network settings pointing at this server, tuned for fast tests.
    pub fn network(&self, nickname: &str) -> NetworkConfig {
        let mut config = NetworkConfig::new("127.0.0.1", nickname);
        config.port = self.port;
        config.throttle = 0.0;
        config.connect_timeout = 2.0;
        config.reconnect_delay = 0.05;
        config.max_reconnects = 3;
        config
    }

    /// Accept the next connection from the session.
    pub async fn accept(&self) -> anyhow::Result<TestClient> {
        self.accept_timeout(Duration::from_secs(5)).await
    }

    pub async fn accept_timeout(&self, dur: Duration) -> anyhow::Result<TestClient> {
        let (stream, _) = timeout(dur, self.listener.accept()).await??;
        Ok(TestClient::new(stream))
    }
}
