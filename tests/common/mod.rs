//! Integration test common infrastructure.
//!
//! Provides an in-process fake IRC server, a handle on each connection the
//! session makes to it, and helpers for waiting on session state.

pub mod client;
pub mod server;

#[allow(unused_imports)]
pub use client::TestClient;
#[allow(unused_imports)]
pub use server::TestServer;

use std::sync::Arc;
use std::time::Duration;

use driftwood::{LinkState, Session, supervise};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Default wait for anything a test expects to happen.
pub const WAIT: Duration = Duration::from_secs(5);

/// A session running under its supervisor.
#[allow(dead_code)]
pub struct Running {
    pub session: Arc<Session>,
    pub shutdown: CancellationToken,
    pub handle: JoinHandle<()>,
}

#[allow(dead_code)]
impl Running {
    pub fn start(session: Session) -> Self {
        let session = Arc::new(session);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(supervise(Arc::clone(&session), shutdown.clone()));
        Self {
            session,
            shutdown,
            handle,
        }
    }

    /// Wait until the supervisor task returns.
    pub async fn finished(self) -> anyhow::Result<Arc<Session>> {
        tokio::time::timeout(WAIT, self.handle).await??;
        Ok(self.session)
    }

    /// Cancel the session and wait for it to terminate.
    pub async fn stop(self) -> anyhow::Result<Arc<Session>> {
        self.shutdown.cancel();
        self.finished().await
    }
}

/// Wait until the session's link reaches `target`.
#[allow(dead_code)]
pub async fn wait_for_link(session: &Session, target: LinkState) -> anyhow::Result<()> {
    let mut rx = session.subscribe();
    tokio::time::timeout(WAIT, async {
        loop {
            if *rx.borrow_and_update() == target {
                return Ok(());
            }
            rx.changed().await?;
        }
    })
    .await?
}
