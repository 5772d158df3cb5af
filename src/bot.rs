//! Multi-network container: one session and supervisor task per
//! configured network, sharing a shutdown token.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::commands::CommandDispatcher;
use crate::config::Config;
use crate::session::Session;
use crate::supervisor::supervise;

pub struct Bot {
    sessions: Vec<Arc<Session>>,
    shutdown: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Bot {
    /// Create a session per network. Nothing connects until
    /// [`Bot::spawn`].
    pub fn new(config: &Config, dispatcher: Arc<dyn CommandDispatcher>) -> Self {
        let sessions = config
            .networks
            .iter()
            .map(|(name, network)| {
                Arc::new(Session::new(
                    name.as_str(),
                    network.clone(),
                    Arc::clone(&dispatcher),
                ))
            })
            .collect();
        Self {
            sessions,
            shutdown: CancellationToken::new(),
            handles: Vec::new(),
        }
    }

    pub fn sessions(&self) -> &[Arc<Session>] {
        &self.sessions
    }

    pub fn session(&self, name: &str) -> Option<&Arc<Session>> {
        self.sessions.iter().find(|s| s.name() == name)
    }

    /// Token cancelled on shutdown; cancelling it stops every session.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Start a supervisor task per session.
    pub fn spawn(&mut self) {
        for session in &self.sessions {
            info!(network = %session.name(), "starting session");
            self.handles
                .push(tokio::spawn(supervise(Arc::clone(session), self.shutdown.clone())));
        }
    }

    /// Wait until every session has terminated.
    pub async fn join(&mut self) {
        while let Some(handle) = self.handles.last_mut() {
            if let Err(e) = handle.await {
                warn!(error = %e, "session task failed");
            }
            self.handles.pop();
        }
    }

    /// Quit every session, give them `grace` to leave cleanly, then
    /// cancel whatever is still running.
    pub async fn shutdown(&mut self, grace: Duration) {
        for session in &self.sessions {
            session.quit(None);
        }
        if tokio::time::timeout(grace, self.join()).await.is_err() {
            warn!(?grace, "sessions still running after grace period, cancelling");
        }
        self.shutdown.cancel();
        self.join().await;
    }
}
