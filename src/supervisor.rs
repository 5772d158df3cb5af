//! Connection supervisor.
//!
//! ```text
//! Idle → Connecting → Connected → Authenticating → Welcomed → Active
//!            ▲                                                   │
//!            │                                                   ▼
//!       Reconnecting ◄──── reconnect enabled ──── Disconnected ──► Terminated
//! ```
//!
//! One supervisor task runs per session. It owns the socket and the read
//! loop, and spawns the drain loop and the keepalive for each connection.
//! Both hang off a per-connection child of the shutdown token, so every
//! way out of the read loop goes through the same teardown.

use std::sync::Arc;

use driftwood_proto::Message;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, warn};

use crate::error::SessionError;
use crate::outbox;
use crate::replies::SessionEvent;
use crate::session::Session;
use crate::telemetry::spans;
use crate::transport;

/// Lifecycle of a session's link to its server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkState {
    /// Not started yet.
    Idle,
    Connecting,
    /// Socket open, registration not sent yet.
    Connected,
    /// `NICK`/`USER` sent, waiting for 001.
    Authenticating,
    Welcomed,
    /// Welcomed with keepalive running.
    Active,
    Disconnected,
    Reconnecting,
    /// Final: shut down, quit, or out of connect attempts.
    Terminated,
}

impl LinkState {
    pub fn is_terminal(self) -> bool {
        self == LinkState::Terminated
    }
}

/// Run a session until it terminates.
///
/// Cancelling `shutdown` tears the current connection down and ends in
/// [`LinkState::Terminated`].
pub async fn supervise(session: Arc<Session>, shutdown: CancellationToken) {
    let span = spans::session(session.name(), &session.config().address);
    run(session, shutdown).instrument(span).await
}

async fn run(session: Arc<Session>, shutdown: CancellationToken) {
    loop {
        session.set_link(LinkState::Connecting);
        let Some((stream, attempt)) = connect(&session, &shutdown).await else {
            session.set_link(LinkState::Terminated);
            return;
        };
        session.set_link(LinkState::Connected);

        let span = spans::connection(session.name(), attempt);
        let end = run_connection(&session, stream, &shutdown)
            .instrument(span)
            .await;
        match &end {
            Ok(()) => info!("connection closed"),
            Err(e) => warn!(error = %e, code = e.error_code(), "connection ended"),
        }

        session.set_link(LinkState::Disconnected);
        session.reset_connection();

        if shutdown.is_cancelled() || !session.reconnect_enabled() {
            session.set_link(LinkState::Terminated);
            return;
        }
        session.set_link(LinkState::Reconnecting);
    }
}

/// Connect with up to `max_reconnects` attempts and exponential backoff.
///
/// Returns `None` on shutdown, once reconnection is disabled, or once
/// attempts are exhausted; exhaustion also disables reconnection for good.
async fn connect(session: &Session, shutdown: &CancellationToken) -> Option<(TcpStream, u32)> {
    let config = session.config();

    for attempt in 1..=config.max_reconnects {
        if attempt > 1 && !session.reconnect_enabled() {
            info!(attempt, "reconnection disabled, giving up");
            return None;
        }
        info!(attempt, address = %config.address, port = config.port, "connecting");
        let result = tokio::select! {
            biased;
            _ = shutdown.cancelled() => return None,
            result = transport::connect(&config.address, config.port, config.connect_timeout()) => result,
        };

        match result {
            Ok(stream) => return Some((stream, attempt)),
            Err(e) => warn!(
                attempt,
                max_attempts = config.max_reconnects,
                error = %e,
                code = e.error_code(),
                "connect attempt failed"
            ),
        }

        if attempt < config.max_reconnects {
            let delay = config.reconnect_delay(attempt);
            debug!(?delay, "backing off");
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => return None,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    error!(attempts = config.max_reconnects, "connect attempts exhausted, giving up");
    session.disable_reconnect();
    None
}

/// Drive one connection from registration until it ends.
///
/// `Ok(())` means the connection was cancelled; every other way out is an
/// error.
async fn run_connection(
    session: &Arc<Session>,
    stream: TcpStream,
    shutdown: &CancellationToken,
) -> Result<(), SessionError> {
    session.mark_connected();
    let (mut reader, writer) = transport::framed(stream, session.config())?;
    let rx = session.outbox.take_receiver().ok_or(SessionError::QueueTaken)?;

    let cancel = shutdown.child_token();
    let mut drain = tokio::spawn(outbox::drain(
        rx,
        writer,
        session.config().throttle(),
        cancel.clone(),
    ));
    let mut keepalive: Option<JoinHandle<()>> = None;

    session.set_link(LinkState::Authenticating);
    session.register();

    let idle = session.config().read_timeout();
    let result = loop {
        let line = tokio::select! {
            biased;
            _ = cancel.cancelled() => break Ok(()),
            joined = &mut drain => break match joined {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e),
                Err(e) => Err(e.into()),
            },
            line = transport::read_line(&mut reader, idle) => line,
        };

        let line = match line {
            Ok(line) => line,
            Err(e) => break Err(e),
        };

        for event in session.handle_line(&line) {
            if matches!(event, SessionEvent::Welcomed) && keepalive.is_none() {
                session.set_link(LinkState::Welcomed);
                keepalive = Some(spawn_keepalive(Arc::clone(session), cancel.clone()));
                session.set_link(LinkState::Active);
            }
        }
    };

    cancel.cancel();
    if !drain.is_finished() {
        if let Ok(Err(e)) = drain.await {
            debug!(error = %e, "drain loop failed during teardown");
        }
    }
    if let Some(keepalive) = keepalive {
        let _ = keepalive.await;
    }
    result
}

/// Send `PING :<server host>` every keepalive interval until cancelled.
fn spawn_keepalive(session: Arc<Session>, cancel: CancellationToken) -> JoinHandle<()> {
    let period = session.config().keepalive_interval();
    tokio::spawn(
        async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                let host = session
                    .state()
                    .server_host
                    .clone()
                    .unwrap_or_else(|| session.config().address.clone());
                session.write_quiet(&Message::ping(host).to_wire());
            }
        }
        .in_current_span(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::NoopDispatcher;
    use crate::config::NetworkConfig;
    use std::time::Duration;

    #[tokio::test]
    async fn test_exhausted_attempts_terminate_and_disable_reconnect() {
        // Bind and drop to get a port nobody listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut config = NetworkConfig::new("127.0.0.1", "drift");
        config.port = port;
        config.max_reconnects = 2;
        config.reconnect_delay = 0.01;
        config.connect_timeout = 0.5;
        let session = Arc::new(Session::new("test", config, Arc::new(NoopDispatcher)));

        tokio::time::timeout(
            Duration::from_secs(5),
            supervise(Arc::clone(&session), CancellationToken::new()),
        )
        .await
        .unwrap();

        assert_eq!(session.link_state(), LinkState::Terminated);
        assert!(!session.reconnect_enabled());
    }

    #[tokio::test]
    async fn test_quit_during_backoff_stops_attempts() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut config = NetworkConfig::new("127.0.0.1", "drift");
        config.port = port;
        config.max_reconnects = 10;
        config.reconnect_delay = 0.2;
        config.connect_timeout = 0.5;
        let session = Arc::new(Session::new("test", config, Arc::new(NoopDispatcher)));

        let task = tokio::spawn(supervise(Arc::clone(&session), CancellationToken::new()));
        tokio::time::sleep(Duration::from_millis(50)).await;
        session.quit(None);

        // Full backoff would take well over a minute.
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("supervisor stops after the pending backoff")
            .unwrap();
        assert_eq!(session.link_state(), LinkState::Terminated);
    }

    #[tokio::test]
    async fn test_shutdown_before_connect_terminates() {
        let session = Arc::new(Session::new(
            "test",
            NetworkConfig::new("127.0.0.1", "drift"),
            Arc::new(NoopDispatcher),
        ));
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        supervise(Arc::clone(&session), shutdown).await;
        assert_eq!(session.link_state(), LinkState::Terminated);
    }
}
