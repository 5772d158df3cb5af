//! driftwood - a long-lived IRC client session engine.
//!
//! One [`Session`] per network keeps the derived state of the connection
//! (users, channels, memberships, topics, server capabilities), applies
//! every inbound line through a table of reply handlers, and exposes
//! outbound helpers, waiters and callbacks to the code that drives it.
//! [`supervise`] owns the connection lifecycle: connect with backoff,
//! registration, keepalive, teardown and reconnect.
//!
//! ```no_run
//! use std::sync::Arc;
//! use driftwood::{NetworkConfig, NoopDispatcher, Session, supervise};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() {
//! let config = NetworkConfig::new("irc.libera.chat", "driftwood");
//! let session = Arc::new(Session::new("Libera", config, Arc::new(NoopDispatcher)));
//! supervise(session, CancellationToken::new()).await;
//! # }
//! ```

pub mod bot;
pub mod callbacks;
pub mod commands;
pub mod config;
pub mod error;
pub mod outbox;
pub mod replies;
pub mod session;
pub mod state;
pub mod supervisor;
pub mod telemetry;
pub mod transport;

pub use bot::Bot;
pub use callbacks::{CallbackRegistry, CallbackToken, Waiter};
pub use commands::{
    Command, CommandDispatcher, CommandRouter, IncomingMessage, Invocation, NoopDispatcher,
};
pub use config::{BotConfig, Config, ConfigError, NetworkConfig, ValidationError};
pub use error::{HandlerError, SessionError};
pub use replies::SessionEvent;
pub use session::Session;
pub use state::{Access, Channel, Sender, SessionState, User};
pub use supervisor::{LinkState, supervise};

pub use driftwood_proto as proto;
