//! Unified error handling for driftwood.
//!
//! Transport failures ([`SessionError`]) end a connection and are handled
//! by the supervisor. Handler failures ([`HandlerError`]) are logged and
//! never stop the read loop.

use std::time::Duration;

use driftwood_proto::ProtocolError;
use thiserror::Error;

// ============================================================================
// Session Errors (connection lifecycle)
// ============================================================================

/// Errors that end (or prevent) a connection.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("connect to {address} timed out after {timeout:?}")]
    ConnectTimeout { address: String, timeout: Duration },

    #[error("connect to {address} failed: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// EOF, a partial or oversized line, a bare LF, or an I/O failure.
    #[error("connection lost: {0}")]
    ConnectionLost(#[from] ProtocolError),

    #[error("nothing received for {0:?}")]
    ReadTimeout(Duration),

    #[error("write failed: {0}")]
    WriteFailed(#[source] ProtocolError),

    #[error("invalid encoding: {0}")]
    Encoding(#[source] ProtocolError),

    #[error("outbound queue already consumed")]
    QueueTaken,

    #[error("task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl SessionError {
    /// The remote end closed the stream between lines.
    pub fn closed() -> Self {
        Self::ConnectionLost(ProtocolError::Io(std::io::ErrorKind::UnexpectedEof.into()))
    }

    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ConnectTimeout { .. } => "connect_timeout",
            Self::Connect { .. } => "connect_failed",
            Self::ConnectionLost(_) => "connection_lost",
            Self::ReadTimeout(_) => "read_timeout",
            Self::WriteFailed(_) => "write_failed",
            Self::Encoding(_) => "encoding",
            Self::QueueTaken => "queue_taken",
            Self::Task(_) => "task_failed",
        }
    }
}

// ============================================================================
// Handler Errors (reply table and callbacks)
// ============================================================================

/// Failures of reply handlers and callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error("{0}: not enough parameters")]
    NeedMoreParams(String),

    #[error("{0}: line has no user prefix")]
    MissingSender(String),

    #[error("no such channel: {0}")]
    NoSuchChannel(String),

    #[error("no such user: {0}")]
    NoSuchUser(String),

    #[error("callback failed: {0}")]
    Callback(String),

    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl HandlerError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NeedMoreParams(_) => "need_more_params",
            Self::MissingSender(_) => "missing_sender",
            Self::NoSuchChannel(_) => "no_such_channel",
            Self::NoSuchUser(_) => "no_such_user",
            Self::Callback(_) => "callback_failed",
            Self::Panicked(_) => "panicked",
        }
    }

    /// Build a [`HandlerError::Panicked`] from a caught panic payload.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let text = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self::Panicked(text)
    }
}

/// Result type for reply handlers.
pub type HandlerResult = Result<(), HandlerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_is_connection_lost() {
        let err = SessionError::closed();
        assert_eq!(err.error_code(), "connection_lost");
        assert!(err.to_string().starts_with("connection lost"));
    }

    #[test]
    fn test_panic_payloads() {
        let caught = std::panic::catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(HandlerError::from_panic(caught), HandlerError::Panicked("boom".into()));

        let caught = std::panic::catch_unwind(|| panic!("{} {}", "formatted", 1)).unwrap_err();
        assert_eq!(
            HandlerError::from_panic(caught),
            HandlerError::Panicked("formatted 1".into())
        );
    }
}
