//! Error types for the protocol crate.
//!
//! This module defines error types for line framing failures and
//! message parsing failures.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Top-level protocol errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Inbound line exceeded the maximum allowed length.
    #[error("line too long: {actual} bytes (limit: {limit})")]
    LineTooLong {
        /// Bytes buffered without finding a terminator.
        actual: usize,
        /// Maximum allowed length.
        limit: usize,
    },

    /// A line ended with a bare `\n` instead of `\r\n`.
    #[error("line not terminated by CRLF")]
    BareLineFeed,

    /// The stream ended in the middle of a line.
    #[error("stream closed with {0} bytes of unterminated line")]
    PartialLine(usize),

    /// An encoding label was not recognised.
    #[error("unknown encoding: {0}")]
    UnknownEncoding(String),

    /// Failed to parse an IRC message.
    #[error("invalid message: {string}")]
    InvalidMessage {
        /// The invalid message string.
        string: String,
        /// The underlying cause.
        #[source]
        cause: MessageParseError,
    },
}

impl ProtocolError {
    /// Whether this error means the remote end is gone or unusable.
    ///
    /// Framing errors are never recovered from: a line that cannot be
    /// framed leaves the byte stream in an unknown position.
    pub fn is_connection_lost(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::LineTooLong { .. } | Self::BareLineFeed | Self::PartialLine(_)
        )
    }
}

/// Errors encountered while parsing a single message.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum MessageParseError {
    /// The message was empty.
    #[error("empty message")]
    EmptyMessage,

    /// A prefix was present but no verb followed it.
    #[error("prefix present but missing verb")]
    MissingVerb,

    /// The prefix was malformed.
    #[error("invalid prefix: {0}")]
    InvalidPrefix(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_lost_classification() {
        assert!(ProtocolError::BareLineFeed.is_connection_lost());
        assert!(ProtocolError::PartialLine(3).is_connection_lost());
        assert!(!ProtocolError::UnknownEncoding("klingon".into()).is_connection_lost());
    }

    #[test]
    fn test_error_display() {
        let err = ProtocolError::LineTooLong {
            actual: 9000,
            limit: 8191,
        };
        assert_eq!(err.to_string(), "line too long: 9000 bytes (limit: 8191)");

        let err = ProtocolError::InvalidMessage {
            string: ":nick".into(),
            cause: MessageParseError::MissingVerb,
        };
        assert_eq!(err.to_string(), "invalid message: :nick");
        assert!(std::error::Error::source(&err).is_some());
    }
}
