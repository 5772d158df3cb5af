//! Tracing spans and timing for sessions and commands.

use std::time::Instant;

use tracing::debug;

/// Guard timing one command invocation.
///
/// Logs the elapsed time at debug level when dropped.
pub struct CommandTimer {
    command: String,
    start: Instant,
}

impl CommandTimer {
    /// Start timing a command.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        debug!(command = %self.command, elapsed_ms, "command finished");
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, info_span};

    /// Span wrapping a session's supervisor for its whole life.
    pub fn session(network: &str, address: &str) -> Span {
        info_span!("session", network = %network, address = %address)
    }

    /// Span for one connection attempt and the read loop that follows.
    pub fn connection(network: &str, attempt: u32) -> Span {
        info_span!("connection", network = %network, attempt)
    }

    /// Create a span for a command execution.
    pub fn command(name: &str, source: &str, target: Option<&str>) -> Span {
        if let Some(target) = target {
            info_span!("command", name = %name, source = %source, target = %target)
        } else {
            info_span!("command", name = %name, source = %source)
        }
    }
}
