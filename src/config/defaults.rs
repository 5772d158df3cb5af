//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

// =============================================================================
// Bot Defaults
// =============================================================================

pub fn default_command_prefix() -> String {
    "%".to_string()
}

// =============================================================================
// Connection Defaults
// =============================================================================

pub fn default_port() -> u16 {
    6667
}

pub fn default_max_reconnects() -> u32 {
    5
}

/// Seconds allowed for one connect attempt.
pub fn default_connect_timeout() -> f64 {
    30.0
}

/// Seconds between keepalive pings. Three intervals without input
/// count as a dead link.
pub fn default_keepalive_interval() -> f64 {
    60.0
}

/// Seconds between consecutive outbound lines.
pub fn default_throttle() -> f64 {
    1.0
}

/// Seconds before the second connect attempt; doubled per failure.
pub fn default_reconnect_delay() -> f64 {
    1.0
}

/// Upper bound for the reconnect backoff, in seconds.
pub const MAX_RECONNECT_DELAY: f64 = 60.0;

// =============================================================================
// Encoding Defaults
// =============================================================================

pub fn default_in_encoding() -> String {
    driftwood_proto::line::PROTOCOL_ENCODING.to_string()
}

pub fn default_out_encoding() -> String {
    "utf-8".to_string()
}
