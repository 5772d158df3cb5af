//! Core configuration types and loading.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use super::defaults::*;
use crate::state::Access;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Settings shared by every session.
    #[serde(default)]
    pub bot: BotConfig,
    /// One entry per network, keyed by display name.
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Settings shared by every session.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Prefix that marks a channel or private message as a command.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            command_prefix: default_command_prefix(),
        }
    }
}

/// Per-network session parameters.
///
/// Timing fields are in seconds and may be fractional.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// Server hostname or IP address.
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Preferred nickname. Collisions before welcome append a counter.
    pub nickname: String,
    pub username: Option<String>,
    pub hostname: Option<String>,
    pub servername: Option<String>,
    pub realname: Option<String>,
    /// Channels joined once the server welcomes us.
    #[serde(default)]
    pub autojoin: Vec<String>,
    pub quit_message: Option<String>,
    /// `irc` (UTF-8 with Windows-1252 fallback) or any WHATWG label.
    #[serde(default = "default_in_encoding")]
    pub in_encoding: String,
    #[serde(default = "default_out_encoding")]
    pub out_encoding: String,
    #[serde(default = "default_true")]
    pub reconnect: bool,
    /// Connect attempts per connecting phase.
    #[serde(default = "default_max_reconnects")]
    pub max_reconnects: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: f64,
    #[serde(default = "default_keepalive_interval")]
    pub keepalive_interval: f64,
    #[serde(default = "default_throttle")]
    pub throttle: f64,
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay: f64,
    /// Access level granted per sender host.
    #[serde(default)]
    pub privileges: HashMap<String, Access>,
}

impl NetworkConfig {
    /// Build a configuration with defaults for everything but the
    /// server address and nickname.
    pub fn new(address: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            port: default_port(),
            nickname: nickname.into(),
            username: None,
            hostname: None,
            servername: None,
            realname: None,
            autojoin: Vec::new(),
            quit_message: None,
            in_encoding: default_in_encoding(),
            out_encoding: default_out_encoding(),
            reconnect: true,
            max_reconnects: default_max_reconnects(),
            connect_timeout: default_connect_timeout(),
            keepalive_interval: default_keepalive_interval(),
            throttle: default_throttle(),
            reconnect_delay: default_reconnect_delay(),
            privileges: HashMap::new(),
        }
    }

    /// Ident sent in `USER`: configured, or the ASCII letters of the
    /// nickname in lowercase.
    pub fn username(&self) -> String {
        if let Some(username) = self.username.as_deref().filter(|u| !u.is_empty()) {
            return username.to_string();
        }
        let derived: String = self
            .nickname
            .chars()
            .filter(char::is_ascii_alphabetic)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        if derived.is_empty() {
            "driftwood".to_string()
        } else {
            derived
        }
    }

    pub fn hostname(&self) -> &str {
        self.hostname.as_deref().unwrap_or("-")
    }

    pub fn servername(&self) -> &str {
        self.servername.as_deref().unwrap_or("-")
    }

    pub fn realname(&self) -> &str {
        self.realname.as_deref().unwrap_or(&self.nickname)
    }

    pub fn quit_message(&self) -> String {
        self.quit_message
            .clone()
            .unwrap_or_else(|| format!("{} quitting...", self.nickname))
    }

    pub fn connect_timeout(&self) -> Duration {
        seconds(self.connect_timeout)
    }

    pub fn keepalive_interval(&self) -> Duration {
        seconds(self.keepalive_interval)
    }

    /// Silence tolerated on the read side before the link is declared dead.
    pub fn read_timeout(&self) -> Duration {
        self.keepalive_interval().saturating_mul(3)
    }

    pub fn throttle(&self) -> Duration {
        seconds(self.throttle)
    }

    /// Backoff before connect attempt `attempt + 1` (attempts count from 1).
    pub fn reconnect_delay(&self, attempt: u32) -> Duration {
        let factor = 2f64.powi(attempt.saturating_sub(1).min(16) as i32);
        seconds((self.reconnect_delay * factor).min(MAX_RECONNECT_DELAY))
    }

    /// Access level for a sender host.
    pub fn access_for(&self, host: Option<&str>) -> Access {
        host.and_then(|h| self.privileges.get(h))
            .copied()
            .unwrap_or_default()
    }
}

/// Convert validated seconds into a duration; invalid values become zero.
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}
