//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Config struct definitions (Config, BotConfig, NetworkConfig)
//! - [`defaults`]: serde default values
//! - [`validation`]: startup checks

mod defaults;
mod types;
mod validation;

pub use defaults::MAX_RECONNECT_DELAY;
pub use types::{BotConfig, Config, ConfigError, NetworkConfig};
pub use validation::{ValidationError, validate};
