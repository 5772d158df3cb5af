//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::{Config, NetworkConfig};
use driftwood_proto::line::{InboundEncoding, charset};
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("at least one [networks.<name>] table is required")]
    NoNetworks,
    #[error("networks.{0}.address is required")]
    MissingAddress(String),
    #[error("networks.{0}.nickname is required")]
    MissingNickname(String),
    #[error("networks.{network}.{field}: unknown encoding '{label}'")]
    UnknownEncoding {
        network: String,
        field: &'static str,
        label: String,
    },
    #[error("networks.{0}.max_reconnects must be at least 1")]
    ZeroMaxReconnects(String),
    #[error("networks.{0}.keepalive_interval must be positive")]
    InvalidKeepalive(String),
    #[error("networks.{network}.{field} must be a finite, non-negative number of seconds")]
    InvalidDuration {
        network: String,
        field: &'static str,
    },
    #[error("bot.command_prefix must not be empty")]
    EmptyCommandPrefix,
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.bot.command_prefix.is_empty() {
        errors.push(ValidationError::EmptyCommandPrefix);
    }
    if config.networks.is_empty() {
        errors.push(ValidationError::NoNetworks);
    }
    for (name, network) in &config.networks {
        validate_network(name, network, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_network(name: &str, network: &NetworkConfig, errors: &mut Vec<ValidationError>) {
    if network.address.trim().is_empty() {
        errors.push(ValidationError::MissingAddress(name.to_string()));
    }
    if network.nickname.trim().is_empty() {
        errors.push(ValidationError::MissingNickname(name.to_string()));
    }

    if InboundEncoding::for_label(&network.in_encoding).is_err() {
        errors.push(ValidationError::UnknownEncoding {
            network: name.to_string(),
            field: "in_encoding",
            label: network.in_encoding.clone(),
        });
    }
    if charset(&network.out_encoding).is_err() {
        errors.push(ValidationError::UnknownEncoding {
            network: name.to_string(),
            field: "out_encoding",
            label: network.out_encoding.clone(),
        });
    }

    if network.max_reconnects == 0 {
        errors.push(ValidationError::ZeroMaxReconnects(name.to_string()));
    }
    if !(network.keepalive_interval.is_finite() && network.keepalive_interval > 0.0) {
        errors.push(ValidationError::InvalidKeepalive(name.to_string()));
    }

    let durations = [
        ("connect_timeout", network.connect_timeout),
        ("throttle", network.throttle),
        ("reconnect_delay", network.reconnect_delay),
    ];
    for (field, value) in durations {
        if !(value.is_finite() && value >= 0.0) {
            errors.push(ValidationError::InvalidDuration {
                network: name.to_string(),
                field,
            });
        }
    }
}
