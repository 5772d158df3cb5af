//! driftwood - IRC client daemon.
//!
//! Loads a TOML configuration (first argument, default `config.toml`),
//! starts one session per configured network and runs until every
//! session terminates or Ctrl-C is received.

use std::sync::Arc;
use std::time::Duration;

use driftwood::config::validate;
use driftwood::{Bot, CommandRouter, Config};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Time sessions get to send QUIT and close before being cancelled.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Err(problems) = validate(&config) {
        for problem in &problems {
            error!(path = %config_path, "{problem}");
        }
        return Err(anyhow::anyhow!(
            "{} configuration error(s) in {config_path}",
            problems.len()
        ));
    }

    info!(
        networks = config.networks.len(),
        command_prefix = %config.bot.command_prefix,
        "Starting driftwood"
    );

    let router = CommandRouter::new(config.bot.command_prefix.clone());
    let mut bot = Bot::new(&config, Arc::new(router));
    bot.spawn();

    let interrupted = tokio::select! {
        _ = bot.join() => false,
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!(error = %e, "Failed to listen for Ctrl-C");
            }
            true
        }
    };

    if interrupted {
        info!("Shutting down");
        bot.shutdown(SHUTDOWN_GRACE).await;
    } else {
        info!("All sessions terminated");
    }

    Ok(())
}
