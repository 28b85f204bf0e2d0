//! Accessory server entry point.
//!
//! Loads the configuration, wires the log-only discovery and handler
//! implementations into the server, and then plays the external
//! scheduler: one accept step and one process step per iteration,
//! forever.  The short poll interval inside each step is what keeps
//! the loop cooperative rather than busy.
//!
//! Error policy (per step):
//! - timeouts are the steady state and stay silent;
//! - recoverable errors are logged and the loop continues;
//! - a fatal registry error stops the server rather than retrying into
//!   a known-corrupt state.

use std::path::Path;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use hap_server::application::handler::LoggingHandler;
use hap_server::infrastructure::network::discovery::LoggingDiscovery;
use hap_server::infrastructure::network::AccessoryServer;
use hap_server::infrastructure::storage::config::AppConfig;
use hap_server::ServerError;

const DEFAULT_CONFIG_PATH: &str = "hap-server.toml";

fn main() -> anyhow::Result<()> {
    // Structured logging; level overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = AppConfig::load_or_default(Path::new(&config_path))
        .with_context(|| format!("loading configuration from {config_path}"))?;

    info!(
        port = config.server.port,
        instance = %config.server.instance_name,
        "starting accessory server"
    );

    let mut server = AccessoryServer::new(
        &config,
        Box::new(LoggingDiscovery),
        Box::new(LoggingHandler),
    )
    .context("creating server")?;
    server
        .listen(config.server.port)
        .context("binding listener")?;

    loop {
        match server.accept_step() {
            Ok(_) | Err(ServerError::Timeout) => {}
            Err(e) if e.is_fatal() => {
                error!(error = %e, "fatal error accepting connections");
                return Err(e.into());
            }
            Err(e) => error!(error = %e, "failed accepting a connection"),
        }

        match server.process_step() {
            Ok(()) | Err(ServerError::Timeout) => {}
            Err(e) if e.is_fatal() => {
                error!(error = %e, "fatal error processing connections");
                return Err(e.into());
            }
            Err(e) => error!(error = %e, "failed processing connections"),
        }
    }
}
