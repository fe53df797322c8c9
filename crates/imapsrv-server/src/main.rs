//! imapsrv - IMAP server entry point

use anyhow::Result;
use imapsrv_common::config::{Config, LoggingConfig};
use imapsrv_core::ImapServer;
use imapsrv_storage::{Mailstore, MemoryMailstore};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    init_logging(&config.logging);

    info!("Starting imapsrv on {}...", config.server.hostname);

    // Initialize mailstore
    let mailstore: Arc<dyn Mailstore> = match &config.mailstore.path {
        Some(path) => Arc::new(MemoryMailstore::from_file(path)?),
        None => {
            info!("No mailbox file configured, starting with an empty mailstore");
            Arc::new(MemoryMailstore::new())
        }
    };

    let imap_server = ImapServer::new(config.imap.clone(), mailstore);
    info!("Starting IMAP server on {}", config.imap.bind);

    let imap_handle = tokio::spawn(async move {
        if let Err(e) = imap_server.run().await {
            tracing::error!("IMAP server error: {}", e);
        }
    });

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = imap_handle => {
            info!("IMAP server stopped");
        }
    }

    info!("imapsrv shutdown complete");

    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},imapsrv=debug", config.level)));

    let registry = tracing_subscriber::registry().with(filter);

    if config.format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_level(true))
            .init();
    }
}
