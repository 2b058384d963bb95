//! Headless host bridge: newline-delimited JSON over stdin/stdout.
//!
//! Reads `CommandEnvelope`s from stdin and writes `ResponseEnvelope`s and
//! `EventEnvelope`s to stdout. Tracing goes to stderr so stdout stays a
//! clean protocol channel.
//!
//! No AI gateway or audio device is wired in here, so `assistant.*` and
//! `realtime.*` commands answer with an error.

use anyhow::Context;
use durgas::host::{DesktopHost, run_stdio_bridge};
use durgas::{Desktop, DesktopConfig};
use std::sync::Arc;

fn load_config() -> anyhow::Result<DesktopConfig> {
    let path = std::env::var_os("DURGAS_CONFIG")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(DesktopConfig::default_config_path);
    if !path.exists() {
        tracing::info!(path = %path.display(), "no config file, using defaults");
        return Ok(DesktopConfig::default());
    }
    DesktopConfig::from_file(&path)
        .with_context(|| format!("failed to load config from {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("durgas=info")),
        )
        .init();

    tracing::info!("durgas-host starting");

    let config = load_config()?;
    let desktop = Arc::new(Desktop::new(config).context("failed to boot desktop")?);
    let host = Arc::new(DesktopHost::new(desktop));

    run_stdio_bridge(host).await.map_err(|e| {
        tracing::error!(error = %e, "durgas-host exited with error");
        anyhow::anyhow!("durgas-host failed: {e}")
    })?;

    tracing::info!("durgas-host shut down cleanly");
    Ok(())
}
