//! Secure Echo Server
//!
//! Accepts secure-stream connections and echoes every byte back.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

use secure_stream::{echo, ChannelConfig, SecureListener};

/// Environment variable naming a JSON configuration file
const CONFIG_ENV: &str = "SECURE_ECHO_CONFIG";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("echo_server=debug".parse()?)
                .add_directive("secure_stream=info".parse()?),
        )
        .init();

    info!("Starting Secure Echo Server");

    let config = match std::env::var_os(CONFIG_ENV) {
        Some(path) => EchoConfig::load(Path::new(&path))?,
        None => EchoConfig::default(),
    };

    let listener = SecureListener::bind(config.listen_addr, config.channel)
        .await
        .with_context(|| format!("failed to listen on {}", config.listen_addr))?;

    echo::serve(listener, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await;

    Ok(())
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct EchoConfig {
    listen_addr: SocketAddr,
    channel: ChannelConfig,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            channel: ChannelConfig {
                handshake_timeout_ms: Some(10_000),
                ..Default::default()
            },
        }
    }
}

impl EchoConfig {
    fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = Self::parse(&raw).with_context(|| format!("invalid config {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    fn parse(raw: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.channel.validate()?;
        Ok(config)
    }
}
