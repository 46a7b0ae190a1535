//! Relay node.
//!
//! Connects to the configured Redis bus and serves one relay adapter per
//! configured namespace until interrupted.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use room_relay::adapters::sessions::ConnectionHub;
use room_relay::adapters::RelayAdapterFactory;
use room_relay::config::{AppConfig, NodeConfig};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn init_tracing(config: &NodeConfig) -> Result<(), BoxError> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config.node)?;

    let factory = RelayAdapterFactory::connect(&config).await?;
    tracing::info!(
        node_id = %factory.node_id(),
        environment = ?config.node.environment,
        "Connected to bus"
    );

    let hub = Arc::new(ConnectionHub::new());
    let mut adapters = Vec::new();
    for namespace in config.adapter.namespace_list()? {
        adapters.push(factory.adapter(namespace, hub.clone()).await?);
    }

    tracing::info!(namespaces = adapters.len(), "Relay node running, press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;

    for adapter in &adapters {
        adapter.close().await;
    }
    tracing::info!("Relay node stopped");

    Ok(())
}
