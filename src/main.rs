//! Main entry point for the connector gateway CLI

use connector_gateway::config::Settings;
use connector_gateway::connector::ConnectorRegistry;
use std::env;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json())
        .init();

    let mut args = env::args().skip(1);
    let (endpoint_name, prompt) = match (args.next(), args.next()) {
        (Some(name), Some(prompt)) => (name, prompt),
        _ => anyhow::bail!("usage: connector-gateway <endpoint-name> <prompt>"),
    };

    // Load configuration
    let settings = Settings::load()?;
    settings.validate()?;
    info!(endpoints = settings.endpoints.len(), "Loaded configuration");

    // Register connectors from configuration
    let registry = ConnectorRegistry::new();
    registry.initialize_from_config(&settings.endpoints)?;

    let connector = registry
        .get(&endpoint_name)
        .ok_or_else(|| anyhow::anyhow!("no connector named '{endpoint_name}'"))?;

    let response = connector.get_response(&prompt).await?;
    println!("{}", response.response);

    Ok(())
}
