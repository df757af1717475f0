//! Connector registry and factory

use dashmap::DashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::backend::{AzureOpenAiConnector, H2oGpteConnector};
use crate::config::{ConnectorKind, EndpointConfig};
use crate::connector::traits::Connector;
use crate::error::{ConnectorError, Result};

/// Build a connector for an endpoint definition.
pub fn create_connector(config: &EndpointConfig) -> Result<Arc<dyn Connector>> {
    let arguments = config.to_arguments();
    arguments.validate()?;

    match config.connector {
        ConnectorKind::AzureOpenai => Ok(Arc::new(AzureOpenAiConnector::new(arguments)?)),
        ConnectorKind::H2ogpte => Ok(Arc::new(H2oGpteConnector::new(arguments)?)),
    }
}

/// Registry of constructed connectors, keyed by endpoint name.
pub struct ConnectorRegistry {
    connectors: DashMap<String, Arc<dyn Connector>>,
}

impl ConnectorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            connectors: DashMap::new(),
        }
    }

    /// Initialize the registry from configuration.
    pub fn initialize_from_config(&self, configs: &[EndpointConfig]) -> Result<()> {
        for config in configs {
            if !config.enabled {
                info!(name = %config.name, "Skipping disabled endpoint");
                continue;
            }

            match create_connector(config) {
                Ok(connector) => {
                    self.connectors.insert(config.name.clone(), connector);
                    info!(name = %config.name, connector = %config.connector, "Registered connector");
                }
                Err(e) => {
                    warn!(name = %config.name, error = %e, "Failed to create connector");
                }
            }
        }

        Ok(())
    }

    /// Add a new connector dynamically.
    pub fn add_connector(&self, config: &EndpointConfig) -> Result<()> {
        if self.connectors.contains_key(&config.name) {
            return Err(ConnectorError::InvalidRequest(format!(
                "Connector '{}' already exists",
                config.name
            )));
        }

        let connector = create_connector(config)?;
        self.connectors.insert(config.name.clone(), connector);
        info!(name = %config.name, "Added new connector");

        Ok(())
    }

    /// Remove a connector.
    pub fn remove_connector(&self, name: &str) -> Result<()> {
        if self.connectors.remove(name).is_none() {
            return Err(ConnectorError::ConnectorNotFound(name.to_string()));
        }

        info!(name = %name, "Removed connector");
        Ok(())
    }

    /// Get a connector by endpoint name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Connector>> {
        self.connectors.get(name).map(|r| r.value().clone())
    }

    /// Get the number of registered connectors.
    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }

    /// Check if a connector exists.
    pub fn contains(&self, name: &str) -> bool {
        self.connectors.contains_key(name)
    }
}

impl Default for ConnectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
