//! Application settings and endpoint configuration management

use crate::connector::arguments::{DEFAULT_NUM_RETRIES, DEFAULT_TIMEOUT_SECS};
use crate::connector::ConnectorEndpointArguments;
use crate::error::{ConnectorError, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub logging: LoggingConfig,
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// Connector implementation selector
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorKind {
    AzureOpenai,
    H2ogpte,
}

impl std::fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectorKind::AzureOpenai => write!(f, "azure_openai"),
            ConnectorKind::H2ogpte => write!(f, "h2ogpte"),
        }
    }
}

/// Endpoint definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointConfig {
    pub name: String,

    #[serde(rename = "type")]
    pub connector: ConnectorKind,

    #[serde(default)]
    pub endpoint: String,

    #[serde(default)]
    pub token: Option<String>,

    pub model: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub max_calls_per_second: Option<u32>,

    #[serde(default = "default_num_retries")]
    pub num_of_retries: u32,

    #[serde(default)]
    pub pre_prompt: String,

    #[serde(default)]
    pub post_prompt: String,

    #[serde(default)]
    pub system_prompt: Option<String>,

    #[serde(default)]
    pub params: Map<String, Value>,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_num_retries() -> u32 {
    DEFAULT_NUM_RETRIES
}

fn default_true() -> bool {
    true
}

impl EndpointConfig {
    /// Convert into the immutable argument value a connector is built from.
    pub fn to_arguments(&self) -> ConnectorEndpointArguments {
        ConnectorEndpointArguments {
            endpoint: self.endpoint.clone(),
            token: self.token.clone(),
            model: self.model.clone(),
            timeout_secs: self.timeout_secs,
            max_calls_per_second: self.max_calls_per_second,
            num_of_retries: self.num_of_retries,
            pre_prompt: self.pre_prompt.clone(),
            post_prompt: self.post_prompt.clone(),
            system_prompt: self.system_prompt.clone(),
            optional_params: self.params.clone(),
        }
    }
}

/// Endpoints-only configuration file structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct EndpointsConfig {
    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
}

impl Settings {
    /// Load settings from the default configuration files and environment
    /// variables.
    pub fn load() -> Result<Self> {
        Self::load_from_paths("config/gateway.yaml", Some("config/endpoints.yaml"))
    }

    /// Load settings from a specific configuration file path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let format = if path
            .extension()
            .map_or(false, |ext| ext == "yaml" || ext == "yml")
        {
            FileFormat::Yaml
        } else {
            FileFormat::Toml
        };

        let mut builder = Config::builder()
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?;

        if path.exists() {
            builder = builder.add_source(File::from(path).format(format));
        }

        builder = builder.add_source(
            Environment::with_prefix("CONNECTOR_GATEWAY")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Load settings, taking the endpoint list from a separate file when
    /// one is provided.
    pub fn load_from_paths<P: AsRef<Path>>(
        settings_config: P,
        endpoints_config: Option<P>,
    ) -> Result<Self> {
        let mut settings = Self::load_from_path(settings_config)?;

        if let Some(endpoints_path) = endpoints_config {
            let endpoints_path = endpoints_path.as_ref();
            if endpoints_path.exists() {
                let endpoints = Self::load_endpoints_config(endpoints_path)?;
                settings.endpoints = endpoints.endpoints;
            }
        }

        Ok(settings)
    }

    /// Load endpoint definitions from a YAML file.
    pub fn load_endpoints_config<P: AsRef<Path>>(path: P) -> Result<EndpointsConfig> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConnectorError::Config(config::ConfigError::Message(format!(
                "Failed to read endpoints config: {}",
                e
            )))
        })?;

        let endpoints: EndpointsConfig = serde_yaml::from_str(&content).map_err(|e| {
            ConnectorError::Config(config::ConfigError::Message(format!(
                "Failed to parse endpoints config: {}",
                e
            )))
        })?;

        Ok(endpoints)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        for endpoint in &self.endpoints {
            if endpoint.name.is_empty() {
                return Err(ConnectorError::Config(config::ConfigError::Message(
                    "Endpoint name cannot be empty".to_string(),
                )));
            }
            if endpoint.model.is_empty() {
                return Err(ConnectorError::Config(config::ConfigError::Message(
                    format!("Endpoint '{}' must set a model", endpoint.name),
                )));
            }
            if endpoint.timeout_secs == 0 {
                return Err(ConnectorError::Config(config::ConfigError::Message(
                    format!("Endpoint '{}' must have a positive timeout", endpoint.name),
                )));
            }
        }

        Ok(())
    }

    /// Get enabled endpoints.
    pub fn enabled_endpoints(&self) -> Vec<&EndpointConfig> {
        self.endpoints.iter().filter(|e| e.enabled).collect()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: default_log_level(),
                format: default_log_format(),
            },
            endpoints: vec![],
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            connector: ConnectorKind::AzureOpenai,
            endpoint: String::new(),
            token: None,
            model: String::new(),
            timeout_secs: default_timeout_secs(),
            max_calls_per_second: None,
            num_of_retries: default_num_retries(),
            pre_prompt: String::new(),
            post_prompt: String::new(),
            system_prompt: None,
            params: Map::new(),
            enabled: true,
        }
    }
}
