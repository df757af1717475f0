//! Configuration loading and endpoint definitions

mod settings;

pub use settings::{ConnectorKind, EndpointConfig, EndpointsConfig, LoggingConfig, Settings};
