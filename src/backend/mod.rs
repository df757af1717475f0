//! Backend adapters implementing the connector contract

pub mod azure_openai;
pub mod h2ogpte;

pub use azure_openai::AzureOpenAiConnector;
pub use h2ogpte::H2oGpteConnector;
