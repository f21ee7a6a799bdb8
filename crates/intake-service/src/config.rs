//! Configuration management for the intake service
//!
//! Loads configuration from environment variables with sensible defaults.
//! The storage connection string is optional at startup: without it the
//! service still answers, and every intake request fails with a
//! configuration error.

use anyhow::{Context, Result};
use std::env;
use std::sync::Arc;

use crate::azure::{AzureBlobStore, ConnectionString};
use crate::storage::ObjectStore;
use crate::Limits;

/// Environment variable holding the Azure Storage connection string
pub const CONNECTION_STRING_VAR: &str = "AZURE_STORAGE_CONNECTION_STRING_SSGL";

/// Application configuration
#[derive(Clone)]
pub struct Config {
    /// API server host
    pub host: String,

    /// API server port
    pub port: u16,

    /// Azure Storage connection string, if configured
    pub connection_string: Option<String>,

    /// Blob container receiving denuncias
    pub container: String,

    /// Upload size limits
    pub limits: Limits,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field(
                "connection_string",
                &self.connection_string.as_ref().map(|_| "<redacted>"),
            )
            .field("container", &self.container)
            .field("limits", &self.limits)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        let defaults = Limits::default();

        let config = Config {
            host: env::var("INTAKE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),

            port: env::var("INTAKE_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid INTAKE_PORT")?,

            connection_string: env::var(CONNECTION_STRING_VAR)
                .ok()
                .filter(|s| !s.trim().is_empty()),

            container: env::var("DENUNCIAS_CONTAINER").unwrap_or_else(|_| "denuncias".to_string()),

            limits: Limits {
                max_attachment_bytes: parse_or("MAX_ATTACHMENT_BYTES", defaults.max_attachment_bytes)?,
                max_request_bytes: parse_or("MAX_REQUEST_BYTES", defaults.max_request_bytes)?,
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("INTAKE_PORT must be greater than 0");
        }

        if self.container.trim().is_empty() {
            anyhow::bail!("DENUNCIAS_CONTAINER cannot be empty");
        }

        if self.limits.max_attachment_bytes == 0 || self.limits.max_request_bytes == 0 {
            anyhow::bail!("Upload limits must be greater than 0");
        }

        Ok(())
    }

    /// Get the API server address
    pub fn api_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Build the blob store from the connection string, if one is set
    pub fn object_store(&self) -> Result<Option<Arc<dyn ObjectStore>>> {
        let Some(raw) = &self.connection_string else {
            return Ok(None);
        };

        let connection = ConnectionString::parse(raw)
            .with_context(|| format!("Invalid {}", CONNECTION_STRING_VAR))?;

        let store: Arc<dyn ObjectStore> = Arc::new(AzureBlobStore::new(connection, &self.container));
        Ok(Some(store))
    }
}

fn parse_or(var: &str, default: usize) -> Result<usize> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}", var)),
        Err(_) => Ok(default),
    }
}
