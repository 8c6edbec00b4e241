//! Configuration management

use crate::error::{AdfError, Result};

// ============================================================================
// Configuration Constants
// ============================================================================

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/mgd";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default Alliance (LinkML) schema version tag for the envelope header.
pub const DEFAULT_SCHEMA_VERSION: &str = "v2.9.1";

/// Extractor configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,

    /// Alliance LinkML schema version, stamped into the envelope header.
    pub schema_version: String,

    /// Submitting member release version. When unset the header falls back
    /// to the run timestamp.
    pub release_version: Option<String>,

    /// When set, each primary result set is truncated to this many rows.
    /// Development aid only.
    pub sample_limit: Option<usize>,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment and defaults
    ///
    /// Environment variables:
    /// - `DATABASE_URL`: Postgres connection string for the MGI database
    /// - `DATABASE_MAX_CONNECTIONS`, `DATABASE_CONNECT_TIMEOUT`
    /// - `ALLIANCE_SCHEMA_VERSION`: schema version header field
    /// - `ADF_RELEASE_VERSION`: release version header field
    /// - `ADF_SAMPLE`: row limit for sample-mode runs
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_MAX_CONNECTIONS),
                connect_timeout_secs: std::env::var("DATABASE_CONNECT_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS),
            },
            schema_version: std::env::var("ALLIANCE_SCHEMA_VERSION")
                .unwrap_or_else(|_| DEFAULT_SCHEMA_VERSION.to_string()),
            release_version: std::env::var("ADF_RELEASE_VERSION").ok(),
            sample_limit: std::env::var("ADF_SAMPLE").ok().and_then(|s| s.parse().ok()),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.database.url.is_empty() {
            return Err(AdfError::config("Database URL cannot be empty"));
        }

        if self.database.max_connections == 0 {
            return Err(AdfError::config(
                "Database max_connections must be greater than 0",
            ));
        }

        if self.schema_version.is_empty() {
            return Err(AdfError::config("Schema version cannot be empty"));
        }

        if self.sample_limit == Some(0) {
            return Err(AdfError::config("ADF_SAMPLE must be greater than 0"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
            },
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
            release_version: None,
            sample_limit: None,
        }
    }
}
