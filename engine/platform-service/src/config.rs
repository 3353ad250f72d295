//! Service configuration management

use anyhow::{Context, Result};
use content_gateway::GatewayConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service-level configuration
    #[serde(default)]
    pub service: ServiceSettings,

    /// Storage backend configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_secs: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self { shutdown_timeout_secs: 10 }
    }
}

/// Which storage backend to run against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-memory store, for development and tests
    Memory,
    /// Postgres via DATABASE_URL
    Postgres,
}

/// Storage backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// Connection string, required for the postgres backend
    #[serde(skip_serializing, default)]
    pub database_url: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { backend: StoreBackend::Memory, database_url: None }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

/// Load configuration from an optional TOML file and environment variables
pub fn load_configuration(config_file: Option<&Path>) -> Result<ServiceConfig> {
    let mut config = match config_file {
        Some(path) => load_from_file(path)?,
        None => ServiceConfig::default(),
    };

    load_from_env(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Load configuration from a TOML file
fn load_from_file(path: &Path) -> Result<ServiceConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {path:?}"))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse configuration file: {path:?}"))
}

/// Override configuration from environment variables
fn load_from_env(config: &mut ServiceConfig) {
    if let Ok(level) = std::env::var("PLATFORM_LOG_LEVEL") {
        config.logging.level = level;
    }

    if let Ok(format) = std::env::var("PLATFORM_LOG_FORMAT") {
        config.logging.format = format;
    }

    if let Ok(backend) = std::env::var("PLATFORM_STORE_BACKEND") {
        match backend.as_str() {
            "memory" => config.store.backend = StoreBackend::Memory,
            "postgres" => config.store.backend = StoreBackend::Postgres,
            other => tracing::warn!("ignoring unknown store backend: {other}"),
        }
    }

    if let Ok(url) = std::env::var("DATABASE_URL") {
        config.store.database_url = Some(url);
    }

    if let Ok(host) = std::env::var("PLATFORM_HOST") {
        config.gateway.host = host;
    }

    if let Ok(port) = std::env::var("PLATFORM_PORT") {
        if let Ok(port) = port.parse() {
            config.gateway.port = port;
        }
    }

    if let Ok(secret) = std::env::var("PLATFORM_JWT_SECRET") {
        config.gateway.jwt_secret = secret;
    }

    if let Ok(timeout) = std::env::var("PLATFORM_SHUTDOWN_TIMEOUT_SECS") {
        if let Ok(timeout) = timeout.parse() {
            config.service.shutdown_timeout_secs = timeout;
        }
    }
}

/// Validate configuration
fn validate_config(config: &ServiceConfig) -> Result<()> {
    match config.logging.level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        other => anyhow::bail!("Invalid log level: {other}"),
    }

    match config.logging.format.as_str() {
        "json" | "pretty" => {}
        other => anyhow::bail!("Invalid log format: {other}"),
    }

    if config.store.backend == StoreBackend::Postgres && config.store.database_url.is_none() {
        anyhow::bail!("postgres backend requires DATABASE_URL");
    }

    config.gateway.validate().context("Invalid gateway configuration")?;

    Ok(())
}
