//! # Application State
//!
//! Shared state for the Axum application.
//! Contains configuration, the merchant registry, session storage and the
//! optional backend client.

use crate::backend::BackendClient;
use crate::session::SessionStore;
use anyhow::Context;
use cart_core::MerchantRegistry;
use std::net::SocketAddr;
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, used to build local checkout URLs
    pub base_url: String,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Payment backend that creates real sessions
    pub backend_url: Option<String>,
    /// Explicit path to the merchants TOML file
    pub merchants_path: Option<String>,
}

impl AppConfig {
    /// Load from environment variables (and `.env`)
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from any variable source
    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        Self {
            host: var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: var("PORT").and_then(|p| p.parse().ok()).unwrap_or(8080),
            base_url: var("BASE_URL")
                .unwrap_or_else(|| "http://localhost:8080".to_string())
                .trim_end_matches('/')
                .to_string(),
            environment: var("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            backend_url: non_empty("BACKEND_URL"),
            merchants_path: non_empty("MERCHANTS_PATH"),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid socket address {}:{}", self.host, self.port))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Local checkout page for a session
    pub fn checkout_url(&self, session_id: &str) -> String {
        format!("{}/checkout/{}", self.base_url, session_id)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_vars(|_| None)
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// Known merchants
    pub merchants: Arc<MerchantRegistry>,
    /// Checkout sessions created by this process
    pub sessions: SessionStore,
    /// Payment backend, when configured
    pub backend: Option<BackendClient>,
}

impl AppState {
    /// Create state from the environment
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let merchants = load_merchant_registry(config.merchants_path.as_deref())?;
        Self::with_parts(config, merchants)
    }

    /// Create state from explicit parts
    pub fn with_parts(config: AppConfig, merchants: MerchantRegistry) -> anyhow::Result<Self> {
        let backend = match config.backend_url.as_deref() {
            Some(url) => Some(
                BackendClient::new(url)
                    .map_err(|e| anyhow::anyhow!("Failed to initialize backend client: {}", e))?,
            ),
            None => None,
        };

        Ok(Self {
            config,
            merchants: Arc::new(merchants),
            sessions: SessionStore::new(),
            backend,
        })
    }
}

/// Load the merchant registry from config file
fn load_merchant_registry(explicit: Option<&str>) -> anyhow::Result<MerchantRegistry> {
    if let Some(path) = explicit {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
        let registry = MerchantRegistry::from_toml(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
        tracing::info!("Loaded {} merchants from {}", registry.len(), path);
        return Ok(registry);
    }

    let config_paths = [
        "config/merchants.toml",
        "../config/merchants.toml",
        "../../config/merchants.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let registry = MerchantRegistry::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            tracing::info!("Loaded {} merchants from {}", registry.len(), path);
            return Ok(registry);
        }
    }

    tracing::warn!("No merchant registry found, all merchants use defaults");
    Ok(MerchantRegistry::new())
}
