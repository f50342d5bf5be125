//! Application configuration structures
//!
//! This module contains the main configuration structures for the application.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use validator::Validate;

use crate::domain::credentials::DomainMatchPolicy;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct ServerConfig {
    /// Server address to bind to
    pub bind_address: IpAddr,

    /// Server port
    #[validate(range(min = 1, max = 65535))]
    pub port: u16,

    /// Externally reachable base URL of this proxy, used to build the
    /// create/capture URLs handed to the checkout page
    #[validate(url)]
    pub public_url: String,

    /// Maximum request size in bytes
    #[validate(range(min = 1024, max = 10485760))] // 1KB to 10MB
    pub max_request_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            public_url: "http://127.0.0.1:8080".to_string(),
            max_request_size: 256 * 1024,
        }
    }
}

/// PayPal REST API configuration
#[derive(Debug, Deserialize, Validate)]
#[serde(default)]
pub struct PayPalConfig {
    /// REST app client id; an empty value leaves the gateway uninitialized
    pub client_id: String,

    /// REST app client secret
    pub client_secret: SecretString,

    /// Use the sandbox environment
    pub sandbox: bool,

    /// Override for the API base URL (tests, regional endpoints)
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 120))]
    pub timeout_seconds: u64,
}

impl Default for PayPalConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: SecretString::new(String::new()),
            sandbox: true,
            base_url: None,
            timeout_seconds: 15,
        }
    }
}

impl PayPalConfig {
    /// Whether both halves of the REST credentials are present
    pub fn is_configured(&self) -> bool {
        !self.client_id.trim().is_empty() && !self.client_secret.expose_secret().trim().is_empty()
    }

    /// Base URL for REST calls
    pub fn api_base(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None if self.sandbox => "https://api-m.sandbox.paypal.com".to_string(),
            None => "https://api-m.paypal.com".to_string(),
        }
    }
}

/// Security configuration
#[derive(Debug, Deserialize, Validate)]
#[serde(default)]
pub struct SecurityConfig {
    /// Bypass request verification. Never enable in production.
    pub testing_mode: bool,

    /// How a caller host is matched against configured store domains
    pub domain_match: DomainMatchPolicy,

    /// Secret used to issue checkout session nonces
    pub session_secret: SecretString,

    /// Maximum recorded nonces per order before verification fails
    #[validate(range(min = 1, max = 10000))]
    pub nonce_ceiling: usize,

    /// Number of order ids retained by the nonce ledger
    #[validate(range(min = 1, max = 1000000))]
    pub ledger_capacity: usize,

    /// Lifetime of a checkout session nonce in hours
    #[validate(range(min = 2, max = 168))]
    pub session_nonce_ttl_hours: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            testing_mode: false,
            domain_match: DomainMatchPolicy::Suffix,
            session_secret: SecretString::new(String::new()),
            nonce_ceiling: 100,
            ledger_capacity: 1000,
            session_nonce_ttl_hours: 12,
        }
    }
}

/// Shared secret issued to one client store
#[derive(Debug, Deserialize, Validate)]
pub struct CredentialConfig {
    /// Store domain, e.g. `shop.example.com`
    #[validate(length(min = 1, max = 253))]
    pub domain: String,

    /// Shared API key used for HMAC signing
    pub api_key: SecretString,
}

/// Nonce ledger persistence
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct LedgerConfig {
    /// Redis connection URL; the ledger is memory-only when unset
    pub redis_url: Option<String>,

    /// Prefix of the Redis hash and sorted set holding the ledger
    #[validate(length(min = 1))]
    pub key: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            key: "paypal_proxy:used_nonces".to_string(),
        }
    }
}

/// Outbound webhook configuration
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct WebhookConfig {
    /// Per-attempt timeout in seconds
    #[validate(range(min = 1, max = 120))]
    pub timeout_seconds: u64,

    /// Path of the primary webhook endpoint on the origin store
    #[validate(length(min = 1))]
    pub primary_path: String,

    /// Query string of the legacy endpoint on the origin store
    #[validate(length(min = 1))]
    pub legacy_query: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 15,
            primary_path: "/wc-paypal-proxy/v1/webhook".to_string(),
            legacy_query: "wc-paypal-proxy-webhook=yes".to_string(),
        }
    }
}

/// Destination-store product catalog used to resolve mapped product names
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Destination product id to canonical product name
    pub product_names: HashMap<String, String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    #[validate(length(min = 1))]
    pub level: String,

    /// Log format: "json" or "text"
    #[validate(length(min = 1))]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Application configuration
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// PayPal configuration
    pub paypal: PayPalConfig,

    /// Security configuration
    pub security: SecurityConfig,

    /// Client store credentials
    pub credentials: Vec<CredentialConfig>,

    /// Nonce ledger configuration
    pub ledger: LedgerConfig,

    /// Webhook configuration
    pub webhook: WebhookConfig,

    /// Product catalog configuration
    pub catalog: CatalogConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> crate::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("ProxyConf").required(false))
            .add_source(config::Environment::with_prefix("PAYPAL_PROXY").separator("__"))
            .build()
            .map_err(|e| crate::shared::error::AppError::Config(format!("Failed to build configuration: {}", e)))?;

        let config: AppConfig = config.try_deserialize()
            .map_err(|e| crate::shared::error::AppError::Config(format!("Failed to deserialize configuration: {}", e)))?;

        config.validate_config()
            .map_err(|e| crate::shared::error::AppError::Config(format!("Configuration validation failed: {}", e)))?;

        crate::config::ConfigValidator::validate_config(&config)?;

        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate_config(&self) -> Result<(), validator::ValidationErrors> {
        self.server.validate()?;
        self.paypal.validate()?;
        self.security.validate()?;
        for credential in &self.credentials {
            credential.validate()?;
        }
        self.ledger.validate()?;
        self.webhook.validate()?;
        self.logging.validate()?;

        Ok(())
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }

    /// Absolute URL of an endpoint under the proxy's REST namespace
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/wc-paypal-proxy/v1/{}",
            self.server.public_url.trim_end_matches('/'),
            endpoint
        )
    }
}
