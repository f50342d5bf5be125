//! Test suite for the PayPal proxy bridge
//!
//! - Integration tests drive the full route tree through `warp::test`
//! - Security tests cover signature, nonce and webhook fallback behaviour
//! - `common` holds the mock gateway and payload builders

pub mod common;
pub mod integration;
pub mod security;

/// Test configuration and utilities
pub mod config {
    use crate::config::app_config::CredentialConfig;
    use crate::config::AppConfig;
    use crate::domain::credentials::DomainMatchPolicy;
    use secrecy::SecretString;
    use std::sync::Once;

    /// Shared secret of the test store
    pub const STORE_KEY: &str = "store-key-0123456789abcdef";

    /// Domain of the test store; wiremock listens on loopback
    pub const STORE_DOMAIN: &str = "127.0.0.1";

    pub const SESSION_SECRET: &str = "session-secret-0123456789abcdef";

    pub const PUBLIC_URL: &str = "https://pay.proxy.test";

    static INIT: Once = Once::new();

    /// Initialize test environment
    pub fn init() {
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter("debug")
                .with_test_writer()
                .try_init();
        });
    }

    /// Create test configuration
    pub fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.server.public_url = PUBLIC_URL.to_string();
        config.security.session_secret = SecretString::new(SESSION_SECRET.to_string());
        config.security.domain_match = DomainMatchPolicy::Exact;
        config.webhook.timeout_seconds = 2;
        config.credentials = vec![CredentialConfig {
            domain: STORE_DOMAIN.to_string(),
            api_key: SecretString::new(STORE_KEY.to_string()),
        }];
        config
    }

    /// Configuration with request verification bypassed
    pub fn testing_mode_config() -> AppConfig {
        let mut config = test_config();
        config.security.testing_mode = true;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigValidator;

    #[test]
    fn test_config_initialization() {
        config::init();
        let test_config = config::test_config();
        assert!(!test_config.security.testing_mode);
        assert_eq!(test_config.credentials.len(), 1);
        assert!(test_config.validate_config().is_ok());
        assert!(ConfigValidator::validate_config(&test_config).is_ok());
    }

    #[test]
    fn test_testing_mode_config() {
        assert!(config::testing_mode_config().security.testing_mode);
    }
}
