//! Configuration validation module
//!
//! This module provides additional validation logic for configuration
//! beyond the basic validator crate validation.

use secrecy::ExposeSecret;
use std::collections::HashSet;

use crate::config::AppConfig;
use crate::domain::credentials::{normalize_host, DomainMatchPolicy};
use crate::shared::error::AppError;

/// Minimum length accepted for shared secrets
const MIN_SECRET_LEN: usize = 16;

/// Configuration validator for additional validation logic
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the complete configuration
    pub fn validate_config(config: &AppConfig) -> crate::Result<()> {
        Self::validate_paypal_config(&config.paypal)?;
        Self::validate_security_config(&config.security)?;
        Self::validate_credentials(config)?;
        Self::validate_public_url(&config.server.public_url)?;
        Ok(())
    }

    /// Validate PayPal settings
    fn validate_paypal_config(paypal: &crate::config::app_config::PayPalConfig) -> crate::Result<()> {
        if let Some(base) = &paypal.base_url {
            let is_local = base.contains("localhost") || base.contains("127.0.0.1");
            if !base.starts_with("https://") && !(paypal.sandbox && is_local) {
                return Err(AppError::Config(
                    "PayPal base URL must use HTTPS outside local sandbox testing".to_string(),
                ));
            }
        }

        if !paypal.is_configured() {
            tracing::warn!("PayPal credentials are not configured; order creation will fail");
        }

        Ok(())
    }

    /// Validate security configuration
    fn validate_security_config(security: &crate::config::app_config::SecurityConfig) -> crate::Result<()> {
        if security.session_secret.expose_secret().len() < MIN_SECRET_LEN {
            return Err(AppError::Config(format!(
                "security.session_secret must be at least {} characters",
                MIN_SECRET_LEN
            )));
        }

        if security.domain_match == DomainMatchPolicy::Substring {
            tracing::warn!(
                "Domain matching uses substring containment; unrelated hosts such as \
                 'workshop.com' will match a store registered as 'shop.com'"
            );
        }

        Ok(())
    }

    /// Validate client store credentials
    fn validate_credentials(config: &AppConfig) -> crate::Result<()> {
        let mut seen = HashSet::new();
        for credential in &config.credentials {
            let domain = normalize_host(&credential.domain);
            if domain.is_empty() || domain.contains('/') || domain.contains(' ') {
                return Err(AppError::Config(format!(
                    "Invalid credential domain: {}",
                    credential.domain
                )));
            }
            if credential.api_key.expose_secret().len() < MIN_SECRET_LEN {
                return Err(AppError::Config(format!(
                    "API key for {} must be at least {} characters",
                    domain, MIN_SECRET_LEN
                )));
            }
            if !seen.insert(domain.clone()) {
                return Err(AppError::Config(format!("Duplicate credential domain: {}", domain)));
            }
        }

        if config.credentials.is_empty() {
            tracing::warn!("No client store credentials configured; every signed request will be rejected");
        }

        Ok(())
    }

    /// Validate the proxy's public URL
    fn validate_public_url(public_url: &str) -> crate::Result<()> {
        let url = url::Url::parse(public_url)
            .map_err(|e| AppError::Config(format!("Invalid server.public_url: {}", e)))?;
        if url.host_str().is_none() {
            return Err(AppError::Config("server.public_url must include a host".to_string()));
        }
        Ok(())
    }
}
