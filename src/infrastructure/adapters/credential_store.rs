//! Credential store backed by the loaded configuration

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::config::AppConfig;
use crate::domain::credentials::{normalize_host, CredentialEntry, DomainMatchPolicy};
use crate::domain::ports::CredentialStore;
use crate::shared::error::AppResult;

/// Read-only store built once at startup
pub struct ConfigCredentialStore {
    entries: Vec<Arc<CredentialEntry>>,
    policy: DomainMatchPolicy,
}

impl ConfigCredentialStore {
    pub fn new(entries: Vec<CredentialEntry>, policy: DomainMatchPolicy) -> Self {
        Self {
            entries: entries.into_iter().map(Arc::new).collect(),
            policy,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let entries = config
            .credentials
            .iter()
            .map(|c| {
                CredentialEntry::new(
                    &c.domain,
                    SecretString::new(c.api_key.expose_secret().to_string()),
                )
            })
            .collect();
        Self::new(entries, config.security.domain_match)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CredentialStore for ConfigCredentialStore {
    async fn find_by_domain(&self, caller_host: &str) -> AppResult<Option<Arc<CredentialEntry>>> {
        let host = normalize_host(caller_host);
        if host.is_empty() {
            return Ok(None);
        }

        // An exact hit wins over a looser match for a parent domain
        if let Some(entry) = self.entries.iter().find(|e| e.domain == host) {
            return Ok(Some(entry.clone()));
        }

        Ok(self
            .entries
            .iter()
            .find(|e| self.policy.matches(&e.domain, &host))
            .cloned())
    }

    async fn all(&self) -> AppResult<Vec<Arc<CredentialEntry>>> {
        Ok(self.entries.clone())
    }
}
