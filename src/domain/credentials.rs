//! Client store credentials and caller-domain matching

use secrecy::SecretString;
use serde::Deserialize;

/// Shared secret registered for one client store domain
#[derive(Debug)]
pub struct CredentialEntry {
    pub domain: String,
    pub secret: SecretString,
}

impl CredentialEntry {
    pub fn new(domain: impl AsRef<str>, secret: SecretString) -> Self {
        Self {
            domain: normalize_host(domain.as_ref()),
            secret,
        }
    }

    /// Base URL of the store when nothing more specific is known
    pub fn default_store_url(&self) -> String {
        format!("https://{}/", self.domain)
    }
}

/// Strategy used to match a caller host against registered domains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainMatchPolicy {
    /// Host equals the registered domain
    Exact,
    /// Host equals the registered domain or is a subdomain of it
    Suffix,
    /// Either string contains the other (legacy behaviour)
    Substring,
}

impl Default for DomainMatchPolicy {
    fn default() -> Self {
        DomainMatchPolicy::Suffix
    }
}

impl DomainMatchPolicy {
    /// Check whether `caller_host` belongs to the store registered as `registered`
    pub fn matches(&self, registered: &str, caller_host: &str) -> bool {
        let registered = normalize_host(registered);
        let caller = normalize_host(caller_host);
        if registered.is_empty() || caller.is_empty() {
            return false;
        }

        match self {
            DomainMatchPolicy::Exact => registered == caller,
            DomainMatchPolicy::Suffix => {
                caller == registered
                    || caller
                        .strip_suffix(registered.as_str())
                        .map(|prefix| prefix.ends_with('.'))
                        .unwrap_or(false)
            }
            DomainMatchPolicy::Substring => {
                caller.contains(registered.as_str()) || registered.contains(caller.as_str())
            }
        }
    }
}

/// Lower-case a host, drop any scheme, path, port, trailing dot and `www.` prefix
pub fn normalize_host(raw: &str) -> String {
    let mut host = raw.trim().to_ascii_lowercase();
    if let Some(idx) = host.find("://") {
        host = host[idx + 3..].to_string();
    }
    if let Some(idx) = host.find('/') {
        host.truncate(idx);
    }
    if !host.starts_with('[') {
        if let Some(idx) = host.rfind(':') {
            host.truncate(idx);
        }
    }
    let host = host.trim_end_matches('.');
    host.strip_prefix("www.").unwrap_or(host).to_string()
}

/// Extract the host of an absolute URL
pub fn host_of(url: &str) -> Option<String> {
    url::Url::parse(url.trim())
        .ok()
        .and_then(|u| u.host_str().map(normalize_host))
        .filter(|h| !h.is_empty())
}
