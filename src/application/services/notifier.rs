//! Webhook delivery to the originating store
//!
//! One attempt against the primary endpoint, then at most one against the
//! legacy endpoint. Nothing here ever returns an error to the caller.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use reqwest::Client;
use tracing::{error, info, warn};

use crate::config::app_config::WebhookConfig;
use crate::domain::credentials::{host_of, CredentialEntry};
use crate::domain::ports::CredentialStore;
use crate::domain::signing::{self, WebhookClaims};
use crate::domain::webhook::{DeliveryOutcome, PaymentStatus, WebhookDetails, WebhookNotification};
use crate::shared::error::{AppError, AppResult};

pub struct WebhookNotifier {
    http: Client,
    credentials: Arc<dyn CredentialStore>,
    primary_path: String,
    legacy_query: String,
}

impl WebhookNotifier {
    pub fn new(config: &WebhookConfig, credentials: Arc<dyn CredentialStore>) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create webhook client: {}", e)))?;

        Ok(Self {
            http,
            credentials,
            primary_path: format!("/{}", config.primary_path.trim_start_matches('/')),
            legacy_query: config.legacy_query.trim_start_matches('?').to_string(),
        })
    }

    /// Notify the store that owns `origin_url`
    pub async fn notify(
        &self,
        origin_url: Option<&str>,
        order_id: &str,
        status: PaymentStatus,
        details: WebhookDetails,
    ) -> DeliveryOutcome {
        let Some(origin_url) = origin_url.map(str::trim).filter(|u| !u.is_empty()) else {
            warn!(order_id = %order_id, "Cannot send webhook: missing return URL");
            return DeliveryOutcome::Failed;
        };
        let Some(host) = host_of(origin_url) else {
            warn!(order_id = %order_id, "Cannot send webhook: unparseable return URL");
            return DeliveryOutcome::Failed;
        };

        let credential = match self.credentials.find_by_domain(&host).await {
            Ok(Some(credential)) => credential,
            Ok(None) => {
                warn!(order_id = %order_id, domain = %host, "Cannot send webhook: no API key for domain");
                return DeliveryOutcome::Failed;
            }
            Err(e) => {
                error!(order_id = %order_id, error = %e, "Cannot send webhook: credential lookup failed");
                return DeliveryOutcome::Failed;
            }
        };

        self.notify_entry(&credential, origin_url, order_id, status, details).await
    }

    /// Notify a store whose credential is already known
    pub async fn notify_entry(
        &self,
        credential: &CredentialEntry,
        origin_url: &str,
        order_id: &str,
        status: PaymentStatus,
        details: WebhookDetails,
    ) -> DeliveryOutcome {
        let Some(base) = store_base_url(origin_url) else {
            warn!(order_id = %order_id, "Cannot send webhook: unparseable store URL");
            return DeliveryOutcome::Failed;
        };

        let nonce = webhook_nonce();
        let hash = signing::sign(
            &credential.secret,
            &WebhookClaims {
                order_id,
                status: status.as_str(),
                nonce: &nonce,
            },
        );
        let notification = WebhookNotification::new(order_id.to_string(), status, nonce, hash, details);
        self.deliver(&base, &notification).await
    }

    async fn deliver(&self, base: &str, notification: &WebhookNotification) -> DeliveryOutcome {
        let order_id = notification.order_id.as_str();
        let primary_url = format!("{}{}", base, self.primary_path);

        match self.post(&primary_url, &notification.primary_form()).await {
            Ok(()) => {
                info!(order_id = %order_id, status = %notification.status, "Webhook sent");
                return DeliveryOutcome::DeliveredPrimary;
            }
            Err(e) => warn!(order_id = %order_id, error = %e, "Primary webhook failed; trying legacy endpoint"),
        }

        let form = match notification.legacy_form() {
            Ok(form) => form,
            Err(e) => {
                error!(order_id = %order_id, error = %e, "Could not encode legacy webhook payload");
                return DeliveryOutcome::Failed;
            }
        };
        let legacy_url = format!("{}/?{}", base, self.legacy_query);

        match self.post(&legacy_url, &form).await {
            Ok(()) => {
                info!(order_id = %order_id, status = %notification.status, "Legacy webhook sent");
                DeliveryOutcome::DeliveredFallback
            }
            Err(e) => {
                error!(order_id = %order_id, error = %e, "Legacy webhook failed");
                DeliveryOutcome::Failed
            }
        }
    }

    /// POST a form; transport errors and statuses >= 400 are failures
    async fn post(&self, url: &str, form: &[(&'static str, String)]) -> AppResult<()> {
        let response = self
            .http
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(|e| AppError::Notification(e.to_string()))?;

        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(AppError::Notification(format!("HTTP {}", status.as_u16())));
        }
        Ok(())
    }
}

/// `scheme://host[:port]` of a store URL, without trailing slash
fn store_base_url(origin_url: &str) -> Option<String> {
    let url = url::Url::parse(origin_url.trim()).ok()?;
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}

fn webhook_nonce() -> String {
    hex::encode(rand::rng().random::<[u8; 16]>())
}
