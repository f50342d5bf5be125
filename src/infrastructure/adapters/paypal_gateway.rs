//! PayPal REST adapter
//!
//! Talks to the Orders v2 and Payments v2 APIs with an OAuth2
//! client-credentials token that is cached until shortly before expiry.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::app_config::PayPalConfig;
use crate::domain::orders::{LineItem, RemoteCapture, RemoteOrder, RemoteRefund};
use crate::domain::ports::PaymentGateway;
use crate::infrastructure::adapters::paypal_models::{
    build_order_request, CaptureResponse, ErrorResponse, Money, RefundRequest, ResourceResponse,
    TokenResponse,
};
use crate::shared::error::{AppError, AppResult};

/// Seconds before expiry at which a cached token is refreshed
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

struct PayPalClient {
    http: Client,
    base_url: String,
    client_id: String,
    client_secret: SecretString,
    token: RwLock<Option<(String, DateTime<Utc>)>>,
}

/// Payment gateway backed by the PayPal REST API
pub struct PayPalGatewayAdapter {
    client: Option<PayPalClient>,
    proxy_url: String,
}

impl PayPalGatewayAdapter {
    /// Create the adapter. Missing credentials leave it uninitialized; every
    /// call then fails with a gateway error.
    pub fn new(config: &PayPalConfig, proxy_url: impl Into<String>) -> AppResult<Self> {
        let proxy_url = proxy_url.into();
        if !config.is_configured() {
            warn!("PayPal credentials are not configured; payment calls will fail");
            return Ok(Self { client: None, proxy_url });
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        info!(base_url = %config.api_base(), sandbox = config.sandbox, "PayPal gateway initialized");

        Ok(Self {
            client: Some(PayPalClient {
                http,
                base_url: config.api_base(),
                client_id: config.client_id.trim().to_string(),
                client_secret: SecretString::new(config.client_secret.expose_secret().trim().to_string()),
                token: RwLock::new(None),
            }),
            proxy_url,
        })
    }

    /// Provider ids are pasted into URL paths; only letters, digits and dashes pass
    fn provider_id<'a>(id: &'a str, what: &str) -> AppResult<&'a str> {
        let id = id.trim();
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            warn!(kind = %what, "Rejected malformed PayPal id");
            return Err(AppError::Validation(format!("Invalid PayPal {}", what)));
        }
        Ok(id)
    }

    fn client(&self) -> AppResult<&PayPalClient> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Gateway("PayPal client not initialized".to_string()))
    }
}

impl PayPalClient {
    async fn access_token(&self) -> AppResult<String> {
        {
            let cached = self.token.read().await;
            if let Some((token, expiry)) = &*cached {
                if *expiry > Utc::now() {
                    return Ok(token.clone());
                }
            }
        }

        let response = self
            .http
            .post(format!("{}/v1/oauth2/token", self.base_url))
            .basic_auth(&self.client_id, Some(self.client_secret.expose_secret()))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(status = %status, "PayPal authentication failed");
            return Err(AppError::Gateway("PayPal authentication failed".to_string()));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|_| AppError::Gateway("Invalid PayPal token response".to_string()))?;

        let expiry = Utc::now() + chrono::Duration::seconds(body.expires_in - TOKEN_REFRESH_MARGIN_SECS);
        *self.token.write().await = Some((body.access_token.clone(), expiry));
        debug!("Refreshed PayPal access token");
        Ok(body.access_token)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> AppResult<T> {
        let token = self.access_token().await?;
        let response = request
            .bearer_auth(token)
            .header("Prefer", "return=representation")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED {
                *self.token.write().await = None;
            }
            let error: ErrorResponse = response.json().await.unwrap_or_default();
            let message = error.describe();
            warn!(status = %status, error = %message, "PayPal request failed");
            return Err(AppError::Gateway(message));
        }

        response
            .json::<T>()
            .await
            .map_err(|_| AppError::Gateway("Unexpected response from PayPal".to_string()))
    }
}

#[async_trait]
impl PaymentGateway for PayPalGatewayAdapter {
    async fn create_order(
        &self,
        order_id: &str,
        amount: Decimal,
        currency: &str,
        items: &[LineItem],
    ) -> AppResult<RemoteOrder> {
        let client = self.client()?;
        let body = build_order_request(order_id, amount, currency, items, &self.proxy_url);
        let request = client
            .http
            .post(format!("{}/v2/checkout/orders", client.base_url))
            .json(&body);

        let order: ResourceResponse = client.send(request).await?;
        info!(order_id = %order_id, paypal_order_id = %order.id, "Created PayPal order");
        Ok(order.into())
    }

    async fn capture_order(&self, remote_order_id: &str) -> AppResult<RemoteCapture> {
        let remote_order_id = Self::provider_id(remote_order_id, "order id")?;
        let client = self.client()?;
        let request = client
            .http
            .post(format!("{}/v2/checkout/orders/{}/capture", client.base_url, remote_order_id))
            .json(&serde_json::json!({}));

        let response: CaptureResponse = client.send(request).await?;
        let capture = response.into_capture()?;
        info!(paypal_order_id = %remote_order_id, capture_id = %capture.id, "Captured PayPal order");
        Ok(capture)
    }

    async fn refund_capture(
        &self,
        capture_id: &str,
        amount: Decimal,
        currency: &str,
        reason: &str,
    ) -> AppResult<RemoteRefund> {
        let capture_id = Self::provider_id(capture_id, "capture id")?;
        let client = self.client()?;
        let body = RefundRequest {
            amount: Money::new(currency, amount),
            note_to_payer: reason.trim().to_string(),
        };
        let request = client
            .http
            .post(format!("{}/v2/payments/captures/{}/refund", client.base_url, capture_id))
            .json(&body);

        let refund: ResourceResponse = client.send(request).await?;
        info!(capture_id = %capture_id, refund_id = %refund.id, "Refunded PayPal capture");
        Ok(refund.into())
    }

    fn is_configured(&self) -> bool {
        self.client.is_some()
    }
}
