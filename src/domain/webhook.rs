//! Status notifications pushed back to the originating store

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::Serialize;

use crate::shared::error::AppResult;

/// Terminal payment status reported to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional details attached to a notification
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebhookDetails {
    pub transaction_id: Option<String>,
    pub amount: Option<String>,
    pub reason: Option<String>,
    pub error: Option<String>,
}

impl WebhookDetails {
    pub fn transaction(id: impl Into<String>) -> Self {
        Self {
            transaction_id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// Signed notification body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookNotification {
    pub order_id: String,
    pub status: PaymentStatus,
    pub nonce: String,
    pub hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookNotification {
    pub fn new(order_id: String, status: PaymentStatus, nonce: String, hash: String, details: WebhookDetails) -> Self {
        Self {
            order_id,
            status,
            nonce,
            hash,
            transaction_id: details.transaction_id,
            amount: details.amount,
            reason: details.reason,
            error: details.error,
        }
    }

    /// Form fields for the primary endpoint, in a stable order
    pub fn primary_form(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("order_id", self.order_id.clone()),
            ("status", self.status.as_str().to_string()),
            ("nonce", self.nonce.clone()),
            ("hash", self.hash.clone()),
        ];
        let optional = [
            ("transaction_id", &self.transaction_id),
            ("amount", &self.amount),
            ("reason", &self.reason),
            ("error", &self.error),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                fields.push((key, value.clone()));
            }
        }
        fields
    }

    /// Base64 of the JSON form of the primary fields
    pub fn encoded_payload(&self) -> AppResult<String> {
        Ok(BASE64_STANDARD.encode(serde_json::to_vec(self)?))
    }

    /// Primary fields plus `payload` for the legacy endpoint
    pub fn legacy_form(&self) -> AppResult<Vec<(&'static str, String)>> {
        let mut fields = self.primary_form();
        fields.push(("payload", self.encoded_payload()?));
        Ok(fields)
    }
}

/// Result of the two-attempt delivery pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    DeliveredPrimary,
    DeliveredFallback,
    Failed,
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        !matches!(self, DeliveryOutcome::Failed)
    }
}
