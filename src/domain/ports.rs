//! Ports the application layer depends on. Adapters live in
//! `infrastructure::adapters`.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::credentials::CredentialEntry;
use crate::domain::orders::{LineItem, RemoteCapture, RemoteOrder, RemoteRefund};
use crate::shared::error::AppResult;

/// Registry of client store secrets
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Credential whose domain matches `caller_host` under the configured policy
    async fn find_by_domain(&self, caller_host: &str) -> AppResult<Option<Arc<CredentialEntry>>>;

    /// Every registered credential, for calls that cannot be attributed to a domain
    async fn all(&self) -> AppResult<Vec<Arc<CredentialEntry>>>;
}

/// Result of recording a nonce against an order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceVerdict {
    /// Recorded; `uses` counts records for the order including this one
    Accepted { uses: usize },
    /// The order already reached the ceiling; nothing was recorded
    CeilingReached,
}

/// Process-wide record of nonces seen per order
#[async_trait]
pub trait NonceLedger: Send + Sync {
    /// Check the ceiling and record `nonce` for `order_id` atomically
    async fn record(&self, order_id: &str, nonce: &str) -> AppResult<NonceVerdict>;

    /// Number of records held for `order_id`
    async fn usage(&self, order_id: &str) -> usize;

    /// Number of distinct orders retained
    async fn tracked_orders(&self) -> usize;
}

/// Remote payment provider
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(
        &self,
        order_id: &str,
        amount: Decimal,
        currency: &str,
        items: &[LineItem],
    ) -> AppResult<RemoteOrder>;

    async fn capture_order(&self, remote_order_id: &str) -> AppResult<RemoteCapture>;

    async fn refund_capture(
        &self,
        capture_id: &str,
        amount: Decimal,
        currency: &str,
        reason: &str,
    ) -> AppResult<RemoteRefund>;

    /// Whether credentials were supplied at startup
    fn is_configured(&self) -> bool;
}

/// Looks up the destination store's canonical product name
pub trait ProductNameResolver: Send + Sync {
    fn product_name(&self, product_id: &str) -> Option<String>;
}
