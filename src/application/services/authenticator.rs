//! Request authentication
//!
//! Verifies store-signed payloads against the credential registered for the
//! caller's domain, enforces the per-order nonce ceiling and issues the
//! session nonces that tie the checkout page to its create/capture calls.

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use crate::domain::checkout::CheckoutPayload;
use crate::domain::credentials::{host_of, CredentialEntry};
use crate::domain::money::parse_amount;
use crate::domain::ports::{CredentialStore, NonceLedger, NonceVerdict};
use crate::domain::signing::{self, CheckoutClaims, RefundClaims, SessionNonceIssuer};
use crate::shared::error::{AppError, AppResult};
use crate::shared::LoggingUtils;

/// Out-of-band request metadata used to attribute a call to a store
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    pub referer: Option<String>,
}

impl AuthContext {
    pub fn from_referer(referer: Option<String>) -> Self {
        Self { referer }
    }
}

/// Outcome of a successful checkout verification
#[derive(Debug, Clone)]
pub enum Verified {
    /// Signature checked against this store's credential
    Store(Arc<CredentialEntry>),
    /// Testing mode skipped every check
    Bypassed,
}

pub struct RequestAuthenticator {
    credentials: Arc<dyn CredentialStore>,
    ledger: Arc<dyn NonceLedger>,
    sessions: SessionNonceIssuer,
    proxy_host: Option<String>,
    testing_mode: bool,
}

impl RequestAuthenticator {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        ledger: Arc<dyn NonceLedger>,
        sessions: SessionNonceIssuer,
        proxy_url: &str,
        testing_mode: bool,
    ) -> Self {
        Self {
            credentials,
            ledger,
            sessions,
            proxy_host: host_of(proxy_url),
            testing_mode,
        }
    }

    pub fn testing_mode(&self) -> bool {
        self.testing_mode
    }

    /// Host the call is attributed to: the Referer host, unless it is absent
    /// or points at this proxy, in which case the payload's return URL host
    pub fn resolve_caller_host(&self, ctx: &AuthContext, payload: &CheckoutPayload) -> Option<String> {
        let referer_host = ctx.referer.as_deref().and_then(host_of);
        match referer_host {
            Some(host) if Some(&host) != self.proxy_host.as_ref() => Some(host),
            _ => payload.return_url.as_deref().and_then(host_of),
        }
    }

    /// Verify a checkout-signed payload and record its nonce
    pub async fn verify_checkout(&self, ctx: &AuthContext, payload: &CheckoutPayload) -> AppResult<Verified> {
        if self.testing_mode {
            warn!(order_id = %payload.order_id(), "Testing mode: request verification bypassed");
            return Ok(Verified::Bypassed);
        }

        let order_id = payload.order_id();
        let signed = payload.signed_request().ok_or_else(|| {
            LoggingUtils::log_security_event("missing_fields", "Missing verification fields", &order_id);
            AppError::Auth("Invalid data signature".to_string())
        })?;

        let host = self.resolve_caller_host(ctx, payload).ok_or_else(|| {
            LoggingUtils::log_security_event("unknown_caller", "Caller domain could not be determined", &order_id);
            AppError::Auth("Invalid data signature".to_string())
        })?;

        let credential = self.credentials.find_by_domain(&host).await?.ok_or_else(|| {
            LoggingUtils::log_security_event("domain_not_allowed", &format!("Domain not allowed: {}", host), &order_id);
            AppError::Auth("Invalid data signature".to_string())
        })?;

        let claims = CheckoutClaims {
            order_id: &signed.order_id,
            nonce: &signed.nonce,
        };
        if !signing::verify(&credential.secret, &claims, &signed.hash) {
            LoggingUtils::log_security_event("invalid_hash", "Checkout signature mismatch", &order_id);
            return Err(AppError::Auth("Invalid data signature".to_string()));
        }

        match self.ledger.record(&signed.order_id, &signed.nonce).await? {
            NonceVerdict::Accepted { .. } => Ok(Verified::Store(credential)),
            NonceVerdict::CeilingReached => {
                LoggingUtils::log_security_event("nonce_ceiling", "Too many nonce attempts", &order_id);
                Err(AppError::Auth("Too many attempts for this order".to_string()))
            }
        }
    }

    /// Verify a refund hash against every registered credential. `amount` is
    /// the amount text exactly as the store sent it.
    pub async fn verify_refund(
        &self,
        order_id: &str,
        nonce: &str,
        amount: &str,
        hash: &str,
    ) -> AppResult<Arc<CredentialEntry>> {
        // Stores may hash the amount as sent ("10.00") or in short form ("10")
        let mut amounts = vec![amount.to_string()];
        if let Some(short) = parse_amount(amount).map(|a| a.normalize().to_string()) {
            if short != amount {
                amounts.push(short);
            }
        }

        let matched = self.credentials.all().await?.into_iter().find(|entry| {
            amounts.iter().any(|candidate| {
                let claims = RefundClaims { order_id, nonce, amount: candidate.as_str() };
                signing::verify(&entry.secret, &claims, hash)
            })
        });

        matched.ok_or_else(|| {
            LoggingUtils::log_security_event("invalid_hash", "Refund signature mismatch", order_id);
            AppError::Auth("Invalid refund request".to_string())
        })
    }

    pub fn issue_session_nonce(&self, order_id: &str) -> String {
        self.sessions.issue(order_id, Utc::now())
    }

    pub fn verify_session_nonce(&self, order_id: &str, nonce: Option<&str>) -> AppResult<()> {
        match nonce {
            Some(nonce) if self.sessions.verify(order_id, nonce, Utc::now()) => Ok(()),
            _ => {
                LoggingUtils::log_security_event("invalid_nonce", "Session nonce rejected", order_id);
                Err(AppError::InvalidNonce)
            }
        }
    }
}
