//! HMAC signing profiles
//!
//! Each cross-site message is signed under its own profile: a fixed message
//! template, the store's shared secret and HMAC-SHA256 as digest. Profiles
//! are distinct types so a hash produced for one call site can never be
//! checked against another profile's template by accident.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Named signing profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningProfile {
    /// `order_id ++ nonce`, signed by the store for checkout/create/capture
    CheckoutVerify,
    /// `order_id ++ nonce ++ amount`, signed by the store for refunds
    RefundVerify,
    /// `order_id ++ status ++ nonce`, signed by the proxy for webhooks
    WebhookSign,
    /// `wc-paypal-proxy-{order_id}|{tick}`, signed by the proxy for its own iframe session
    SessionNonce,
}

impl SigningProfile {
    pub fn name(&self) -> &'static str {
        match self {
            SigningProfile::CheckoutVerify => "checkout-verify",
            SigningProfile::RefundVerify => "refund-verify",
            SigningProfile::WebhookSign => "webhook-sign",
            SigningProfile::SessionNonce => "session-nonce",
        }
    }
}

/// A message that can be signed under exactly one profile
pub trait SignedMessage {
    const PROFILE: SigningProfile;

    /// Bytes fed to the MAC
    fn message(&self) -> String;
}

/// Claims of a store-signed checkout payload
#[derive(Debug, Clone, Copy)]
pub struct CheckoutClaims<'a> {
    pub order_id: &'a str,
    pub nonce: &'a str,
}

impl SignedMessage for CheckoutClaims<'_> {
    const PROFILE: SigningProfile = SigningProfile::CheckoutVerify;

    fn message(&self) -> String {
        format!("{}{}", self.order_id, self.nonce)
    }
}

/// Claims of a store-signed refund request. `amount` is the text exactly as
/// transmitted by the store.
#[derive(Debug, Clone, Copy)]
pub struct RefundClaims<'a> {
    pub order_id: &'a str,
    pub nonce: &'a str,
    pub amount: &'a str,
}

impl SignedMessage for RefundClaims<'_> {
    const PROFILE: SigningProfile = SigningProfile::RefundVerify;

    fn message(&self) -> String {
        format!("{}{}{}", self.order_id, self.nonce, self.amount)
    }
}

/// Claims of a proxy-signed webhook notification
#[derive(Debug, Clone, Copy)]
pub struct WebhookClaims<'a> {
    pub order_id: &'a str,
    pub status: &'a str,
    pub nonce: &'a str,
}

impl SignedMessage for WebhookClaims<'_> {
    const PROFILE: SigningProfile = SigningProfile::WebhookSign;

    fn message(&self) -> String {
        format!("{}{}{}", self.order_id, self.status, self.nonce)
    }
}

#[derive(Debug, Clone, Copy)]
struct SessionClaims<'a> {
    order_id: &'a str,
    tick: i64,
}

impl SignedMessage for SessionClaims<'_> {
    const PROFILE: SigningProfile = SigningProfile::SessionNonce;

    fn message(&self) -> String {
        format!("wc-paypal-proxy-{}|{}", self.order_id, self.tick)
    }
}

/// Sign `claims` with `secret`, returning lower-case hex
pub fn sign<M: SignedMessage>(secret: &SecretString, claims: &M) -> String {
    hex::encode(mac(secret, claims))
}

/// Verify a hex signature in constant time
pub fn verify<M: SignedMessage>(secret: &SecretString, claims: &M, provided_hex: &str) -> bool {
    let expected = sign(secret, claims);
    let provided = provided_hex.trim().as_bytes();
    if expected.len() != provided.len() {
        return false;
    }
    expected.as_bytes().ct_eq(provided).into()
}

fn mac<M: SignedMessage>(secret: &SecretString, claims: &M) -> Vec<u8> {
    let mut mac = match HmacSha256::new_from_slice(secret.expose_secret().as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC-SHA256 accepts any key length"),
    };
    mac.update(claims.message().as_bytes());
    mac.finalize().into_bytes().to_vec()
}

/// Issues and checks the short-lived nonces that tie the checkout iframe's
/// create/capture calls to the page the proxy rendered.
pub struct SessionNonceIssuer {
    secret: SecretString,
    tick_seconds: i64,
}

impl SessionNonceIssuer {
    /// Nonces stay valid for between half and all of `ttl_hours`
    pub fn new(secret: SecretString, ttl_hours: u64) -> Self {
        let tick_seconds = ((ttl_hours.max(2) * 3600) / 2) as i64;
        Self { secret, tick_seconds }
    }

    fn tick(&self, now: chrono::DateTime<chrono::Utc>) -> i64 {
        now.timestamp().div_euclid(self.tick_seconds)
    }

    pub fn issue(&self, order_id: &str, now: chrono::DateTime<chrono::Utc>) -> String {
        let claims = SessionClaims { order_id, tick: self.tick(now) };
        let mut nonce = sign(&self.secret, &claims);
        nonce.truncate(20);
        nonce
    }

    /// Accepts nonces issued in the current or the previous tick
    pub fn verify(&self, order_id: &str, nonce: &str, now: chrono::DateTime<chrono::Utc>) -> bool {
        let nonce = nonce.trim();
        if nonce.is_empty() || order_id.is_empty() {
            return false;
        }
        let current = self.tick(now);
        [current, current - 1].iter().any(|tick| {
            let claims = SessionClaims { order_id, tick: *tick };
            let mut expected = sign(&self.secret, &claims);
            expected.truncate(20);
            expected.len() == nonce.len() && bool::from(expected.as_bytes().ct_eq(nonce.as_bytes()))
        })
    }
}
