//! Domain layer - Core business logic and domain models
//!
//! Signing profiles, credential matching, checkout payloads, order
//! reconciliation and webhook notifications. Nothing here performs I/O;
//! the ports describe what the application layer needs from the outside.

pub mod checkout;
pub mod credentials;
pub mod health;
pub mod money;
pub mod orders;
pub mod ports;
pub mod signing;
pub mod webhook;

pub use checkout::{CheckoutPayload, CheckoutSession, ProductLine, SignedRequest};
pub use credentials::{CredentialEntry, DomainMatchPolicy};
pub use health::{HealthResponse, HealthStatus};
pub use money::TextValue;
pub use orders::{LineItem, OrderFlow, OrderState, RemoteCapture, RemoteOrder, RemoteRefund};
pub use ports::{CredentialStore, NonceLedger, NonceVerdict, PaymentGateway, ProductNameResolver};
pub use webhook::{DeliveryOutcome, PaymentStatus, WebhookDetails, WebhookNotification};
