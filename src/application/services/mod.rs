//! Application services - Orchestration of domain logic

pub mod authenticator;
pub mod notifier;
pub mod orchestrator;

pub use authenticator::{AuthContext, RequestAuthenticator, Verified};
pub use notifier::WebhookNotifier;
pub use orchestrator::{CaptureOrderRequest, CreateOrderRequest, OrderOrchestrator, RefundRequest, RefundResponse};
