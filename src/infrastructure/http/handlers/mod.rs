//! HTTP route handlers module
//!
//! Handlers are thin: they build the request context, call the
//! orchestrator and format the result.

pub mod checkout;
pub mod health;
pub mod orders;
pub mod rejections;

pub use checkout::handle_checkout_request;
pub use health::handle_health_request;
pub use orders::{handle_capture_order_request, handle_create_order_request, handle_refund_request};
pub use rejections::handle_rejection;
