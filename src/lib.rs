//! PayPal proxy bridge
//!
//! Takes PayPal payments on behalf of client stores that cannot talk to
//! PayPal themselves. Stores hand the buyer a signed checkout payload; the
//! bridge verifies it, runs the PayPal order through create, capture and
//! refund, and reports the outcome back to the store by webhook.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod shared;

#[cfg(test)]
mod tests;

pub use config::AppConfig;
pub use infrastructure::http::HttpServer;
pub use shared::error::{AppError, AppResult};

/// Application result type
pub type Result<T> = std::result::Result<T, shared::error::AppError>;
