//! HTTP routes module
//!
//! Route groups and the builder that combines them.

pub mod builder;
pub mod health;
pub mod payments;

pub use builder::RouteBuilder;
pub use health::HealthRoutes;
pub use payments::PaymentRoutes;
