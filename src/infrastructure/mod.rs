//! Infrastructure layer - External concerns and adapters
//!
//! This module contains the adapters behind the domain ports and the HTTP
//! surface.

pub mod adapters;
pub mod http;

pub use adapters::{ConfigCredentialStore, LedgerStore, PayPalGatewayAdapter, StaticProductCatalog};
