//! Infrastructure adapters module
//!
//! Implementations of the domain ports: configuration-backed credentials,
//! the nonce ledger, the PayPal REST client and the product catalog.

pub mod credential_store;
pub mod nonce_ledger;
pub mod paypal_gateway;
pub mod paypal_models;
pub mod product_catalog;

pub use credential_store::ConfigCredentialStore;
pub use nonce_ledger::LedgerStore;
pub use paypal_gateway::PayPalGatewayAdapter;
pub use product_catalog::StaticProductCatalog;
