use std::collections::HashMap;

use crate::config::app_config::CatalogConfig;
use crate::domain::ports::ProductNameResolver;

/// Destination-store product names loaded from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticProductCatalog {
    names: HashMap<String, String>,
}

impl StaticProductCatalog {
    pub fn new(names: HashMap<String, String>) -> Self {
        Self { names }
    }

    pub fn from_config(config: &CatalogConfig) -> Self {
        Self::new(config.product_names.clone())
    }
}

impl ProductNameResolver for StaticProductCatalog {
    fn product_name(&self, product_id: &str) -> Option<String> {
        self.names
            .get(product_id.trim())
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
    }
}
