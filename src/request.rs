//! Validation of route requests before exploration

use crate::catalog::Catalog;
use crate::explorer::{self, ExplorerConfig, RouteBranch, Search};
use crate::models::Quantity;

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Item {item} is not tradable. Tradable ones are:\n  {}", .known.join("\n  "))]
    UnknownItem { item: String, known: Vec<String> },

    #[error("Count must be a positive integer, got {0}")]
    NonPositiveCount(i64),
}

/// A route request that has been checked against a catalog.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub search: Search,
    pub quantity: Quantity,
    pub item: String,
}

impl RouteRequest {
    pub fn validate(search: Search, count: i64, item: &str, catalog: &Catalog) -> Result<Self, RequestError> {
        if !catalog.contains_item(item) {
            return Err(RequestError::UnknownItem {
                item: item.to_string(),
                known: catalog.known_items().iter().cloned().collect(),
            });
        }

        let count = u64::try_from(count)
            .ok()
            .filter(|&c| c > 0)
            .ok_or(RequestError::NonPositiveCount(count))?;

        Ok(Self {
            search,
            quantity: Quantity::from_count(count),
            item: item.to_string(),
        })
    }

    pub fn explore(&self, catalog: &Catalog, config: ExplorerConfig) -> Vec<RouteBranch> {
        explorer::find_routes(self.search, &self.quantity, &self.item, catalog, config)
    }
}
