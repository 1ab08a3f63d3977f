// Boundary traits for the two storefront generations.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;

use super::models::{ProductIdentifier, V1Product, V2Product};

/// One-shot completion. `FnOnce` means it can be invoked at most once.
pub type Completion<T> = Box<dyn FnOnce(Result<T>) + Send + 'static>;

/// Callback-style v1 storefront.
pub trait ProductsFetcherV1: Send + Sync {
    /// Start a lookup; `completion` runs exactly once on a context of the
    /// fetcher's choosing.
    fn products(
        &self,
        identifiers: HashSet<ProductIdentifier>,
        completion: Completion<Vec<V1Product>>,
    );

    /// Remember an already-known product so later lookups can skip the network.
    fn cache_product(&self, product: V1Product);
}

/// Async v2 storefront.
#[async_trait]
pub trait ProductsFetcherV2: Send + Sync {
    async fn products(&self, identifiers: HashSet<ProductIdentifier>) -> Result<Vec<V2Product>>;
}
