use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::products::fetcher::{Completion, ProductsFetcherV1};
use crate::products::models::{ProductIdentifier, V1Product};
use crate::storefront::client::StorefrontClient;

type ProductCache = Arc<Mutex<HashMap<ProductIdentifier, V1Product>>>;

/// Callback-style v1 storefront fetcher.
///
/// Keeps every product it has seen (fetched or registered through
/// `cache_product`). Requests fully covered by the cache complete inline;
/// otherwise only the missing identifiers are fetched on `runtime` and the
/// completion runs there.
pub struct StoreFetcherV1 {
    client: StorefrontClient,
    cache: ProductCache,
    runtime: Handle,
}

impl StoreFetcherV1 {
    pub fn new(client: StorefrontClient, runtime: Handle) -> Self {
        Self {
            client,
            cache: Arc::new(Mutex::new(HashMap::new())),
            runtime,
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Split a request into cached products and identifiers still to fetch.
    fn partition(
        &self,
        identifiers: HashSet<ProductIdentifier>,
    ) -> (Vec<V1Product>, HashSet<ProductIdentifier>) {
        let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let mut hits = Vec::new();
        let mut missing = HashSet::new();
        for id in identifiers {
            match cache.get(&id) {
                Some(product) => hits.push(product.clone()),
                None => {
                    missing.insert(id);
                }
            }
        }
        (hits, missing)
    }
}

impl ProductsFetcherV1 for StoreFetcherV1 {
    fn products(
        &self,
        identifiers: HashSet<ProductIdentifier>,
        completion: Completion<Vec<V1Product>>,
    ) {
        let (mut hits, missing) = self.partition(identifiers);
        if missing.is_empty() {
            debug!(ids = hits.len(), "storefront v1: served from cache");
            completion(Ok(hits));
            return;
        }

        let client = self.client.clone();
        let cache = Arc::clone(&self.cache);
        self.runtime.spawn(async move {
            debug!(cached = hits.len(), missing = missing.len(), "storefront v1: fetching");
            let result = client.fetch_v1(&missing).await.map(|fetched| {
                let mut cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
                for product in &fetched {
                    cache.insert(product.product_identifier.clone(), product.clone());
                }
                drop(cache);
                hits.extend(fetched);
                hits
            });
            if let Err(e) = &result {
                warn!(error = %e, "storefront v1: request failed");
            }
            completion(result);
        });
    }

    fn cache_product(&self, product: V1Product) {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.insert(product.product_identifier.clone(), product);
    }
}
