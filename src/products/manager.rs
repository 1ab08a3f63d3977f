use anyhow::{Context, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use super::bridge;
use super::capability::SystemInfo;
use super::error::LookupError;
use super::fetcher::{Completion, ProductsFetcherV1, ProductsFetcherV2};
use super::models::{ProductIdentifier, StoreGeneration, StoreProduct, V1Product};
use crate::normalization::normalize;

pub type LookupResult = std::result::Result<HashSet<StoreProduct>, LookupError>;

/// Routes product lookups to the v1 or v2 storefront and exposes both the
/// callback and the async call style on top of either.
///
/// Callbacks for v2 lookups run on the runtime captured at construction;
/// v1 callbacks run wherever the v1 fetcher invokes its completion.
pub struct ProductsManager {
    fetcher_v1: Arc<dyn ProductsFetcherV1>,
    fetcher_v2: Arc<dyn ProductsFetcherV2>,
    system_info: Arc<SystemInfo>,
    dispatch: Handle,
}

impl ProductsManager {
    /// Build a manager bound to the current tokio runtime.
    pub fn new(
        fetcher_v1: Arc<dyn ProductsFetcherV1>,
        fetcher_v2: Arc<dyn ProductsFetcherV2>,
        system_info: Arc<SystemInfo>,
    ) -> Result<Self> {
        let dispatch = Handle::try_current()
            .context("ProductsManager must be created inside a tokio runtime")?;
        Ok(Self::with_handle(fetcher_v1, fetcher_v2, system_info, dispatch))
    }

    pub fn with_handle(
        fetcher_v1: Arc<dyn ProductsFetcherV1>,
        fetcher_v2: Arc<dyn ProductsFetcherV2>,
        system_info: Arc<SystemInfo>,
        dispatch: Handle,
    ) -> Self {
        Self {
            fetcher_v1,
            fetcher_v2,
            system_info,
            dispatch,
        }
    }

    pub fn system_info(&self) -> &SystemInfo {
        &self.system_info
    }

    /// Backend the next lookup would use. Recomputed on every call.
    pub fn backend_for_call(&self) -> StoreGeneration {
        if self.system_info.use_v2() {
            StoreGeneration::V2
        } else {
            StoreGeneration::V1
        }
    }

    /// Callback-style lookup. Returns immediately; `completion` fires exactly
    /// once. An empty request completes inline without touching a backend.
    pub fn products<F>(&self, identifiers: HashSet<ProductIdentifier>, completion: F)
    where
        F: FnOnce(LookupResult) + Send + 'static,
    {
        self.route(self.backend_for_call(), identifiers, completion);
    }

    /// Async lookup, delegating to the callback form through the bridge.
    pub async fn products_async(&self, identifiers: HashSet<ProductIdentifier>) -> LookupResult {
        let backend = self.backend_for_call();
        bridge::await_callback(|done| self.route(backend, identifiers, done))
            .await
            .unwrap_or(Err(LookupError::CompletionDropped { backend }))
    }

    fn route<F>(
        &self,
        backend: StoreGeneration,
        identifiers: HashSet<ProductIdentifier>,
        completion: F,
    ) where
        F: FnOnce(LookupResult) + Send + 'static,
    {
        if identifiers.is_empty() {
            debug!("products: empty request, nothing to fetch");
            completion(Ok(HashSet::new()));
            return;
        }

        debug!(
            ids = identifiers.len(),
            backend = %backend,
            prefer_v2 = self.system_info.prefer_v2(),
            "products: routing lookup"
        );

        match backend {
            StoreGeneration::V2 => {
                let fetcher = Arc::clone(&self.fetcher_v2);
                bridge::spawn_with_callback(
                    &self.dispatch,
                    async move { fetch_v2(fetcher.as_ref(), identifiers).await },
                    completion,
                );
            }
            StoreGeneration::V1 => {
                self.fetcher_v1.products(
                    identifiers,
                    Box::new(move |result| {
                        let outcome = result.map(normalize).map_err(|source| {
                            warn!(backend = "v1", error = %source, "products: fetch failed");
                            LookupError::adapter(StoreGeneration::V1, source)
                        });
                        completion(outcome);
                    }),
                );
            }
        }
    }

    /// Query the v2 storefront directly, ignoring the caller preference.
    /// Still refused when the platform does not support v2.
    pub async fn v2_products(&self, identifiers: HashSet<ProductIdentifier>) -> LookupResult {
        if !self.system_info.v2_support().is_supported() {
            return Err(LookupError::Unsupported {
                platform: self.system_info.platform(),
                version: self.system_info.platform_version(),
            });
        }
        if identifiers.is_empty() {
            return Ok(HashSet::new());
        }
        fetch_v2(self.fetcher_v2.as_ref(), identifiers).await
    }

    /// Raw v1 products, bypassing routing and normalization.
    pub fn v1_products(
        &self,
        identifiers: HashSet<ProductIdentifier>,
        completion: Completion<Vec<V1Product>>,
    ) {
        self.fetcher_v1.products(identifiers, completion);
    }

    /// Register a product the caller already holds; only v1 lookups use it.
    pub fn cache_product(&self, product: V1Product) {
        self.fetcher_v1.cache_product(product);
    }
}

async fn fetch_v2(
    fetcher: &dyn ProductsFetcherV2,
    identifiers: HashSet<ProductIdentifier>,
) -> LookupResult {
    match fetcher.products(identifiers).await {
        Ok(products) => Ok(normalize(products)),
        Err(source) => {
            warn!(backend = "v2", error = %source, "products: fetch failed");
            Err(LookupError::adapter(StoreGeneration::V2, source))
        }
    }
}
