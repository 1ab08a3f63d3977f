// HTTP-backed fetchers for both storefront generations.

pub mod client;
pub mod v1;
pub mod v2;

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::info;

use crate::config::ResolverConfig;
use crate::products::capability::SystemInfo;
use crate::products::manager::ProductsManager;
use client::StorefrontClient;
use v1::StoreFetcherV1;
use v2::StoreFetcherV2;

/// Wire a [`ProductsManager`] to the storefront described by `config`.
/// Must be called inside a tokio runtime.
pub fn build_manager(config: &ResolverConfig) -> Result<ProductsManager> {
    let runtime = Handle::try_current().context("storefront fetchers need a tokio runtime")?;
    let client = StorefrontClient::new(
        &config.base_url,
        config.request_timeout,
        config.throttle.clone(),
    )?;
    let system_info = Arc::new(SystemInfo::new(
        config.platform,
        config.platform_version,
        config.prefer_v2,
    ));

    info!(
        base_url = client.base_url(),
        platform = %config.platform,
        platform_version = %config.platform_version,
        v2_support = ?system_info.v2_support(),
        prefer_v2 = config.prefer_v2,
        "storefront: products manager ready"
    );

    Ok(ProductsManager::with_handle(
        Arc::new(StoreFetcherV1::new(client.clone(), runtime.clone())),
        Arc::new(StoreFetcherV2::new(client)),
        system_info,
        runtime,
    ))
}
