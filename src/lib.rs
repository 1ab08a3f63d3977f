//! Storefront product resolution across two backend generations.
//!
//! [`ProductsManager`] routes each lookup to the v1 (callback) or v2 (async)
//! fetcher depending on platform capability and the caller's preference, and
//! exposes both call styles regardless of which backend serviced the request.
pub mod config;
pub mod normalization;
pub mod products;
pub mod storefront;
pub mod telemetry;

pub mod util {
    pub mod env;
}

pub use config::ResolverConfig;
pub use products::capability::{
    CapabilityGate, Platform, PlatformVersion, SystemInfo, SystemPlatformGate, V2Support,
};
pub use products::error::LookupError;
pub use products::fetcher::{Completion, ProductsFetcherV1, ProductsFetcherV2};
pub use products::manager::{LookupResult, ProductsManager};
pub use products::models::{
    ProductIdentifier, StoreGeneration, StoreProduct, StoreProductSource, V1Product, V2Product,
};
