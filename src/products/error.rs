use thiserror::Error;

use super::capability::{Platform, PlatformVersion};
use super::models::StoreGeneration;

/// Failure delivered by a product lookup.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The selected fetcher reported a failure; `source` is its original cause.
    #[error("{backend} product request failed: {source}")]
    Adapter {
        backend: StoreGeneration,
        #[source]
        source: anyhow::Error,
    },
    /// A fetcher dropped its completion without ever invoking it.
    #[error("{backend} product fetcher dropped its completion before resolving")]
    CompletionDropped { backend: StoreGeneration },
    #[error("v2 storefront is unavailable on {platform} {version}")]
    Unsupported {
        platform: Platform,
        version: PlatformVersion,
    },
}

impl LookupError {
    pub fn adapter(backend: StoreGeneration, source: anyhow::Error) -> Self {
        LookupError::Adapter { backend, source }
    }

    /// Original fetcher error, if this failure came from a fetcher.
    pub fn cause(&self) -> Option<&anyhow::Error> {
        match self {
            LookupError::Adapter { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Storefront generation the failed lookup was routed to.
    pub fn backend(&self) -> StoreGeneration {
        match self {
            LookupError::Adapter { backend, .. } | LookupError::CompletionDropped { backend } => {
                *backend
            }
            LookupError::Unsupported { .. } => StoreGeneration::V2,
        }
    }
}
