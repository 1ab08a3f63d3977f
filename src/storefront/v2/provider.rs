use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::debug;

use crate::products::fetcher::ProductsFetcherV2;
use crate::products::models::{ProductIdentifier, V2Product};
use crate::storefront::client::StorefrontClient;

/// Async v2 storefront fetcher. Stateless; every lookup hits the network.
pub struct StoreFetcherV2 {
    client: StorefrontClient,
}

impl StoreFetcherV2 {
    pub fn new(client: StorefrontClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProductsFetcherV2 for StoreFetcherV2 {
    async fn products(&self, identifiers: HashSet<ProductIdentifier>) -> Result<Vec<V2Product>> {
        debug!(ids = identifiers.len(), "storefront v2: fetching");
        self.client.fetch_v2(&identifiers).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storefront::client::RateLimitSettings;
    use mockito::Matcher;
    use std::time::Duration;

    #[tokio::test]
    async fn malformed_body_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/products")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("not json")
            .create_async()
            .await;

        let client = StorefrontClient::new(
            &server.url(),
            Duration::from_secs(5),
            RateLimitSettings::disabled(),
        )
        .unwrap();
        let fetcher = StoreFetcherV2::new(client);

        let err = fetcher
            .products([ProductIdentifier::from("annual")].into_iter().collect())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("v2/products"));
    }
}
