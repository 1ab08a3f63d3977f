use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, info};

use crate::products::models::{ProductIdentifier, V1Product, V2Product};
use crate::util::env::env_parse;

/// Shared HTTP access to the storefront for both generations.
///
/// - `GET {base}/v1/products?ids=a&ids=b` returns a JSON array of v1 products
/// - `GET {base}/v2/products?ids=a&ids=b` returns `{"products": [...]}`
///
/// Each identifier travels as its own `ids` pair, so identifiers may contain
/// any character.
#[derive(Clone)]
pub struct StorefrontClient {
    http: Client,
    base_url: String,
    throttle: RequestThrottle,
}

#[derive(Debug, Deserialize)]
struct V2ProductsResponse {
    #[serde(default)]
    products: Vec<V2Product>,
}

impl StorefrontClient {
    pub fn new(base_url: &str, timeout: Duration, throttle: RateLimitSettings) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("storefront-products/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("failed to build storefront HTTP client")?;

        match throttle.per_request_interval() {
            Some(interval) => info!(
                max_ops_per_window = throttle.max_ops_per_window,
                window_secs = throttle.window_secs,
                interval_ms = interval.as_millis(),
                "storefront: HTTP throttle configured"
            ),
            None => debug!("storefront: HTTP throttle disabled"),
        }

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            throttle: RequestThrottle::new(throttle),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn fetch_v1(&self, ids: &HashSet<ProductIdentifier>) -> Result<Vec<V1Product>> {
        self.get_products("v1/products", ids).await
    }

    pub async fn fetch_v2(&self, ids: &HashSet<ProductIdentifier>) -> Result<Vec<V2Product>> {
        let body: V2ProductsResponse = self.get_products("v2/products", ids).await?;
        Ok(body.products)
    }

    async fn get_products<T: DeserializeOwned>(
        &self,
        path: &str,
        ids: &HashSet<ProductIdentifier>,
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        let query = id_query(ids);

        self.throttle.wait().await;
        debug!(url = %url, ids = ids.len(), "storefront: requesting");

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .query(&query)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error".to_string());
            anyhow::bail!("storefront {} returned status {}: {}", path, status, error_text);
        }

        response
            .json()
            .await
            .with_context(|| format!("failed to parse {path} response"))
    }
}

/// Sorted so identical requests produce identical URLs.
fn id_query(ids: &HashSet<ProductIdentifier>) -> Vec<(&'static str, &str)> {
    let mut sorted: Vec<&str> = ids.iter().map(ProductIdentifier::as_str).collect();
    sorted.sort_unstable();
    sorted.into_iter().map(|id| ("ids", id)).collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitSettings {
    pub max_ops_per_window: u32,
    pub window_secs: u64,
}

impl RateLimitSettings {
    /// No throttling.
    pub const fn disabled() -> Self {
        Self {
            max_ops_per_window: 0,
            window_secs: 0,
        }
    }

    pub fn from_env(
        max_key: &str,
        window_key: &str,
        default_max: u32,
        default_window: u64,
    ) -> Self {
        Self {
            max_ops_per_window: env_parse(max_key, default_max),
            window_secs: env_parse(window_key, default_window),
        }
    }

    pub fn per_request_interval(&self) -> Option<Duration> {
        if self.max_ops_per_window == 0 || self.window_secs == 0 {
            None
        } else {
            Some(Duration::from_secs_f64(
                self.window_secs as f64 / self.max_ops_per_window as f64,
            ))
        }
    }
}

#[derive(Clone)]
struct RequestThrottle {
    interval: Option<Duration>,
    next_allowed: Arc<Mutex<Instant>>,
}

impl RequestThrottle {
    fn new(settings: RateLimitSettings) -> Self {
        Self {
            interval: settings.per_request_interval(),
            next_allowed: Arc::new(Mutex::new(Instant::now())),
        }
    }

    async fn wait(&self) {
        let Some(interval) = self.interval else {
            return;
        };

        let mut next_allowed = self.next_allowed.lock().await;
        let now = Instant::now();
        let wait_until = (*next_allowed).max(now);
        let sleep_duration = wait_until.saturating_duration_since(now);
        *next_allowed = wait_until + interval;
        drop(next_allowed);

        if !sleep_duration.is_zero() {
            sleep(sleep_duration).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client(base_url: &str) -> StorefrontClient {
        StorefrontClient::new(base_url, Duration::from_secs(5), RateLimitSettings::disabled())
            .unwrap()
    }

    fn ids(raw: &[&str]) -> HashSet<ProductIdentifier> {
        raw.iter().map(|id| ProductIdentifier::from(*id)).collect()
    }

    #[tokio::test]
    async fn throttle_sleeps_between_requests() {
        let settings = RateLimitSettings {
            max_ops_per_window: 100,
            window_secs: 1,
        };
        let delay = settings.per_request_interval().unwrap();
        let throttle = RequestThrottle::new(settings);

        // First call should be immediate.
        throttle.wait().await;

        let start = Instant::now();
        throttle.wait().await;
        let elapsed = start.elapsed();

        assert!(
            elapsed >= delay,
            "expected wait of at least {:?}, but got {:?}",
            delay,
            elapsed
        );
    }

    #[test]
    fn zero_settings_disable_throttle() {
        assert_eq!(RateLimitSettings::disabled().per_request_interval(), None);
        let half = RateLimitSettings {
            max_ops_per_window: 2,
            window_secs: 1,
        };
        assert_eq!(half.per_request_interval(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn ids_are_sent_as_sorted_pairs() {
        let request = ids(&["b", "c", "a"]);
        assert_eq!(id_query(&request), vec![("ids", "a"), ("ids", "b"), ("ids", "c")]);
    }

    #[tokio::test]
    async fn fetch_v2_decodes_wrapped_products() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v2/products")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("ids".into(), "annual".into()),
                Matcher::UrlEncoded("ids".into(), "monthly".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"products":[
                    {"id":"annual","displayName":"Annual","price":29.99},
                    {"id":"monthly","displayName":"Monthly","price":2.99}
                ]}"#,
            )
            .create_async()
            .await;

        let products = client(&server.url())
            .fetch_v2(&ids(&["monthly", "annual"]))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].display_name, "Annual");
    }

    #[test]
    fn comma_in_identifier_does_not_split_it() {
        let single = ids(&["a,b"]);
        let pair = ids(&["a", "b"]);
        assert_eq!(id_query(&single), vec![("ids", "a,b")]);
        assert_ne!(id_query(&single), id_query(&pair));
    }

    #[tokio::test]
    async fn comma_identifier_reaches_the_server_intact() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v2/products")
            .match_query(Matcher::UrlEncoded("ids".into(), "a,b".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"products":[{"id":"a,b","displayName":"Bundle","price":1.0}]}"#)
            .create_async()
            .await;

        let products = client(&server.url()).fetch_v2(&ids(&["a,b"])).await.unwrap();

        mock.assert_async().await;
        assert_eq!(products[0].id.as_str(), "a,b");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/products")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("maintenance")
            .create_async()
            .await;

        let err = client(&server.url())
            .fetch_v1(&ids(&["a"]))
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("503"), "unexpected error: {message}");
        assert!(message.contains("maintenance"), "unexpected error: {message}");
    }
}
