use std::time::Duration;
use tracing::warn;

use crate::products::capability::{Platform, PlatformVersion};
use crate::storefront::client::RateLimitSettings;
use crate::util::env::{env_flag, env_opt, env_parse};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Runtime settings for building a [`crate::ProductsManager`] against a storefront.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub base_url: String,
    pub prefer_v2: bool,
    pub platform: Platform,
    pub platform_version: PlatformVersion,
    pub request_timeout: Duration,
    pub throttle: RateLimitSettings,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            prefer_v2: false,
            platform: Platform::Ios,
            platform_version: Platform::Ios.v2_minimum(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            throttle: RateLimitSettings::disabled(),
        }
    }
}

impl ResolverConfig {
    /// Read settings from the environment (and `.env`), falling back to defaults.
    ///
    /// | variable | default |
    /// |---|---|
    /// | `STOREFRONT_BASE_URL` | `http://localhost:8080` |
    /// | `PRODUCTS_PREFER_V2` | `false` |
    /// | `PRODUCTS_PLATFORM` | `ios` |
    /// | `PRODUCTS_PLATFORM_VERSION` | v2 minimum of the platform (`15.0` for ios) |
    /// | `PRODUCTS_REQUEST_TIMEOUT_SECS` | `30` |
    /// | `STOREFRONT_MAX_OPS_PER_WINDOW` / `STOREFRONT_WINDOW_SECS` | `0` (throttle off) |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let platform = env_opt("PRODUCTS_PLATFORM")
            .map(|raw| parse_or_warn("PRODUCTS_PLATFORM", &raw, defaults.platform))
            .unwrap_or(defaults.platform);
        let platform_version =
            platform_version_or_minimum(platform, env_opt("PRODUCTS_PLATFORM_VERSION").as_deref());

        Self {
            base_url: env_opt("STOREFRONT_BASE_URL").unwrap_or(defaults.base_url),
            prefer_v2: env_flag("PRODUCTS_PREFER_V2", defaults.prefer_v2),
            platform,
            platform_version,
            request_timeout: Duration::from_secs(env_parse(
                "PRODUCTS_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )),
            throttle: RateLimitSettings::from_env(
                "STOREFRONT_MAX_OPS_PER_WINDOW",
                "STOREFRONT_WINDOW_SECS",
                0,
                0,
            ),
        }
    }
}

/// Unset or invalid versions fall back to the platform's v2 minimum.
fn platform_version_or_minimum(platform: Platform, raw: Option<&str>) -> PlatformVersion {
    match raw {
        Some(raw) => parse_or_warn("PRODUCTS_PLATFORM_VERSION", raw, platform.v2_minimum()),
        None => platform.v2_minimum(),
    }
}

fn parse_or_warn<T>(key: &str, raw: &str, default: T) -> T
where
    T: std::str::FromStr<Err = anyhow::Error> + std::fmt::Display,
{
    match raw.parse::<T>() {
        Ok(value) => value,
        Err(e) => {
            warn!(
                env_key = key,
                raw_value = %raw,
                fallback = %default,
                error = %e,
                "config: invalid value; using default"
            );
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ResolverConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(!config.prefer_v2);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.platform_version, PlatformVersion::new(15, 0, 0));
        assert_eq!(config.throttle.per_request_interval(), None);
    }

    #[test]
    fn invalid_platform_values_fall_back() {
        assert_eq!(parse_or_warn("K", "beos", Platform::MacOs), Platform::MacOs);
        assert_eq!(parse_or_warn("K", "tvos", Platform::MacOs), Platform::TvOs);
        assert_eq!(
            parse_or_warn("K", "14.x", PlatformVersion::new(15, 0, 0)),
            PlatformVersion::new(15, 0, 0)
        );
    }

    #[test]
    fn platform_version_defaults_to_the_platform_minimum() {
        assert_eq!(
            platform_version_or_minimum(Platform::Ios, None),
            PlatformVersion::new(15, 0, 0)
        );
        assert_eq!(
            platform_version_or_minimum(Platform::MacOs, None),
            PlatformVersion::new(12, 0, 0)
        );
        assert_eq!(
            platform_version_or_minimum(Platform::WatchOs, Some("garbage")),
            PlatformVersion::new(8, 0, 0)
        );
        assert_eq!(
            platform_version_or_minimum(Platform::MacOs, Some("11.6")),
            PlatformVersion::new(11, 6, 0)
        );
    }
}
