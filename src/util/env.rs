//! Environment helpers: centralized dotenv loading and ergonomic getters.
//! Call `init_env()` once early in each binary (or rely on lazy Once).
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Once;
use tracing::{info, warn};

static INIT: Once = Once::new();

/// Load .env exactly once. Safe to call many times.
pub fn init_env() {
    INIT.call_once(|| {
        if dotenv::dotenv().is_ok() {
            return;
        }
        // Fallback to the Cargo project root so `cargo run` from a subdirectory still works.
        let candidate = format!("{}/.env", env!("CARGO_MANIFEST_DIR"));
        let _ = dotenv::from_filename(candidate);
    });
}

/// Common bootstrap for CLI binaries: load the environment and note which
/// storefront endpoint is configured.
pub fn bootstrap_cli(bin_name: &str) {
    init_env();

    match env_opt("STOREFRONT_BASE_URL") {
        Some(url) => info!(
            target = "bootstrap",
            bin = bin_name,
            base_url = %url,
            "storefront endpoint configured"
        ),
        None => warn!(
            target = "bootstrap",
            bin = bin_name,
            "STOREFRONT_BASE_URL not set; falling back to the local default"
        ),
    }
}

/// Get optional env var (None if unset or empty).
pub fn env_opt(key: &str) -> Option<String> {
    init_env();
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Get parsed value with default fallback. Unparseable values are logged and
/// replaced by the default.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
{
    match env_opt(key) {
        Some(raw) => parse_or_default(key, &raw, default),
        None => default,
    }
}

/// Boolean flag; accepts 1/true/on/yes (case-insensitive) as true.
pub fn env_flag(key: &str, default: bool) -> bool {
    match env_opt(key) {
        Some(raw) => flag_value(&raw),
        None => default,
    }
}

fn flag_value(raw: &str) -> bool {
    let v = raw.trim().to_ascii_lowercase();
    matches!(v.as_str(), "1" | "true" | "on" | "yes")
}

fn parse_or_default<T>(key: &str, raw: &str, default: T) -> T
where
    T: FromStr + Display,
{
    match raw.trim().parse::<T>() {
        Ok(value) => value,
        Err(_) => {
            warn!(
                env_key = key,
                raw_value = %raw,
                fallback = %default,
                "invalid env value; using default"
            );
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_accepts_common_truthy_spellings() {
        for raw in ["1", "true", "ON", " yes "] {
            assert!(flag_value(raw), "{raw} should be truthy");
        }
        for raw in ["0", "false", "off", "nope"] {
            assert!(!flag_value(raw), "{raw} should be falsy");
        }
    }

    #[test]
    fn invalid_numbers_fall_back_to_default() {
        assert_eq!(parse_or_default("TEST_KEY", "42", 7u64), 42);
        assert_eq!(parse_or_default("TEST_KEY", " 42 ", 7u64), 42);
        assert_eq!(parse_or_default("TEST_KEY", "forty", 7u64), 7);
    }
}
