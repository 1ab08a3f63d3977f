// Product value types shared by both backend generations.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Opaque storefront product identifier; exact-match equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductIdentifier(String);

impl ProductIdentifier {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductIdentifier {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for ProductIdentifier {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl Borrow<str> for ProductIdentifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Backend protocol generation that serviced a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreGeneration {
    V1,
    V2,
}

impl fmt::Display for StoreGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreGeneration::V1 => f.write_str("v1"),
            StoreGeneration::V2 => f.write_str("v2"),
        }
    }
}

/// Product as returned by the v1 storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct V1Product {
    #[serde(rename = "productIdentifier")]
    pub product_identifier: ProductIdentifier,
    #[serde(rename = "localizedTitle", default)]
    pub localized_title: String,
    #[serde(rename = "localizedDescription", default)]
    pub localized_description: String,
    pub price: f64,
    #[serde(rename = "currencyCode")]
    pub currency_code: Option<String>,
}

/// Product as returned by the v2 storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct V2Product {
    pub id: ProductIdentifier,
    #[serde(rename = "displayName", default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(rename = "displayPrice")]
    pub display_price: Option<String>,
    #[serde(rename = "currencyCode")]
    pub currency_code: Option<String>,
}

/// The generation-specific product a [`StoreProduct`] was built from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "backend", content = "product", rename_all = "lowercase")]
pub enum StoreProductSource {
    V1(Arc<V1Product>),
    V2(Arc<V2Product>),
}

impl StoreProductSource {
    pub fn generation(&self) -> StoreGeneration {
        match self {
            StoreProductSource::V1(_) => StoreGeneration::V1,
            StoreProductSource::V2(_) => StoreGeneration::V2,
        }
    }
}

/// Unified product. Equality and hashing consider the identifier only so
/// result sets collapse duplicates.
#[derive(Debug, Clone, Serialize)]
pub struct StoreProduct {
    pub identifier: ProductIdentifier,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub currency_code: Option<String>,
    pub source: StoreProductSource,
}

impl StoreProduct {
    pub fn generation(&self) -> StoreGeneration {
        self.source.generation()
    }

    pub fn v1(&self) -> Option<&V1Product> {
        match &self.source {
            StoreProductSource::V1(product) => Some(product),
            StoreProductSource::V2(_) => None,
        }
    }

    pub fn v2(&self) -> Option<&V2Product> {
        match &self.source {
            StoreProductSource::V2(product) => Some(product),
            StoreProductSource::V1(_) => None,
        }
    }
}

impl PartialEq for StoreProduct {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

impl Eq for StoreProduct {}

impl Hash for StoreProduct {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier.hash(state);
    }
}

impl Borrow<ProductIdentifier> for StoreProduct {
    fn borrow(&self) -> &ProductIdentifier {
        &self.identifier
    }
}

impl From<V1Product> for StoreProduct {
    fn from(product: V1Product) -> Self {
        Self {
            identifier: product.product_identifier.clone(),
            title: product.localized_title.clone(),
            description: product.localized_description.clone(),
            price: product.price,
            currency_code: product.currency_code.clone(),
            source: StoreProductSource::V1(Arc::new(product)),
        }
    }
}

impl From<V2Product> for StoreProduct {
    fn from(product: V2Product) -> Self {
        Self {
            identifier: product.id.clone(),
            title: product.display_name.clone(),
            description: product.description.clone(),
            price: product.price,
            currency_code: product.currency_code.clone(),
            source: StoreProductSource::V2(Arc::new(product)),
        }
    }
}
