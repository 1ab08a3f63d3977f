use std::collections::HashSet;

use crate::products::models::StoreProduct;

/// Collapse backend products into a set keyed by identifier.
///
/// If the backend repeats an identifier the last entry wins.
pub fn normalize<I, P>(raw: I) -> HashSet<StoreProduct>
where
    I: IntoIterator<Item = P>,
    P: Into<StoreProduct>,
{
    let mut products = HashSet::new();
    for product in raw {
        products.replace(product.into());
    }
    products
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::products::models::{ProductIdentifier, StoreGeneration, V1Product, V2Product};

    fn v1(id: &str, title: &str) -> V1Product {
        V1Product {
            product_identifier: id.into(),
            localized_title: title.into(),
            localized_description: String::new(),
            price: 0.99,
            currency_code: Some("USD".into()),
        }
    }

    #[test]
    fn duplicate_identifiers_collapse_to_one() {
        let products = normalize(vec![v1("pro_v1", "first"), v1("pro_v1", "second")]);
        assert_eq!(products.len(), 1);
        let survivor = products.get(&ProductIdentifier::from("pro_v1")).unwrap();
        assert_eq!(survivor.title, "second");
    }

    #[test]
    fn distinct_identifiers_are_kept() {
        let products = normalize(vec![v1("a", "A"), v1("b", "B"), v1("c", "C")]);
        assert_eq!(products.len(), 3);
        assert!(products.iter().all(|p| p.generation() == StoreGeneration::V1));
    }

    #[test]
    fn v2_products_keep_their_source() {
        let products = normalize(vec![V2Product {
            id: "annual".into(),
            display_name: "Annual".into(),
            description: "Billed yearly".into(),
            price: 29.99,
            display_price: Some("$29.99".into()),
            currency_code: Some("USD".into()),
        }]);
        let product = products.iter().next().unwrap();
        assert_eq!(product.title, "Annual");
        assert_eq!(product.v2().unwrap().display_price.as_deref(), Some("$29.99"));
    }

    #[test]
    fn empty_input_gives_empty_set() {
        assert!(normalize(Vec::<V1Product>::new()).is_empty());
    }
}
