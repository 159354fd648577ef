use super::money::Amount;
use crate::error::{Result, ScanPayError};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A sellable product, keyed by the code printed on it.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct ProductRecord {
    pub id: String,
    pub name: String,
    pub price: Amount,
}

/// Read-only lookup from scanned code to product.
#[derive(Debug, Default, Clone)]
pub struct ProductCatalog {
    products: HashMap<String, ProductRecord>,
}

impl ProductCatalog {
    /// Builds a catalog, rejecting duplicate product ids.
    pub fn from_products<I>(products: I) -> Result<Self>
    where
        I: IntoIterator<Item = ProductRecord>,
    {
        let mut map = HashMap::new();
        for product in products {
            if map.contains_key(&product.id) {
                return Err(ScanPayError::ValidationError(format!(
                    "Duplicate product id in catalog: {}",
                    product.id
                )));
            }
            map.insert(product.id.clone(), product);
        }
        Ok(Self { products: map })
    }

    /// The three products the demo codes are printed for.
    pub fn demo() -> Self {
        let products = [
            ("product123", "Product A", dec!(15.00)),
            ("product456", "Product B", dec!(20.00)),
            ("product789", "Product C", dec!(25.00)),
        ]
        .into_iter()
        .map(|(id, name, price)| {
            (
                id.to_string(),
                ProductRecord {
                    id: id.to_string(),
                    name: name.to_string(),
                    price: Amount::from_literal(price),
                },
            )
        })
        .collect();
        Self { products }
    }

    /// Looks up a scanned code. `None` is the normal answer for codes we do not sell.
    pub fn resolve(&self, code: &str) -> Option<&ProductRecord> {
        self.products.get(code)
    }

    /// Every product, ordered by id.
    pub fn products(&self) -> Vec<&ProductRecord> {
        let mut products: Vec<_> = self.products.values().collect();
        products.sort_by(|a, b| a.id.cmp(&b.id));
        products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
