use crate::domain::catalog::{ProductCatalog, ProductRecord};
use crate::domain::money::Amount;
use crate::error::{Result, ScanPayError};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct CatalogRow {
    id: String,
    name: String,
    price: Decimal,
}

/// Reads a product catalog from a CSV source with an `id,name,price` header.
///
/// Whitespace around fields is trimmed. Unlike a transaction feed, a catalog is
/// all-or-nothing: the first bad row fails the whole load.
pub struct CatalogReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CatalogReader<R> {
    /// Creates a new `CatalogReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily yields products, one per row.
    pub fn products(self) -> impl Iterator<Item = Result<ProductRecord>> {
        self.reader
            .into_deserialize::<CatalogRow>()
            .enumerate()
            .map(|(index, row)| {
                let row = row?;
                if row.id.is_empty() {
                    return Err(ScanPayError::ValidationError(format!(
                        "Catalog row {} has an empty id",
                        index + 1
                    )));
                }
                if row.price < Decimal::ZERO {
                    return Err(ScanPayError::ValidationError(format!(
                        "Catalog row {} ({}) has a negative price",
                        index + 1,
                        row.id
                    )));
                }
                let price = Amount::new(row.price).map_err(|_| {
                    ScanPayError::ValidationError(format!(
                        "Catalog row {} ({}) has a price finer than a cent: {}",
                        index + 1,
                        row.id,
                        row.price
                    ))
                })?;
                Ok(ProductRecord {
                    id: row.id,
                    name: row.name,
                    price,
                })
            })
    }

    pub fn into_catalog(self) -> Result<ProductCatalog> {
        let products = self.products().collect::<Result<Vec<_>>>()?;
        ProductCatalog::from_products(products)
    }
}
