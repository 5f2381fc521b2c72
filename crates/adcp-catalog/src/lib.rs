//! Product catalog (C4): per-tenant product lookup, optionally filtered by
//! brief/countries/formats. Grounded on `abp-capability`'s pure
//! filter/negotiate-over-a-manifest style, adapted to filtering a product
//! list instead of negotiating capabilities; storage access goes through
//! `adcp-storage`.

use std::sync::Arc;

use adcp_core::Product;
use adcp_error::AdcpError;
use adcp_storage::Storage;
use async_trait::async_trait;

/// Filters accepted by [`Catalog::get_products`]. `brief` is a free-text
/// buyer description; the default database-backed provider ignores it (an
/// AI-backed provider, out of scope here, would re-rank on it).
#[derive(Debug, Clone, Default)]
pub struct ProductFilters {
    pub brief: Option<String>,
    pub countries: Option<Vec<String>>,
    pub formats: Option<Vec<String>>,
    pub targeting_features: Option<Vec<String>>,
    pub promoted_offering: Option<String>,
}

/// Pluggable product-catalog provider (C4). The default implementation reads
/// straight from [`Storage`]; an AI-backed provider could re-rank on
/// `brief` without changing this contract.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn get_products(
        &self,
        tenant_id: &str,
        principal_id: &str,
        filters: &ProductFilters,
    ) -> Result<Vec<Product>, AdcpError>;
}

/// Default "database" provider: reads `products` for the tenant and filters
/// by exact format intersection and country-list overlap. Ignores `brief`.
pub struct DatabaseCatalog {
    storage: Arc<dyn Storage>,
}

impl DatabaseCatalog {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl Catalog for DatabaseCatalog {
    async fn get_products(
        &self,
        tenant_id: &str,
        _principal_id: &str,
        filters: &ProductFilters,
    ) -> Result<Vec<Product>, AdcpError> {
        let products = self.storage.list_products(tenant_id).await?;
        Ok(products
            .into_iter()
            .filter(|p| matches_formats(p, filters.formats.as_deref()))
            .filter(|p| matches_countries(p, filters.countries.as_deref()))
            .collect())
    }
}

fn matches_formats(product: &Product, formats: Option<&[String]>) -> bool {
    match formats {
        None => true,
        Some(wanted) if wanted.is_empty() => true,
        Some(wanted) => wanted.iter().any(|f| product.formats.contains(f)),
    }
}

fn matches_countries(product: &Product, countries: Option<&[String]>) -> bool {
    match countries {
        None => true,
        Some(wanted) if wanted.is_empty() => true,
        Some(wanted) => {
            // A product with no configured countries is unrestricted.
            product.countries.is_empty() || wanted.iter().any(|c| product.countries.contains(c))
        }
    }
}
