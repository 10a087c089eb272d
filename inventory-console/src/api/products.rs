use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use super::client::{ApiClient, ApiResponse};
use crate::error::{ConsoleError, Result};
use crate::models::{Page, Product, ProductForm, ProductQuery};
use crate::services::product_search::ProductLookup;
use crate::services::unit_cache::{RawUnitMeasures, UnitMeasureFetcher};

const PRODUCTS_PATH: &str = "/productos";
const UNIT_MEASURES_PATH: &str = "/unidad-medida";

#[derive(Debug, Deserialize)]
struct Pagination {
    #[serde(default)]
    current: u32,
    #[serde(default, rename = "pageSize")]
    _page_size: u32,
    #[serde(default)]
    total: u64,
    #[serde(default, rename = "totalPages")]
    total_pages: u32,
}

#[derive(Debug, Deserialize)]
struct ProductListing {
    products: Option<Vec<Product>>,
    pagination: Option<Pagination>,
}

pub struct ProductApi {
    client: Arc<ApiClient>,
}

impl ProductApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &ProductQuery) -> Result<Page<Product>> {
        let response: ApiResponse<ProductListing> =
            self.client.get(PRODUCTS_PATH, &query.to_pairs()).await?;
        let listing = response.into_data("productos")?;
        let items = listing
            .products
            .ok_or_else(|| ConsoleError::Shape("data.products".to_string()))?;

        Ok(match listing.pagination {
            Some(p) => Page {
                items,
                total: p.total,
                page: p.current,
                total_pages: p.total_pages,
            },
            None => Page {
                total: items.len() as u64,
                page: query.page,
                total_pages: 1,
                items,
            },
        })
    }

    /// Create a product. The backend may omit the new row from the response.
    pub async fn create(&self, form: &ProductForm) -> Result<Option<Product>> {
        validator::Validate::validate(form)?;
        let response: ApiResponse<Product> = self.client.post(PRODUCTS_PATH, form).await?;
        let response = response.ensure_success("crear producto")?;
        tracing::info!(nombre = %form.nombre, "Product created");
        Ok(response.data)
    }

    pub async fn update(&self, id: i64, form: &ProductForm) -> Result<Option<Product>> {
        validator::Validate::validate(form)?;
        let path = format!("{}/{}", PRODUCTS_PATH, id);
        let response: ApiResponse<Product> = self.client.put(&path, form).await?;
        Ok(response.ensure_success("actualizar producto")?.data)
    }

    /// Unfiltered unit catalog; validation happens in the cache.
    pub async fn unit_measures(&self) -> Result<RawUnitMeasures> {
        self.client.get(UNIT_MEASURES_PATH, &[]).await
    }
}

#[async_trait]
impl UnitMeasureFetcher for ProductApi {
    async fn fetch_unit_measures(&self) -> Result<RawUnitMeasures> {
        self.unit_measures().await
    }
}

#[async_trait]
impl ProductLookup for ProductApi {
    async fn search_products(&self, search: &str, limit: u32) -> Result<Vec<Product>> {
        let query = ProductQuery::page(1, limit).with_search(search);
        Ok(self.list(&query).await?.items)
    }
}
