use serde::Deserialize;
use std::sync::Arc;

use super::client::{ApiClient, ApiResponse};
use super::ListQuery;
use crate::error::{ConsoleError, Result};
use crate::models::{Category, CategoryForm, Page};

const CATEGORIES_PATH: &str = "/categorias";

#[derive(Debug, Deserialize)]
struct CategoryListing {
    categories: Option<Vec<Category>>,
    #[serde(default)]
    total: u64,
    #[serde(default)]
    page: u32,
    #[serde(default, rename = "totalPages")]
    total_pages: u32,
}

pub struct CategoryApi {
    client: Arc<ApiClient>,
}

impl CategoryApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Page<Category>> {
        let response: ApiResponse<CategoryListing> =
            self.client.get(CATEGORIES_PATH, &query.to_pairs()).await?;
        let listing = response.into_data("categorias")?;
        let items = listing
            .categories
            .ok_or_else(|| ConsoleError::Shape("data.categories".to_string()))?;

        Ok(Page {
            items,
            total: listing.total,
            page: listing.page,
            total_pages: listing.total_pages,
        })
    }

    pub async fn create(&self, form: &CategoryForm) -> Result<Option<Category>> {
        validator::Validate::validate(form)?;
        let response: ApiResponse<Category> = self.client.post(CATEGORIES_PATH, form).await?;
        Ok(response.ensure_success("crear categoría")?.data)
    }

    pub async fn update(&self, id: i64, form: &CategoryForm) -> Result<Option<Category>> {
        validator::Validate::validate(form)?;
        let path = format!("{}/{}", CATEGORIES_PATH, id);
        let response: ApiResponse<Category> = self.client.put(&path, form).await?;
        Ok(response.ensure_success("actualizar categoría")?.data)
    }
}
