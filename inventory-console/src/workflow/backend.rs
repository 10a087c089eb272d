//! Remote operations the reconciliation flow depends on.

use async_trait::async_trait;
use std::sync::Arc;

use super::image::InvoiceImage;
use crate::api::{InvoiceApi, ProductApi};
use crate::error::Result;
use crate::models::{Invoice, InvoicePayload, OcrInvoice, Product, ProductForm, ProductQuery};

#[async_trait]
pub trait ReconciliationBackend: Send + Sync {
    async fn process_image(&self, image: &InvoiceImage) -> Result<OcrInvoice>;

    /// `Ok(None)` when the backend accepted the product but did not echo it.
    async fn create_product(&self, form: &ProductForm) -> Result<Option<Product>>;

    /// Best match for an exact product name, if any.
    async fn find_product_by_name(&self, nombre: &str) -> Result<Option<Product>>;

    async fn create_invoice(&self, payload: &InvoicePayload) -> Result<Option<Invoice>>;

    async fn update_invoice(&self, invoice_id: i64, payload: &InvoicePayload) -> Result<Option<Invoice>>;
}

/// Backend bound to the HTTP API.
pub struct ApiBackend {
    products: Arc<ProductApi>,
    invoices: Arc<InvoiceApi>,
}

impl ApiBackend {
    pub fn new(products: Arc<ProductApi>, invoices: Arc<InvoiceApi>) -> Self {
        Self { products, invoices }
    }
}

#[async_trait]
impl ReconciliationBackend for ApiBackend {
    async fn process_image(&self, image: &InvoiceImage) -> Result<OcrInvoice> {
        self.invoices.process_image(image).await
    }

    async fn create_product(&self, form: &ProductForm) -> Result<Option<Product>> {
        self.products.create(form).await
    }

    async fn find_product_by_name(&self, nombre: &str) -> Result<Option<Product>> {
        let query = ProductQuery::page(1, 1).with_search(nombre);
        let page = self.products.list(&query).await?;
        Ok(page.items.into_iter().next())
    }

    async fn create_invoice(&self, payload: &InvoicePayload) -> Result<Option<Invoice>> {
        self.invoices.create(payload).await
    }

    async fn update_invoice(&self, invoice_id: i64, payload: &InvoicePayload) -> Result<Option<Invoice>> {
        self.invoices.update_full(invoice_id, payload).await
    }
}
