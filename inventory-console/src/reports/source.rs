use async_trait::async_trait;
use std::sync::Arc;

use crate::api::{InvoiceApi, InvoiceQuery, ProductApi};
use crate::error::Result;
use crate::models::{Invoice, InvoiceDetail, InvoiceStatus, Product, ProductQuery};

/// Listings the report aggregations read from.
#[async_trait]
pub trait ReportSource: Send + Sync {
    async fn products(&self, categoria_id: Option<i64>, limit: u32) -> Result<Vec<Product>>;

    async fn invoices(&self, estado: InvoiceStatus, limit: u32) -> Result<Vec<Invoice>>;

    async fn invoice_details(&self, invoice_id: i64) -> Result<Vec<InvoiceDetail>>;
}

/// Report source over the HTTP API. A listing without its entity array
/// reads as empty.
pub struct ApiReportSource {
    products: Arc<ProductApi>,
    invoices: Arc<InvoiceApi>,
}

impl ApiReportSource {
    pub fn new(products: Arc<ProductApi>, invoices: Arc<InvoiceApi>) -> Self {
        Self { products, invoices }
    }
}

#[async_trait]
impl ReportSource for ApiReportSource {
    async fn products(&self, categoria_id: Option<i64>, limit: u32) -> Result<Vec<Product>> {
        let query = ProductQuery {
            categoria_id,
            ..ProductQuery::page(1, limit)
        };
        match self.products.list(&query).await {
            Ok(page) => Ok(page.items),
            Err(e) if e.is_shape() => {
                tracing::warn!(error = %e, "Product listing without products; reporting empty");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    async fn invoices(&self, estado: InvoiceStatus, limit: u32) -> Result<Vec<Invoice>> {
        let query = InvoiceQuery {
            page: 1,
            limit,
            estado: Some(estado),
        };
        match self.invoices.list(&query).await {
            Ok(page) => Ok(page.items),
            Err(e) if e.is_shape() => {
                tracing::warn!(error = %e, "Invoice listing without invoices; reporting empty");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    async fn invoice_details(&self, invoice_id: i64) -> Result<Vec<InvoiceDetail>> {
        self.invoices.details(invoice_id).await
    }
}
