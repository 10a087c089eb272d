use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::sync::Arc;

use super::client::{ApiClient, ApiResponse};
use crate::error::{ConsoleError, Result};
use crate::models::{
    Invoice, InvoiceDetail, InvoiceHeaderUpdate, InvoicePayload, InvoiceStatus, OcrInvoice, Page,
};
use crate::workflow::image::InvoiceImage;

const INVOICES_PATH: &str = "/facturas-internas";
const DETAILS_BY_INVOICE_PATH: &str = "/detalles-factura/factura";
const PROCESS_IMAGE_PATH: &str = "/images/process";

#[derive(Debug, Deserialize)]
struct InvoiceListing {
    invoices: Option<Vec<Invoice>>,
    #[serde(default)]
    total: u64,
    #[serde(default)]
    page: u32,
    #[serde(default, rename = "totalPages")]
    total_pages: u32,
}

#[derive(Debug, Clone, Default)]
pub struct InvoiceQuery {
    pub page: u32,
    pub limit: u32,
    pub estado: Option<InvoiceStatus>,
}

impl InvoiceQuery {
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string()), ("limit", self.limit.to_string())];
        if let Some(estado) = self.estado {
            pairs.push(("estado", estado.as_str().to_string()));
        }
        pairs
    }
}

pub struct InvoiceApi {
    client: Arc<ApiClient>,
}

impl InvoiceApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &InvoiceQuery) -> Result<Page<Invoice>> {
        let response: ApiResponse<InvoiceListing> =
            self.client.get(INVOICES_PATH, &query.to_pairs()).await?;
        let listing = response.into_data("facturas")?;
        let items = listing
            .invoices
            .ok_or_else(|| ConsoleError::Shape("data.invoices".to_string()))?;

        Ok(Page {
            items,
            total: listing.total,
            page: listing.page,
            total_pages: listing.total_pages,
        })
    }

    pub async fn details(&self, invoice_id: i64) -> Result<Vec<InvoiceDetail>> {
        let path = format!("{}/{}", DETAILS_BY_INVOICE_PATH, invoice_id);
        let response: ApiResponse<Vec<InvoiceDetail>> = self.client.get(&path, &[]).await?;
        response.into_data("detalles de factura")
    }

    /// Header-only edit; lines are untouched.
    pub async fn update_header(
        &self,
        invoice_id: i64,
        update: &InvoiceHeaderUpdate,
    ) -> Result<Option<Invoice>> {
        let path = format!("{}/{}", INVOICES_PATH, invoice_id);
        let response: ApiResponse<Invoice> = self.client.put(&path, update).await?;
        Ok(response.ensure_success("actualizar factura")?.data)
    }

    /// Upload an invoice photo for OCR extraction.
    pub async fn process_image(&self, image: &InvoiceImage) -> Result<OcrInvoice> {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)?;
        let form = Form::new().part("image", part);

        let response: ApiResponse<OcrInvoice> =
            self.client.post_multipart(PROCESS_IMAGE_PATH, form).await?;
        let draft = response.into_data("procesar imagen")?;
        tracing::info!(
            file = %image.file_name,
            lines = draft.productos.len(),
            "Invoice image processed"
        );
        Ok(draft)
    }

    pub async fn create(&self, payload: &InvoicePayload) -> Result<Option<Invoice>> {
        let response: ApiResponse<Invoice> = self.client.post(INVOICES_PATH, payload).await?;
        Ok(response.ensure_success("crear factura")?.data)
    }

    /// Replace header and lines of a draft invoice.
    pub async fn update_full(
        &self,
        invoice_id: i64,
        payload: &InvoicePayload,
    ) -> Result<Option<Invoice>> {
        let path = format!("{}/{}", INVOICES_PATH, invoice_id);
        let response: ApiResponse<Invoice> = self.client.put(&path, payload).await?;
        Ok(response.ensure_success("actualizar factura")?.data)
    }
}
