//! Client-side report aggregation over product and invoice listings.

pub mod consumption;
pub mod dashboard;
pub mod export;
pub mod financial;
pub mod inventory;
pub mod rotation;
pub mod source;
pub mod valuation;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::ReportSettings;
use crate::error::Result;
use crate::models::{Invoice, InvoiceDetail, InvoiceStatus};

pub use consumption::{ConsumedProduct, ConsumptionReport};
pub use dashboard::{DashboardReport, ReportSection};
pub use financial::{CategorySpend, FinancialReport, MonthlyTotal};
pub use inventory::InventoryReport;
pub use rotation::{ProductRotation, RotationReport};
pub use source::{ApiReportSource, ReportSource};
pub use valuation::{Trend, ValuationReport, ValuePoint};

pub const ALL_PERIODS: &str = "Todos";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportFilters {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub categoria_id: Option<i64>,
    pub estado: Option<InvoiceStatus>,
}

impl ReportFilters {
    pub fn between(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date: Some(start_date),
            end_date: Some(end_date),
            ..Default::default()
        }
    }

    /// The date range applies only when both ends are set.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.start_date.zip(self.end_date)
    }

    pub fn period(&self) -> String {
        match self.date_range() {
            Some((start, end)) => format!("{} - {}", start, end),
            None => ALL_PERIODS.to_string(),
        }
    }

    /// Inclusive, by calendar date. Undated invoices fall outside any range.
    pub fn includes(&self, invoice: &Invoice) -> bool {
        match self.date_range() {
            None => true,
            Some((start, end)) => invoice
                .movement_date()
                .is_some_and(|date| date >= start && date <= end),
        }
    }
}

/// Invoice paired with its detail lines.
pub type InvoiceLines = (Invoice, Vec<InvoiceDetail>);

pub struct ReportService {
    source: Arc<dyn ReportSource>,
    max_records: u32,
}

impl ReportService {
    pub fn new(source: Arc<dyn ReportSource>, settings: &ReportSettings) -> Self {
        Self {
            source,
            max_records: settings.max_records,
        }
    }

    pub async fn inventory(&self, filters: &ReportFilters) -> Result<InventoryReport> {
        let products = self
            .source
            .products(filters.categoria_id, self.max_records)
            .await?;
        Ok(inventory::build(products))
    }

    pub async fn consumption(&self, filters: &ReportFilters) -> Result<ConsumptionReport> {
        let estado = filters.estado.unwrap_or(InvoiceStatus::Confirmada);
        let invoices = self.filtered_invoices(estado, filters).await?;
        let lines = self.with_details(invoices).await;
        Ok(consumption::build(filters.period(), &lines))
    }

    pub async fn financial(&self, filters: &ReportFilters) -> Result<FinancialReport> {
        let estado = filters.estado.unwrap_or(InvoiceStatus::Confirmada);
        let invoices = self.filtered_invoices(estado, filters).await?;
        Ok(financial::build(filters.period(), &invoices))
    }

    /// Always over confirmed invoices.
    pub async fn rotation(&self, filters: &ReportFilters) -> Result<RotationReport> {
        let invoices = self
            .filtered_invoices(InvoiceStatus::Confirmada, filters)
            .await?;
        let lines = self.with_details(invoices).await;
        Ok(rotation::build(&lines))
    }

    /// Current stock value against the monthly history of every confirmed
    /// invoice. Only the category filter applies.
    pub async fn valuation(&self, filters: &ReportFilters) -> Result<ValuationReport> {
        let current = self.inventory(filters).await?;
        let invoices = self
            .source
            .invoices(InvoiceStatus::Confirmada, self.max_records)
            .await?;
        Ok(valuation::build(current.total_value, &invoices))
    }

    async fn filtered_invoices(
        &self,
        estado: InvoiceStatus,
        filters: &ReportFilters,
    ) -> Result<Vec<Invoice>> {
        let invoices = self.source.invoices(estado, self.max_records).await?;
        let total = invoices.len();
        let kept: Vec<Invoice> = invoices.into_iter().filter(|i| filters.includes(i)).collect();
        tracing::debug!(estado = %estado, total, kept = kept.len(), "Invoices selected for report");
        Ok(kept)
    }

    /// Fetch details one invoice at a time; an invoice whose details fail
    /// is skipped.
    async fn with_details(&self, invoices: Vec<Invoice>) -> Vec<InvoiceLines> {
        let mut lines = Vec::with_capacity(invoices.len());
        for invoice in invoices {
            match self.source.invoice_details(invoice.id).await {
                Ok(details) => lines.push((invoice, details)),
                Err(e) => {
                    tracing::error!(invoice_id = invoice.id, error = %e, "Skipping invoice details");
                }
            }
        }
        lines
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::*;
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::Ordering;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_period_label() {
        assert_eq!(ReportFilters::default().period(), ALL_PERIODS);
        let filters = ReportFilters::between(date("2024-01-01"), date("2024-01-31"));
        assert_eq!(filters.period(), "2024-01-01 - 2024-01-31");

        let half_open = ReportFilters {
            start_date: Some(date("2024-01-01")),
            ..Default::default()
        };
        assert_eq!(half_open.period(), ALL_PERIODS);
    }

    #[test]
    fn test_date_filter_is_inclusive() {
        let filters = ReportFilters::between(date("2024-01-01"), date("2024-01-31"));
        assert!(filters.includes(&invoice(1, "2024-01-01", 1.0, "CONFIRMADA")));
        assert!(filters.includes(&invoice(2, "2024-01-31T23:00:00.000Z", 1.0, "CONFIRMADA")));
        assert!(!filters.includes(&invoice(3, "2024-02-01", 1.0, "CONFIRMADA")));
        assert!(!filters.includes(&invoice(4, "", 1.0, "CONFIRMADA")));
        assert!(ReportFilters::default().includes(&invoice(4, "", 1.0, "CONFIRMADA")));
    }

    #[tokio::test]
    async fn test_consumption_skips_failing_invoice() {
        let source = Arc::new(StaticSource {
            invoices: vec![
                invoice(1, "2024-01-05", 10.0, "CONFIRMADA"),
                invoice(2, "2024-01-06", 10.0, "CONFIRMADA"),
                invoice(3, "2024-01-07", 10.0, "BORRADOR"),
            ],
            details: HashMap::from([
                (1, vec![detail(1, 5, "2.5"), detail(1, 6, "1")]),
                (2, vec![detail(2, 5, "3")]),
            ]),
            broken: vec![2],
            ..Default::default()
        });
        let service = ReportService::new(source.clone(), &ReportSettings::default());

        let report = service.consumption(&ReportFilters::default()).await.unwrap();
        assert_eq!(report.period, ALL_PERIODS);
        assert_eq!(report.total_consumed, 3.5);
        assert_eq!(report.products[0].product_id, 5);
        assert_eq!(report.products[0].quantity_consumed, 2.5);
        assert_eq!(source.detail_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_inventory_filters_by_category() {
        let source = Arc::new(StaticSource {
            products: vec![product(1, 1, 10.0, 5.0, 2.0), product(2, 2, 1.0, 5.0, 3.0)],
            ..Default::default()
        });
        let service = ReportService::new(source, &ReportSettings::default());

        let filters = ReportFilters {
            categoria_id: Some(2),
            ..Default::default()
        };
        let report = service.inventory(&filters).await.unwrap();
        assert_eq!(report.total_products, 1);
        assert_eq!(report.total_value, 3.0);
        assert_eq!(report.critical_stock_count, 1);
    }

    #[tokio::test]
    async fn test_valuation_ignores_date_range() {
        let source = Arc::new(StaticSource {
            products: vec![product(1, 1, 10.0, 5.0, 2.0)],
            invoices: vec![
                invoice(1, "2024-01-05", 100.0, "CONFIRMADA"),
                invoice(2, "2024-02-05", 200.0, "CONFIRMADA"),
            ],
            ..Default::default()
        });
        let service = ReportService::new(source, &ReportSettings::default());

        let filters = ReportFilters::between(date("2024-02-01"), date("2024-02-28"));
        let report = service.valuation(&filters).await.unwrap();
        assert_eq!(report.current_value, 20.0);
        assert_eq!(report.historical_values.len(), 2);
        assert_eq!(report.trend, Trend::Up);
    }
}
