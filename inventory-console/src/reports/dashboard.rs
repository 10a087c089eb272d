use serde::Serialize;

use super::{
    ConsumptionReport, FinancialReport, InventoryReport, ReportFilters, ReportService,
    RotationReport, ValuationReport,
};
use crate::error::Result;

/// One dashboard panel: the report, or why it could not be built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSection<T> {
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ReportSection<T> {
    fn from_result(name: &str, result: Result<T>) -> Self {
        match result {
            Ok(data) => Self {
                data: Some(data),
                error: None,
            },
            Err(e) => {
                tracing::error!(report = name, error = %e, "Dashboard report failed");
                Self {
                    data: None,
                    error: Some(e.user_message()),
                }
            }
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub inventory: ReportSection<InventoryReport>,
    pub consumption: ReportSection<ConsumptionReport>,
    pub financial: ReportSection<FinancialReport>,
    pub rotation: ReportSection<RotationReport>,
    pub valuation: ReportSection<ValuationReport>,
}

impl ReportService {
    /// Build all five reports concurrently. A failing report does not
    /// affect the others.
    pub async fn dashboard(&self, filters: &ReportFilters) -> DashboardReport {
        let (inventory, consumption, financial, rotation, valuation) = tokio::join!(
            self.inventory(filters),
            self.consumption(filters),
            self.financial(filters),
            self.rotation(filters),
            self.valuation(filters),
        );

        DashboardReport {
            inventory: ReportSection::from_result("inventory", inventory),
            consumption: ReportSection::from_result("consumption", consumption),
            financial: ReportSection::from_result("financial", financial),
            rotation: ReportSection::from_result("rotation", rotation),
            valuation: ReportSection::from_result("valuation", valuation),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ReportSettings;
    use crate::error::MSG_SERVER_ERROR;
    use crate::reports::fakes::{invoice, StaticSource};
    use crate::reports::{ReportFilters, ReportService};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let source = Arc::new(StaticSource {
            invoices: vec![invoice(1, "2024-01-05", 12.0, "CONFIRMADA")],
            fail_products: true,
            ..Default::default()
        });
        let service = ReportService::new(source, &ReportSettings::default());

        let dashboard = service.dashboard(&ReportFilters::default()).await;

        assert_eq!(dashboard.inventory.error.as_deref(), Some(MSG_SERVER_ERROR));
        assert_eq!(dashboard.valuation.error.as_deref(), Some(MSG_SERVER_ERROR));
        assert!(dashboard.consumption.is_ok());
        assert!(dashboard.rotation.is_ok());
        assert_eq!(dashboard.financial.data.unwrap().total_spent, 12.0);
    }
}
