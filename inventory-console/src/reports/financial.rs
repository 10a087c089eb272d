use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::Invoice;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sept", "oct", "nov", "dic",
];

/// Spend per category. The invoice listing carries no category, so this
/// stays empty until the backend provides the breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpend {
    pub category_id: i64,
    pub category_name: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotal {
    /// Abbreviated Spanish month and year, e.g. `ene 2024`.
    pub month: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialReport {
    pub period: String,
    pub total_spent: f64,
    pub by_category: Vec<CategorySpend>,
    pub monthly_comparison: Vec<MonthlyTotal>,
}

pub fn month_label(year: i32, month: u32) -> String {
    let name = MONTH_ABBREVIATIONS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("?");
    format!("{} {}", name, year)
}

/// Total spend and a chronological monthly series. Undated invoices count
/// toward the total but not toward any month.
pub fn build(period: String, invoices: &[Invoice]) -> FinancialReport {
    let total_spent = invoices.iter().map(|i| i.total).sum();

    let mut monthly: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for invoice in invoices {
        if let Some(date) = invoice.movement_date() {
            *monthly.entry((date.year(), date.month())).or_insert(0.0) += invoice.total;
        }
    }

    FinancialReport {
        period,
        total_spent,
        by_category: Vec::new(),
        monthly_comparison: monthly
            .into_iter()
            .map(|((year, month), total)| MonthlyTotal {
                month: month_label(year, month),
                total,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::fakes::invoice;

    #[test]
    fn test_month_labels() {
        assert_eq!(month_label(2024, 1), "ene 2024");
        assert_eq!(month_label(2023, 9), "sept 2023");
        assert_eq!(month_label(2023, 12), "dic 2023");
    }

    #[test]
    fn test_monthly_series_is_chronological() {
        let invoices = vec![
            invoice(1, "2024-02-10", 50.0, "CONFIRMADA"),
            invoice(2, "2023-12-01", 20.0, "CONFIRMADA"),
            invoice(3, "2024-02-20", 25.0, "CONFIRMADA"),
            invoice(4, "2024-01-15", 10.0, "CONFIRMADA"),
        ];

        let report = build("Todos".into(), &invoices);
        assert_eq!(report.total_spent, 105.0);
        assert!(report.by_category.is_empty());
        let months: Vec<(&str, f64)> = report
            .monthly_comparison
            .iter()
            .map(|m| (m.month.as_str(), m.total))
            .collect();
        assert_eq!(
            months,
            vec![("dic 2023", 20.0), ("ene 2024", 10.0), ("feb 2024", 75.0)]
        );
    }

    #[test]
    fn test_undated_invoice_counts_only_in_total() {
        let report = build("Todos".into(), &[invoice(1, "", 7.0, "CONFIRMADA")]);
        assert_eq!(report.total_spent, 7.0);
        assert!(report.monthly_comparison.is_empty());
    }
}
