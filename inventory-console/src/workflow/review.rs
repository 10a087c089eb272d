use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::draft::ProcessedInvoiceDraft;
use crate::models::invoice::AMOUNT_TOLERANCE;

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern is a valid regex"));

pub const FIELD_CODE: &str = "Código interno";
pub const FIELD_CONCEPT: &str = "Concepto";
pub const FIELD_DATE: &str = "Fecha de movimiento";
pub const FIELD_TOTAL: &str = "Total";
pub const FIELD_LINES: &str = "Productos";

/// Pre-submission check of a draft.
///
/// A discrepancy is a warning only. Missing header fields block submission;
/// lines without a product id send the flow to product assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewReport {
    pub entered_total: f64,
    pub computed_total: f64,
    pub has_discrepancy: bool,
    pub missing_fields: Vec<&'static str>,
    pub missing_product_lines: Vec<usize>,
}

impl ReviewReport {
    pub fn for_draft(draft: &ProcessedInvoiceDraft) -> Self {
        let entered_total = draft.total;
        let computed_total = draft.computed_total();

        let mut missing_fields = Vec::new();
        if draft.codigo_interno.trim().is_empty() {
            missing_fields.push(FIELD_CODE);
        }
        if draft.concepto.trim().is_empty() {
            missing_fields.push(FIELD_CONCEPT);
        }
        if !ISO_DATE.is_match(&draft.fecha_movimiento) {
            missing_fields.push(FIELD_DATE);
        }
        if !entered_total.is_finite() {
            missing_fields.push(FIELD_TOTAL);
        }
        // a non-numeric line amount makes the sum unusable
        if !computed_total.is_finite() {
            missing_fields.push(FIELD_LINES);
        }

        let comparable = entered_total.is_finite() && computed_total.is_finite();
        Self {
            entered_total,
            computed_total,
            has_discrepancy: !comparable
                || (entered_total - computed_total).abs() > AMOUNT_TOLERANCE,
            missing_fields,
            missing_product_lines: draft.missing_product_lines(),
        }
    }

    pub fn is_blocked(&self) -> bool {
        !self.missing_fields.is_empty()
    }

    pub fn needs_products(&self) -> bool {
        !self.missing_product_lines.is_empty()
    }
}
