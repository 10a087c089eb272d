//! Invoice photo to confirmed draft: OCR, product matching, totals review
//! and submission.

pub mod backend;
pub mod draft;
pub mod image;
pub mod reconciliation;
pub mod review;

pub use backend::{ApiBackend, ReconciliationBackend};
pub use draft::{normalize_date, DraftLine, ProcessedInvoiceDraft};
pub use image::InvoiceImage;
pub use reconciliation::{
    AssignmentOutcome, FlowMode, FlowState, Progress, ReconciliationFlow, ReviewDecision,
    UnitOption,
};
pub use review::ReviewReport;
