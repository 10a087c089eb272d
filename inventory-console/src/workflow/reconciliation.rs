//! Invoice reconciliation state machine.
//!
//! `Idle → Capturing → Processing → Drafting → [AutoAssigningProducts] →
//! Reviewing → Submitting → Done`. Recoverable failures step back to the
//! state the operator can fix them from; an expired session ends in
//! `Error`.

use serde::Serialize;
use std::sync::Arc;

use super::backend::ReconciliationBackend;
use super::draft::ProcessedInvoiceDraft;
use super::image::InvoiceImage;
use super::review::ReviewReport;
use crate::config::WorkflowSettings;
use crate::error::{ConsoleError, Result};
use crate::models::product::resolve_unit_id;
use crate::models::{Invoice, InvoiceDetail, Product, ProductForm};
use crate::services::UnitMeasureCache;

pub const MSG_CREATE_PRODUCT_FAILED: &str = "Error al crear producto";
pub const MSG_UNRESOLVED_PRODUCT_ID: &str = "No se pudo resolver el ID del producto creado";
pub const MSG_ONLY_DRAFTS_EDITABLE: &str = "Solo se pueden editar facturas en estado BORRADOR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FlowState {
    Idle,
    Capturing,
    Processing,
    Drafting,
    AutoAssigningProducts { line: usize, attempts: u32 },
    Reviewing,
    Submitting,
    Done,
    Error,
}

impl FlowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowState::Idle => "idle",
            FlowState::Capturing => "capturing",
            FlowState::Processing => "processing",
            FlowState::Drafting => "drafting",
            FlowState::AutoAssigningProducts { .. } => "auto_assigning_products",
            FlowState::Reviewing => "reviewing",
            FlowState::Submitting => "submitting",
            FlowState::Done => "done",
            FlowState::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FlowMode {
    Create,
    Edit { invoice_id: i64 },
}

/// Products created so far in the current assignment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReviewDecision {
    /// Header fields are missing; the draft is open for editing again.
    FixFields(Vec<&'static str>),
    /// Products must be created for these lines first.
    AssignProducts(Vec<usize>),
    ReadyToSubmit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOutcome {
    /// Another line still lacks a product.
    Next { line: usize },
    /// Every line has a product; the review is open again.
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitOption {
    pub value: String,
    pub label: String,
}

fn fallback_units() -> Vec<UnitOption> {
    [("kg", "Kilogramo"), ("lb", "Libra"), ("und", "Unidad")]
        .into_iter()
        .map(|(abbr, name)| UnitOption {
            value: abbr.to_string(),
            label: format!("{} ({})", name, abbr),
        })
        .collect()
}

pub struct ReconciliationFlow {
    backend: Arc<dyn ReconciliationBackend>,
    units: UnitMeasureCache,
    max_attempts: u32,
    mode: FlowMode,
    state: FlowState,
    image: Option<InvoiceImage>,
    draft: ProcessedInvoiceDraft,
    review: Option<ReviewReport>,
    progress: Progress,
    last_error: Option<String>,
    submitted: Option<Invoice>,
}

impl ReconciliationFlow {
    pub fn new(
        backend: Arc<dyn ReconciliationBackend>,
        units: UnitMeasureCache,
        settings: &WorkflowSettings,
    ) -> Self {
        Self {
            backend,
            units,
            max_attempts: settings.max_product_attempts.max(1),
            mode: FlowMode::Create,
            state: FlowState::Idle,
            image: None,
            draft: ProcessedInvoiceDraft::default(),
            review: None,
            progress: Progress::default(),
            last_error: None,
            submitted: None,
        }
    }

    /// Open a stored invoice for editing. Only drafts are accepted.
    pub fn for_invoice(
        backend: Arc<dyn ReconciliationBackend>,
        units: UnitMeasureCache,
        settings: &WorkflowSettings,
        invoice: &Invoice,
        details: &[InvoiceDetail],
    ) -> Result<Self> {
        if !invoice.estado.is_editable() {
            return Err(ConsoleError::Workflow(MSG_ONLY_DRAFTS_EDITABLE.to_string()));
        }

        let mut flow = Self::new(backend, units, settings);
        flow.mode = FlowMode::Edit {
            invoice_id: invoice.id,
        };
        flow.draft = ProcessedInvoiceDraft::from_invoice(invoice, details);
        flow.state = FlowState::Drafting;
        tracing::info!(invoice_id = invoice.id, lines = details.len(), "Editing invoice draft");
        Ok(flow)
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn mode(&self) -> FlowMode {
        self.mode
    }

    pub fn draft(&self) -> &ProcessedInvoiceDraft {
        &self.draft
    }

    pub fn review(&self) -> Option<&ReviewReport> {
        self.review.as_ref()
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn submitted(&self) -> Option<&Invoice> {
        self.submitted.as_ref()
    }

    fn expect_state(&self, allowed: &[FlowState], action: &str) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(ConsoleError::Workflow(format!(
                "No se puede {} en el estado {}",
                action,
                self.state.as_str()
            )))
        }
    }

    fn transition(&mut self, next: FlowState) {
        tracing::debug!(from = self.state.as_str(), to = next.as_str(), "Reconciliation transition");
        self.state = next;
    }

    /// Record a failure and move to `recover_to`, or to `Error` when the
    /// session is gone.
    fn fail(&mut self, error: ConsoleError, recover_to: FlowState) -> ConsoleError {
        let message = error.user_message();
        tracing::warn!(state = self.state.as_str(), error = %error, "Reconciliation step failed");
        self.last_error = Some(message);
        match error {
            ConsoleError::Unauthorized(_) => self.transition(FlowState::Error),
            _ => self.transition(recover_to),
        }
        error
    }

    pub fn start_capture(&mut self) -> Result<()> {
        self.expect_state(&[FlowState::Idle, FlowState::Capturing], "capturar una imagen")?;
        self.image = None;
        self.last_error = None;
        self.transition(FlowState::Capturing);
        Ok(())
    }

    pub fn accept_image(&mut self, image: InvoiceImage) -> Result<()> {
        self.expect_state(&[FlowState::Capturing], "cargar una imagen")?;
        if let Err(e) = image.validate() {
            self.last_error = Some(e.user_message());
            return Err(e);
        }
        self.last_error = None;
        self.image = Some(image);
        Ok(())
    }

    /// Send the accepted image to OCR and open the extracted draft.
    pub async fn process(&mut self) -> Result<&ProcessedInvoiceDraft> {
        self.expect_state(&[FlowState::Capturing], "procesar la imagen")?;
        let image = self
            .image
            .clone()
            .ok_or_else(|| ConsoleError::Workflow("No hay imagen para procesar".to_string()))?;

        self.transition(FlowState::Processing);
        match self.backend.process_image(&image).await {
            Ok(ocr) => {
                self.draft = ProcessedInvoiceDraft::from_ocr(ocr);
                self.last_error = None;
                tracing::info!(
                    file = %image.file_name,
                    lines = self.draft.productos.len(),
                    missing = self.draft.missing_product_lines().len(),
                    "Invoice draft extracted"
                );
                self.transition(FlowState::Drafting);
                Ok(&self.draft)
            }
            Err(e) => Err(self.fail(e, FlowState::Capturing)),
        }
    }

    /// Mutable access to the draft; reopens it when a review is showing.
    pub fn edit_draft(&mut self) -> Result<&mut ProcessedInvoiceDraft> {
        self.expect_state(&[FlowState::Drafting, FlowState::Reviewing], "editar la factura")?;
        if self.state == FlowState::Reviewing {
            self.transition(FlowState::Drafting);
        }
        Ok(&mut self.draft)
    }

    /// Bind a line to a product picked from the search results.
    pub fn choose_product(&mut self, index: usize, product: &Product) -> Result<()> {
        let draft = self.edit_draft()?;
        draft.assign_product(index, product.id, product.unit_label())?;
        if let Some(line) = draft.productos.get_mut(index) {
            line.nombre = product.nombre.clone();
        }
        Ok(())
    }

    pub fn request_review(&mut self) -> Result<&ReviewReport> {
        self.expect_state(&[FlowState::Drafting, FlowState::Reviewing], "revisar la factura")?;
        let report = ReviewReport::for_draft(&self.draft);
        if report.has_discrepancy {
            tracing::info!(
                entered = report.entered_total,
                computed = report.computed_total,
                "Invoice total discrepancy"
            );
        }
        self.transition(FlowState::Reviewing);
        Ok(self.review.insert(report))
    }

    pub fn confirm_review(&mut self) -> Result<ReviewDecision> {
        self.expect_state(&[FlowState::Reviewing], "confirmar la revisión")?;
        let report = ReviewReport::for_draft(&self.draft);
        let decision = if report.is_blocked() {
            self.transition(FlowState::Drafting);
            ReviewDecision::FixFields(report.missing_fields.clone())
        } else if let Some(&first) = report.missing_product_lines.first() {
            self.progress = Progress {
                done: 0,
                total: report.missing_product_lines.len(),
            };
            self.last_error = None;
            self.transition(FlowState::AutoAssigningProducts {
                line: first,
                attempts: 0,
            });
            ReviewDecision::AssignProducts(report.missing_product_lines.clone())
        } else {
            self.transition(FlowState::Submitting);
            ReviewDecision::ReadyToSubmit
        };
        self.review = Some(report);
        Ok(decision)
    }

    /// Units offered for draft lines; a fixed list stands in when the
    /// catalog cannot be loaded.
    pub async fn unit_options(&self) -> Vec<UnitOption> {
        let result = self.units.get(false).await;
        if !result.success || result.data.is_empty() {
            return fallback_units();
        }
        result
            .data
            .iter()
            .map(|u| UnitOption {
                value: if u.abreviatura.is_empty() {
                    u.nombre.clone()
                } else {
                    u.abreviatura.clone()
                },
                label: format!("{} ({})", u.nombre, u.abreviatura),
            })
            .collect()
    }

    /// Prefilled product form for the line being assigned.
    pub async fn product_seed(&self) -> Option<ProductForm> {
        let FlowState::AutoAssigningProducts { line, .. } = self.state else {
            return None;
        };
        let draft_line = self.draft.productos.get(line)?;
        let units = self.units.get(false).await;

        Some(ProductForm {
            nombre: draft_line.nombre.clone(),
            descripcion: if draft_line.nombre.is_empty() {
                String::new()
            } else {
                format!("Producto {}", draft_line.nombre)
            },
            categoria_id: 0,
            unidad_medida_id: resolve_unit_id(&units.data, &draft_line.unidad_medida),
            stock_actual: 0.0,
            stock_minimo: 0.0,
            precio_referencia: draft_line.precio_unitario,
            activo: true,
        })
    }

    /// Create the product for the current line and move to the next one.
    ///
    /// Opening stock is always zero. A failed attempt keeps the line open
    /// with the error; after the configured number of failures the flow
    /// returns to review.
    pub async fn submit_product(&mut self, mut form: ProductForm) -> Result<AssignmentOutcome> {
        let FlowState::AutoAssigningProducts { line, attempts } = self.state else {
            return Err(ConsoleError::Workflow(format!(
                "No se puede crear un producto en el estado {}",
                self.state.as_str()
            )));
        };
        form.stock_actual = 0.0;
        validator::Validate::validate(&form)?;

        let (id, unit_label) = match self.create_and_resolve(&form).await {
            Ok(resolved) => resolved,
            Err(e) => return Err(self.fail_attempt(e, line, attempts)),
        };
        self.draft.assign_product(line, id, &unit_label)?;
        self.progress.done += 1;
        self.last_error = None;
        tracing::info!(line, product_id = id, "Invoice line bound to new product");

        let missing = self.draft.missing_product_lines();
        let next = missing
            .iter()
            .copied()
            .find(|i| *i > line)
            .or_else(|| missing.first().copied());
        match next {
            Some(next) => {
                self.transition(FlowState::AutoAssigningProducts {
                    line: next,
                    attempts: 0,
                });
                Ok(AssignmentOutcome::Next { line: next })
            }
            None => {
                self.review = Some(ReviewReport::for_draft(&self.draft));
                self.transition(FlowState::Reviewing);
                Ok(AssignmentOutcome::Completed)
            }
        }
    }

    /// Returns the resolved product id and the unit label to show on the line.
    async fn create_and_resolve(&self, form: &ProductForm) -> Result<(i64, String)> {
        let created = match self.backend.create_product(form).await {
            Ok(created) => created,
            Err(ConsoleError::Rejected(message)) if message.trim().is_empty() => {
                return Err(ConsoleError::Rejected(MSG_CREATE_PRODUCT_FAILED.to_string()));
            }
            Err(e) => return Err(e),
        };
        let created_id = created.as_ref().map(|p| p.id).filter(|id| *id > 0);

        let found = match self.backend.find_product_by_name(&form.nombre).await {
            Ok(found) => found,
            Err(e) if created_id.is_some() => {
                tracing::warn!(error = %e, nombre = %form.nombre, "Lookup after product creation failed");
                None
            }
            Err(e) => return Err(e),
        };

        let id = created_id
            .or_else(|| found.as_ref().map(|p| p.id).filter(|id| *id > 0))
            .ok_or_else(|| ConsoleError::Workflow(MSG_UNRESOLVED_PRODUCT_ID.to_string()))?;
        let unit_label = [found.as_ref(), created.as_ref()]
            .into_iter()
            .flatten()
            .map(Product::unit_label)
            .find(|label| !label.is_empty())
            .unwrap_or_default()
            .to_string();

        Ok((id, unit_label))
    }

    fn fail_attempt(&mut self, error: ConsoleError, line: usize, attempts: u32) -> ConsoleError {
        let attempts = attempts + 1;
        if attempts >= self.max_attempts {
            tracing::warn!(line, attempts, "Giving up on product creation for line");
            self.review = Some(ReviewReport::for_draft(&self.draft));
            let error = self.fail(error, FlowState::Reviewing);
            if let Some(message) = self.last_error.take() {
                self.last_error = Some(format!(
                    "No se pudo crear el producto de la línea {} tras {} intentos: {}",
                    line + 1,
                    attempts,
                    message
                ));
            }
            return error;
        }
        self.fail(error, FlowState::AutoAssigningProducts { line, attempts })
    }

    /// Leave product assignment and go back to the review.
    pub fn abort_assignment(&mut self) -> Result<()> {
        if !matches!(self.state, FlowState::AutoAssigningProducts { .. }) {
            return Err(ConsoleError::Workflow(format!(
                "No hay asignación de productos en curso (estado {})",
                self.state.as_str()
            )));
        }
        self.review = Some(ReviewReport::for_draft(&self.draft));
        self.transition(FlowState::Reviewing);
        Ok(())
    }

    /// Send the reviewed draft. Creates a new invoice or replaces the one
    /// being edited.
    pub async fn submit(&mut self) -> Result<Option<&Invoice>> {
        self.expect_state(&[FlowState::Submitting], "enviar la factura")?;
        let payload = self.draft.to_payload();

        let result = match self.mode {
            FlowMode::Create => self.backend.create_invoice(&payload).await,
            FlowMode::Edit { invoice_id } => self.backend.update_invoice(invoice_id, &payload).await,
        };
        match result {
            Ok(invoice) => {
                tracing::info!(
                    codigo_interno = %payload.codigo_interno,
                    lines = payload.productos.len(),
                    "Invoice submitted"
                );
                self.last_error = None;
                self.submitted = invoice;
                self.transition(FlowState::Done);
                Ok(self.submitted.as_ref())
            }
            Err(e) => Err(self.fail(e, FlowState::Reviewing)),
        }
    }

    /// Drop the draft and return to `Idle`.
    pub fn cancel(&mut self) {
        self.image = None;
        self.draft = ProcessedInvoiceDraft::default();
        self.review = None;
        self.progress = Progress::default();
        self.last_error = None;
        self.mode = FlowMode::Create;
        self.transition(FlowState::Idle);
    }
}
