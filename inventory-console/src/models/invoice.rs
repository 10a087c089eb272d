use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::lenient::{f64_from_any, opt_f64_from_any, string_or_empty};

/// Tolerance used wherever two money amounts are compared.
pub const AMOUNT_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Borrador,
    Confirmada,
    Anulada,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Borrador => "BORRADOR",
            InvoiceStatus::Confirmada => "CONFIRMADA",
            InvoiceStatus::Anulada => "ANULADA",
        }
    }

    /// Only drafts may be edited; the other two states are terminal.
    pub fn is_editable(&self) -> bool {
        matches!(self, InvoiceStatus::Borrador)
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BORRADOR" => Ok(InvoiceStatus::Borrador),
            "CONFIRMADA" => Ok(InvoiceStatus::Confirmada),
            "ANULADA" => Ok(InvoiceStatus::Anulada),
            other => Err(format!("Estado de factura desconocido: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,
    pub codigo_interno: String,
    #[serde(default)]
    pub tipo_movimiento_id: i64,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub concepto: String,
    #[serde(default)]
    pub usuario_responsable_id: i64,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub fecha_movimiento: String,
    #[serde(default, deserialize_with = "f64_from_any")]
    pub total: f64,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub observaciones: String,
    pub estado: InvoiceStatus,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub fecha_creacion: String,
    #[serde(default)]
    pub fecha_actualizacion: Option<String>,
}

impl Invoice {
    /// Calendar date of the movement; accepts plain dates and ISO timestamps.
    pub fn movement_date(&self) -> Option<NaiveDate> {
        let prefix = self.fecha_movimiento.get(..10)?;
        NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
    }
}

/// One line of `GET /detalles-factura/factura/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDetail {
    pub id: i64,
    pub factura_id: i64,
    pub producto_id: i64,
    #[serde(deserialize_with = "f64_from_any")]
    pub cantidad: f64,
    #[serde(deserialize_with = "f64_from_any")]
    pub precio_unitario: f64,
    #[serde(default, deserialize_with = "opt_f64_from_any")]
    pub subtotal: Option<f64>,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub producto_nombre: String,
    #[serde(default)]
    pub producto_unidad_medida: Option<String>,
}

impl InvoiceDetail {
    pub fn computed_subtotal(&self) -> f64 {
        self.cantidad * self.precio_unitario
    }

    /// Whether the server subtotal agrees with `cantidad × precio_unitario`.
    ///
    /// Informational only. A missing server value counts as a match.
    pub fn subtotal_matches(&self) -> bool {
        self.subtotal
            .map(|s| (s - self.computed_subtotal()).abs() <= AMOUNT_TOLERANCE)
            .unwrap_or(true)
    }
}

/// Body for the header-only `PUT /facturas-internas/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceHeaderUpdate {
    pub codigo_interno: String,
    pub concepto: String,
    pub fecha_movimiento: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
    pub estado: InvoiceStatus,
}

/// Product line as returned by `POST /images/process`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OcrLine {
    #[serde(default)]
    pub id_producto: Option<i64>,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub unidad_medida: Option<String>,
    #[serde(default)]
    pub producto_nombre: Option<String>,
    #[serde(default)]
    pub producto_unidad_medida: Option<String>,
    #[serde(default, deserialize_with = "f64_from_any")]
    pub cantidad: f64,
    #[serde(default, deserialize_with = "f64_from_any")]
    pub precio_unitario: f64,
}

/// Extracted invoice as returned by `POST /images/process`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OcrInvoice {
    #[serde(default, deserialize_with = "string_or_empty")]
    pub codigo_interno: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub concepto: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub fecha_movimiento: String,
    #[serde(default, deserialize_with = "f64_from_any")]
    pub total: f64,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub observaciones: String,
    #[serde(default)]
    pub productos: Vec<OcrLine>,
}

/// Body of `POST /facturas-internas` and the full `PUT /facturas-internas/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoicePayload {
    pub codigo_interno: String,
    pub concepto: String,
    pub fecha_movimiento: String,
    pub total: f64,
    pub observaciones: String,
    pub productos: Vec<InvoicePayloadLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoicePayloadLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_producto: Option<i64>,
    pub nombre: String,
    pub unidad_medida: String,
    pub cantidad: f64,
    pub precio_unitario: f64,
}
