//! In-memory invoice draft edited during reconciliation.

use serde::{Deserialize, Serialize};

use crate::error::{ConsoleError, Result};
use crate::models::{Invoice, InvoiceDetail, InvoicePayload, InvoicePayloadLine, OcrInvoice};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DraftLine {
    pub id_producto: Option<i64>,
    pub nombre: String,
    pub unidad_medida: String,
    pub cantidad: f64,
    pub precio_unitario: f64,
}

impl DraftLine {
    pub fn new(nombre: &str, unidad_medida: &str, cantidad: f64, precio_unitario: f64) -> Self {
        Self {
            id_producto: None,
            nombre: nombre.to_string(),
            unidad_medida: unidad_medida.to_string(),
            cantidad,
            precio_unitario,
        }
    }

    pub fn subtotal(&self) -> f64 {
        self.cantidad * self.precio_unitario
    }

    pub fn has_product(&self) -> bool {
        self.id_producto.is_some_and(|id| id > 0)
    }

    /// Name and unit are required; quantity and price must be finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        if self.nombre.trim().is_empty() {
            return Err(ConsoleError::Validation(
                "El nombre del producto es obligatorio".to_string(),
            ));
        }
        if self.unidad_medida.trim().is_empty() {
            return Err(ConsoleError::Validation(
                "La unidad de medida es obligatoria".to_string(),
            ));
        }
        if !self.cantidad.is_finite() || self.cantidad < 0.0 {
            return Err(ConsoleError::Validation(
                "La cantidad debe ser un número mayor o igual a 0".to_string(),
            ));
        }
        if !self.precio_unitario.is_finite() || self.precio_unitario < 0.0 {
            return Err(ConsoleError::Validation(
                "El precio unitario debe ser un número mayor o igual a 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProcessedInvoiceDraft {
    pub codigo_interno: String,
    pub concepto: String,
    /// `YYYY-MM-DD`, or empty when the source date was unusable.
    pub fecha_movimiento: String,
    pub total: f64,
    pub observaciones: String,
    pub productos: Vec<DraftLine>,
}

impl ProcessedInvoiceDraft {
    pub fn from_ocr(ocr: OcrInvoice) -> Self {
        let productos = ocr
            .productos
            .into_iter()
            .map(|line| DraftLine {
                id_producto: line.id_producto,
                nombre: line.nombre.or(line.producto_nombre).unwrap_or_default(),
                unidad_medida: line
                    .unidad_medida
                    .or(line.producto_unidad_medida)
                    .unwrap_or_default(),
                cantidad: line.cantidad,
                precio_unitario: line.precio_unitario,
            })
            .collect();

        Self {
            codigo_interno: ocr.codigo_interno,
            concepto: ocr.concepto,
            fecha_movimiento: normalize_date(&ocr.fecha_movimiento),
            total: ocr.total,
            observaciones: ocr.observaciones,
            productos,
        }
    }

    /// Rebuild a draft from a stored invoice and its detail lines.
    pub fn from_invoice(invoice: &Invoice, details: &[InvoiceDetail]) -> Self {
        let productos = details
            .iter()
            .map(|detail| DraftLine {
                id_producto: Some(detail.producto_id).filter(|id| *id > 0),
                nombre: detail.producto_nombre.clone(),
                unidad_medida: detail.producto_unidad_medida.clone().unwrap_or_default(),
                cantidad: detail.cantidad,
                precio_unitario: detail.precio_unitario,
            })
            .collect();

        Self {
            codigo_interno: invoice.codigo_interno.clone(),
            concepto: invoice.concepto.clone(),
            fecha_movimiento: invoice
                .movement_date()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            total: invoice.total,
            observaciones: invoice.observaciones.clone(),
            productos,
        }
    }

    pub fn add_line(&mut self, line: DraftLine) -> Result<()> {
        line.validate()?;
        self.productos.push(line);
        Ok(())
    }

    pub fn update_line(&mut self, index: usize, line: DraftLine) -> Result<()> {
        line.validate()?;
        let slot = self.productos.get_mut(index).ok_or_else(|| line_not_found(index))?;
        *slot = line;
        Ok(())
    }

    pub fn remove_line(&mut self, index: usize) -> Result<DraftLine> {
        if index >= self.productos.len() {
            return Err(line_not_found(index));
        }
        Ok(self.productos.remove(index))
    }

    /// Record the product resolved for a line.
    pub fn assign_product(&mut self, index: usize, product_id: i64, unit_label: &str) -> Result<()> {
        let line = self.productos.get_mut(index).ok_or_else(|| line_not_found(index))?;
        line.id_producto = Some(product_id);
        if !unit_label.trim().is_empty() {
            line.unidad_medida = unit_label.to_string();
        }
        Ok(())
    }

    pub fn computed_total(&self) -> f64 {
        self.productos.iter().map(DraftLine::subtotal).sum()
    }

    /// Indices of lines without a usable product id, in order.
    pub fn missing_product_lines(&self) -> Vec<usize> {
        self.productos
            .iter()
            .enumerate()
            .filter(|(_, line)| !line.has_product())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn to_payload(&self) -> InvoicePayload {
        InvoicePayload {
            codigo_interno: self.codigo_interno.trim().to_string(),
            concepto: self.concepto.trim().to_string(),
            fecha_movimiento: self.fecha_movimiento.trim().to_string(),
            total: self.total,
            observaciones: self.observaciones.clone(),
            productos: self
                .productos
                .iter()
                .map(|line| InvoicePayloadLine {
                    id_producto: line.id_producto.filter(|id| *id > 0),
                    nombre: line.nombre.trim().to_string(),
                    unidad_medida: line.unidad_medida.trim().to_string(),
                    cantidad: line.cantidad,
                    precio_unitario: line.precio_unitario,
                })
                .collect(),
        }
    }
}

fn line_not_found(index: usize) -> ConsoleError {
    ConsoleError::Validation(format!("La línea {} no existe", index + 1))
}

/// `DD-MM-YYYY` becomes `YYYY-MM-DD`, `YYYY-MM-DD` is kept, anything else
/// becomes empty.
pub fn normalize_date(input: &str) -> String {
    let input = input.trim();
    let parts: Vec<&str> = input.split('-').collect();
    if parts.len() != 3 || !parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit())) {
        return String::new();
    }

    match (parts[0].len(), parts[1].len(), parts[2].len()) {
        (2, 2, 4) => format!("{}-{}-{}", parts[2], parts[1], parts[0]),
        (4, 2, 2) => input.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OcrLine;
    use serde_json::json;

    #[test]
    fn test_normalize_date() {
        assert_eq!(normalize_date("05-03-2024"), "2024-03-05");
        assert_eq!(normalize_date("2024-03-05"), "2024-03-05");
        assert_eq!(normalize_date("5/3/2024"), "");
        assert_eq!(normalize_date("2024-3-5"), "");
        assert_eq!(normalize_date("ab-cd-efgh"), "");
        assert_eq!(normalize_date(""), "");
    }

    #[test]
    fn test_from_ocr_uses_name_aliases() {
        let draft = ProcessedInvoiceDraft::from_ocr(OcrInvoice {
            codigo_interno: "F-001".into(),
            concepto: "Compra".into(),
            fecha_movimiento: "15-01-2024".into(),
            total: 12.0,
            observaciones: String::new(),
            productos: vec![
                OcrLine {
                    nombre: Some("Leche".into()),
                    unidad_medida: Some("lt".into()),
                    cantidad: 2.0,
                    precio_unitario: 1.5,
                    ..Default::default()
                },
                OcrLine {
                    id_producto: Some(7),
                    producto_nombre: Some("Arroz".into()),
                    producto_unidad_medida: Some("kg".into()),
                    cantidad: 3.0,
                    precio_unitario: 3.0,
                    ..Default::default()
                },
            ],
        });

        assert_eq!(draft.fecha_movimiento, "2024-01-15");
        assert_eq!(draft.productos[1].nombre, "Arroz");
        assert_eq!(draft.productos[1].unidad_medida, "kg");
        assert_eq!(draft.missing_product_lines(), vec![0]);
        assert_eq!(draft.computed_total(), 12.0);
    }

    #[test]
    fn test_from_invoice_details() {
        let invoice: Invoice = serde_json::from_value(json!({
            "id": 3,
            "codigo_interno": "F-003",
            "concepto": "Reposición",
            "fecha_movimiento": "2024-02-10T05:00:00.000Z",
            "total": "10.00",
            "estado": "BORRADOR"
        }))
        .unwrap();
        let detail: InvoiceDetail = serde_json::from_value(json!({
            "id": 1,
            "factura_id": 3,
            "producto_id": 9,
            "cantidad": "4",
            "precio_unitario": "2.5",
            "producto_nombre": "Azúcar",
            "producto_unidad_medida": "kg"
        }))
        .unwrap();

        let draft = ProcessedInvoiceDraft::from_invoice(&invoice, &[detail]);
        assert_eq!(draft.fecha_movimiento, "2024-02-10");
        assert_eq!(draft.productos[0].id_producto, Some(9));
        assert!(draft.missing_product_lines().is_empty());
    }

    #[test]
    fn test_add_line_validation() {
        let mut draft = ProcessedInvoiceDraft::default();
        assert!(draft.add_line(DraftLine::new(" ", "kg", 1.0, 1.0)).is_err());
        assert!(draft.add_line(DraftLine::new("Sal", "", 1.0, 1.0)).is_err());
        assert!(draft.add_line(DraftLine::new("Sal", "kg", -1.0, 1.0)).is_err());
        assert!(draft.add_line(DraftLine::new("Sal", "kg", 1.0, f64::NAN)).is_err());
        assert!(draft.add_line(DraftLine::new("Sal", "kg", 0.0, 0.0)).is_ok());
        assert_eq!(draft.productos.len(), 1);
    }

    #[test]
    fn test_edit_and_remove_lines() {
        let mut draft = ProcessedInvoiceDraft::default();
        draft.add_line(DraftLine::new("Sal", "kg", 1.0, 1.0)).unwrap();
        draft.add_line(DraftLine::new("Azúcar", "kg", 2.0, 1.0)).unwrap();

        draft.update_line(0, DraftLine::new("Sal fina", "kg", 3.0, 1.0)).unwrap();
        assert_eq!(draft.computed_total(), 5.0);

        let bad = DraftLine::new("Sal fina", "kg", f64::NAN, 1.0);
        assert!(draft.update_line(0, bad).is_err());
        assert!(draft.update_line(1, DraftLine::new("Azúcar", "kg", 2.0, -1.0)).is_err());
        assert_eq!(draft.productos[0].cantidad, 3.0);
        assert_eq!(draft.computed_total(), 5.0);

        let removed = draft.remove_line(1).unwrap();
        assert_eq!(removed.nombre, "Azúcar");
        assert!(draft.remove_line(5).is_err());
        assert!(draft.assign_product(3, 1, "kg").is_err());
    }

    #[test]
    fn test_missing_ids_include_non_positive() {
        let mut draft = ProcessedInvoiceDraft::default();
        let mut zero = DraftLine::new("A", "kg", 1.0, 1.0);
        zero.id_producto = Some(0);
        let mut ok = DraftLine::new("B", "kg", 1.0, 1.0);
        ok.id_producto = Some(4);
        draft.productos = vec![zero, ok, DraftLine::new("C", "kg", 1.0, 1.0)];

        assert_eq!(draft.missing_product_lines(), vec![0, 2]);
    }

    #[test]
    fn test_payload_is_trimmed() {
        let mut line = DraftLine::new("  Leche ", " lt ", 2.0, 1.25);
        line.id_producto = Some(5);
        let draft = ProcessedInvoiceDraft {
            codigo_interno: " F-9 ".into(),
            concepto: " Compra ".into(),
            fecha_movimiento: "2024-01-01 ".into(),
            total: 2.5,
            observaciones: "nota".into(),
            productos: vec![line],
        };

        let payload = draft.to_payload();
        assert_eq!(payload.codigo_interno, "F-9");
        assert_eq!(payload.concepto, "Compra");
        assert_eq!(payload.fecha_movimiento, "2024-01-01");
        assert_eq!(payload.productos[0].nombre, "Leche");
        assert_eq!(payload.productos[0].unidad_medida, "lt");
        assert_eq!(payload.productos[0].id_producto, Some(5));
    }
}
