use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use super::InvoiceLines;

pub const TOP_ROTATION_LIMIT: usize = 10;
/// Placeholder until the backend tracks replenishment.
pub const AVERAGE_REPLENISHMENT_DAYS: u32 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRotation {
    pub product_id: i64,
    pub product_name: String,
    /// Quantity moved per movement.
    pub rotation_rate: f64,
    pub quantity_moved: f64,
    pub movements: u32,
    pub last_movement: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RotationReport {
    pub top_high_rotation: Vec<ProductRotation>,
    pub top_low_rotation: Vec<ProductRotation>,
    pub average_replenishment_days: u32,
}

pub fn build(lines: &[InvoiceLines]) -> RotationReport {
    let mut rotations: Vec<ProductRotation> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();

    for (invoice, details) in lines {
        let moved_on = invoice.movement_date();
        for detail in details {
            let i = *index.entry(detail.producto_id).or_insert_with(|| {
                rotations.push(ProductRotation {
                    product_id: detail.producto_id,
                    product_name: detail.producto_nombre.clone(),
                    rotation_rate: 0.0,
                    quantity_moved: 0.0,
                    movements: 0,
                    last_movement: None,
                });
                rotations.len() - 1
            });
            let entry = &mut rotations[i];
            entry.quantity_moved += detail.cantidad;
            entry.movements += 1;
            entry.last_movement = entry.last_movement.max(moved_on);
        }
    }

    for entry in &mut rotations {
        entry.rotation_rate = entry.quantity_moved / f64::from(entry.movements);
    }
    // stable: equal rates keep first-appearance order; NaN ranks lowest
    rotations.sort_by(|a, b| rank(b.rotation_rate).total_cmp(&rank(a.rotation_rate)));

    let top_high_rotation = rotations.iter().take(TOP_ROTATION_LIMIT).cloned().collect();
    let top_low_rotation = rotations
        .iter()
        .rev()
        .take(TOP_ROTATION_LIMIT)
        .cloned()
        .collect();

    RotationReport {
        top_high_rotation,
        top_low_rotation,
        average_replenishment_days: AVERAGE_REPLENISHMENT_DAYS,
    }
}

fn rank(rate: f64) -> f64 {
    if rate.is_nan() {
        f64::NEG_INFINITY
    } else {
        rate
    }
}
