use serde::Serialize;
use std::collections::HashMap;

use super::InvoiceLines;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumedProduct {
    pub product_id: i64,
    pub product_name: String,
    pub quantity_consumed: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumptionReport {
    pub period: String,
    pub total_consumed: f64,
    pub products: Vec<ConsumedProduct>,
}

/// Sum detail quantities per product, in order of first appearance. Name
/// and unit come from the first line seen for each product.
pub fn build(period: String, lines: &[InvoiceLines]) -> ConsumptionReport {
    let mut products: Vec<ConsumedProduct> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();

    for detail in lines.iter().flat_map(|(_, details)| details) {
        match index.get(&detail.producto_id) {
            Some(&i) => products[i].quantity_consumed += detail.cantidad,
            None => {
                index.insert(detail.producto_id, products.len());
                products.push(ConsumedProduct {
                    product_id: detail.producto_id,
                    product_name: detail.producto_nombre.clone(),
                    quantity_consumed: detail.cantidad,
                    unit: detail.producto_unidad_medida.clone().unwrap_or_default(),
                });
            }
        }
    }

    ConsumptionReport {
        period,
        total_consumed: products.iter().map(|p| p.quantity_consumed).sum(),
        products,
    }
}
