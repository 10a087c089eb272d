use serde::Serialize;

use crate::models::{Product, StockLevel};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryReport {
    pub products: Vec<Product>,
    pub total_value: f64,
    pub total_products: usize,
    pub low_stock_count: usize,
    pub critical_stock_count: usize,
}

pub fn build(products: Vec<Product>) -> InventoryReport {
    let mut total_value = 0.0;
    let mut low_stock_count = 0;
    let mut critical_stock_count = 0;

    for product in &products {
        total_value += product.stock_value();
        match product.stock_level() {
            StockLevel::Critical => critical_stock_count += 1,
            StockLevel::Low => low_stock_count += 1,
            StockLevel::Normal => {}
        }
    }

    InventoryReport {
        total_products: products.len(),
        products,
        total_value,
        low_stock_count,
        critical_stock_count,
    }
}
