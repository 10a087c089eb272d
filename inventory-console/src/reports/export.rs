//! CSV output for the inventory and consumption tables.
//!
//! Files are named `<base>_<YYYY-MM-DD>.csv`, stamped with the export date.

use chrono::NaiveDate;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{ConsumptionReport, DashboardReport, InventoryReport};
use crate::error::Result;
use crate::models::StockLevel;

pub const INVENTORY_FILE: &str = "inventario_actual";
pub const CONSUMPTION_FILE: &str = "consumo_historico";

const INVENTORY_HEADERS: [&str; 9] = [
    "ID",
    "Nombre",
    "Categoría",
    "Stock Actual",
    "Stock Mínimo",
    "Unidad",
    "Precio Referencia",
    "Valor Total",
    "Estado",
];
const CONSUMPTION_HEADERS: [&str; 4] = ["ID Producto", "Nombre", "Cantidad Consumida", "Unidad"];

pub fn export_file_name(base: &str, date: NaiveDate) -> String {
    format!("{}_{}.csv", base, date.format("%Y-%m-%d"))
}

fn csv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer)
}

fn stock_label(level: StockLevel) -> &'static str {
    match level {
        StockLevel::Critical => "Crítico",
        StockLevel::Low => "Bajo",
        StockLevel::Normal => "Normal",
    }
}

pub fn write_inventory_csv<W: Write>(report: &InventoryReport, writer: W) -> Result<()> {
    let mut csv = csv_writer(writer);
    csv.write_record(INVENTORY_HEADERS)?;
    for product in &report.products {
        csv.write_record([
            product.id.to_string(),
            product.nombre.clone(),
            product.categoria_id.to_string(),
            product.stock_actual.to_string(),
            product.stock_minimo.to_string(),
            product.unit_label().to_string(),
            format!("{:.2}", product.precio_referencia),
            format!("{:.2}", product.stock_value()),
            stock_label(product.stock_level()).to_string(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_consumption_csv<W: Write>(report: &ConsumptionReport, writer: W) -> Result<()> {
    let mut csv = csv_writer(writer);
    csv.write_record(CONSUMPTION_HEADERS)?;
    for product in &report.products {
        csv.write_record([
            product.product_id.to_string(),
            product.product_name.clone(),
            product.quantity_consumed.to_string(),
            product.unit.clone(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

/// Write every table the dashboard managed to load into `dir`.
///
/// Sections that failed are skipped. Returns the paths written.
pub fn write_dashboard_csv(
    dashboard: &DashboardReport,
    dir: &Path,
    date: NaiveDate,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    if let Some(inventory) = dashboard.inventory.data.as_ref() {
        let path = dir.join(export_file_name(INVENTORY_FILE, date));
        write_inventory_csv(inventory, std::fs::File::create(&path)?)?;
        written.push(path);
    }
    if let Some(consumption) = dashboard.consumption.data.as_ref() {
        let path = dir.join(export_file_name(CONSUMPTION_FILE, date));
        write_consumption_csv(consumption, std::fs::File::create(&path)?)?;
        written.push(path);
    }

    if written.is_empty() {
        tracing::warn!(dir = %dir.display(), "No report data to export");
    } else {
        tracing::info!(files = written.len(), dir = %dir.display(), "Reports exported to CSV");
    }
    Ok(written)
}
