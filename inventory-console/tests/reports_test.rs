mod common;

use chrono::NaiveDate;
use common::{envelope, invoice_json, product_json, spawn_console};
use inventory_console::error::MSG_SERVER_ERROR;
use inventory_console::reports::{ReportFilters, ALL_PERIODS};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

async fn mount_confirmed_invoices(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/facturas-internas"))
        .and(query_param("estado", "CONFIRMADA"))
        .and(query_param("limit", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "invoices": [
                invoice_json(1, "2024-01-15", "30.00", "CONFIRMADA"),
                invoice_json(2, "2024-02-03T09:30:00.000Z", "12.50", "CONFIRMADA"),
                invoice_json(3, "2024-03-20", "8.00", "CONFIRMADA")
            ],
            "total": 3, "page": 1, "totalPages": 1
        }))))
        .mount(server)
        .await;

    let details = [
        (1, vec![(4, "3.0000")]),
        (2, vec![(4, "2.0000"), (5, "1.0000")]),
        (3, vec![(5, "4")]),
    ];
    for (factura, lines) in details {
        let body: Vec<_> = lines
            .into_iter()
            .map(|(producto, cantidad)| {
                json!({
                    "id": factura * 10 + producto,
                    "factura_id": factura,
                    "producto_id": producto,
                    "cantidad": cantidad,
                    "precio_unitario": "2.0000",
                    "producto_nombre": if producto == 4 { "Leche" } else { "Azúcar" }
                })
            })
            .collect();
        Mock::given(method("GET"))
            .and(path(format!("/detalles-factura/factura/{}", factura)))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!(body))))
            .mount(server)
            .await;
    }
}

async fn mount_products(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/productos"))
        .and(query_param("limit", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "products": [product_json(4, "Leche", "l"), product_json(5, "Azúcar", "kg")],
            "pagination": {"current": 1, "pageSize": 1000, "total": 2, "totalPages": 1}
        }))))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_dashboard_over_http() {
    let app = spawn_console().await;
    mount_products(&app.server).await;
    mount_confirmed_invoices(&app.server).await;

    let dashboard = app.console.reports.dashboard(&ReportFilters::default()).await;

    let inventory = dashboard.inventory.data.unwrap();
    assert_eq!(inventory.total_products, 2);
    assert_eq!(inventory.total_value, 30.0);

    let financial = dashboard.financial.data.unwrap();
    assert_eq!(financial.period, ALL_PERIODS);
    assert_eq!(financial.total_spent, 50.5);
    assert_eq!(financial.monthly_comparison.len(), 3);

    let valuation = dashboard.valuation.data.unwrap();
    assert_eq!(valuation.current_value, 30.0);
    assert_eq!(valuation.historical_values.len(), 3);
    assert_eq!(valuation.projected_value, Some(50.5 / 3.0));
}

#[tokio::test]
async fn test_date_range_limits_consumption_and_rotation() {
    let app = spawn_console().await;
    mount_products(&app.server).await;
    mount_confirmed_invoices(&app.server).await;

    let filters = ReportFilters::between(date("2024-02-01"), date("2024-03-31"));
    let consumption = app.console.reports.consumption(&filters).await.unwrap();

    assert_eq!(consumption.period, "2024-02-01 - 2024-03-31");
    assert_eq!(consumption.total_consumed, 7.0);
    let leche = consumption
        .products
        .iter()
        .find(|p| p.product_id == 4)
        .unwrap();
    assert_eq!(leche.quantity_consumed, 2.0);

    let rotation = app.console.reports.rotation(&filters).await.unwrap();
    assert_eq!(rotation.top_high_rotation[0].product_id, 5);
    assert_eq!(rotation.top_high_rotation[0].quantity_moved, 5.0);
}

#[tokio::test]
async fn test_product_failure_leaves_other_sections() {
    let app = spawn_console().await;
    mount_confirmed_invoices(&app.server).await;

    Mock::given(method("GET"))
        .and(path("/productos"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.server)
        .await;

    let dashboard = app.console.reports.dashboard(&ReportFilters::default()).await;

    assert_eq!(dashboard.inventory.error.as_deref(), Some(MSG_SERVER_ERROR));
    assert_eq!(dashboard.valuation.error.as_deref(), Some(MSG_SERVER_ERROR));
    assert!(dashboard.consumption.is_ok());
    assert!(dashboard.financial.is_ok());
    assert!(dashboard.rotation.is_ok());
}
