//! Shared harness: a console wired to a wiremock backend.

#![allow(dead_code)]

use inventory_console::config::{
    ApiSettings, CryptoSettings, ReportSettings, SearchSettings, SessionSettings, Settings,
    TelemetrySettings, WorkflowSettings,
};
use inventory_console::session::{AppContext, SharedSession};
use inventory_console::Console;
use secrecy::Secret;
use serde_json::{json, Value};
use wiremock::MockServer;

pub const TEST_SECRET: &str = "test-secret";

pub struct TestConsole {
    pub server: MockServer,
    pub console: Console,
    pub session: SharedSession,
}

pub fn settings(base_url: &str) -> Settings {
    Settings {
        api: ApiSettings {
            base_url: base_url.to_string(),
            timeout_secs: 5,
        },
        crypto: CryptoSettings {
            secret: Secret::new(TEST_SECRET.to_string()),
        },
        search: SearchSettings::default(),
        reports: ReportSettings::default(),
        workflow: WorkflowSettings::default(),
        telemetry: TelemetrySettings::default(),
        session: SessionSettings::default(),
    }
}

/// Start a mock backend and a console pointed at it.
pub async fn spawn_console() -> TestConsole {
    console_core::observability::init_test_tracing();

    let server = MockServer::start().await;
    let session = AppContext::default().shared();
    let console = Console::new(settings(&server.uri()), session.clone())
        .expect("Failed to build console");

    TestConsole {
        server,
        console,
        session,
    }
}

/// `{success: true, message, data}` envelope.
pub fn envelope(data: Value) -> Value {
    json!({"success": true, "message": "ok", "data": data})
}

pub fn failure(message: &str) -> Value {
    json!({"success": false, "message": message})
}

pub fn product_json(id: i64, nombre: &str, unit: &str) -> Value {
    json!({
        "id": id,
        "nombre": nombre,
        "descripcion": format!("Producto {}", nombre),
        "categoria_id": 1,
        "unidad_medida": unit,
        "stock_actual": "10.0000",
        "stock_minimo": "2.0000",
        "precio_referencia": "1.5000",
        "activo": 1,
        "fecha_creacion": "2024-01-01T00:00:00.000Z"
    })
}

pub fn invoice_json(id: i64, fecha: &str, total: &str, estado: &str) -> Value {
    json!({
        "id": id,
        "codigo_interno": format!("F-{:03}", id),
        "tipo_movimiento_id": 1,
        "concepto": "Compra",
        "usuario_responsable_id": 1,
        "fecha_movimiento": fecha,
        "total": total,
        "observaciones": "",
        "estado": estado,
        "fecha_creacion": fecha
    })
}

pub fn login_user() -> Value {
    json!({
        "id": 7,
        "cedula": "1710034065",
        "nombre_usuario": "operador",
        "correo": "operador@example.com",
        "rol_id": 2,
        "activo": 1
    })
}
