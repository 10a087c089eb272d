use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PERMISSION_ADMIN: u32 = 1;
pub const PERMISSION_READ: u32 = 2;
pub const PERMISSION_WRITE: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionInfo {
    pub id: u32,
    pub nombre: String,
}

impl PermissionInfo {
    /// Accept `{id, nombre}` where `id` is numeric (or numeric text) and
    /// `nombre` is non-empty.
    pub fn from_raw(value: &Value) -> Option<Self> {
        let id = numeric(value.get("id")?)?;
        let nombre = match value.get("nombre")? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        if nombre.is_empty() || id < 0.0 || id.fract() != 0.0 {
            return None;
        }
        Some(Self {
            id: id as u32,
            nombre,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub nombre: String,
    pub descripcion: String,
    pub activo: bool,
    pub permisos: Vec<PermissionInfo>,
    pub fecha_creacion: String,
    pub fecha_actualizacion: String,
}

impl Role {
    /// Normalize one raw role entry; `None` when the id is not numeric.
    ///
    /// Malformed permissions inside an otherwise valid role are dropped.
    pub fn from_raw(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let id = numeric(obj.get("id")?)?;
        let permisos = obj
            .get("permisos")
            .and_then(Value::as_array)
            .map(|raw| raw.iter().filter_map(PermissionInfo::from_raw).collect())
            .unwrap_or_default();

        Some(Self {
            id: id as i64,
            nombre: text(obj.get("nombre")),
            descripcion: text(obj.get("descripcion")),
            activo: truthy(obj.get("activo")),
            permisos,
            fecha_creacion: text(obj.get("fecha_creacion")),
            fecha_actualizacion: text(obj.get("fecha_actualizacion")),
        })
    }

    pub fn permission_ids(&self) -> Vec<u32> {
        self.permisos.iter().map(|p| p.id).collect()
    }
}

/// Body for `POST /roles` and `PUT /roles/{id}`.
///
/// Only [`crate::roles::RoleEditor::to_request`] builds one, so the
/// permission set always satisfies the editor's selection rules.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleRequest {
    pub(crate) nombre: String,
    pub(crate) descripcion: String,
    pub(crate) activo: bool,
    pub(crate) permisos_ids: Vec<u32>,
}

impl RoleRequest {
    pub fn nombre(&self) -> &str {
        &self.nombre
    }

    pub fn permisos_ids(&self) -> &[u32] {
        &self.permisos_ids
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        None | Some(Value::Null) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_normalization_drops_bad_permissions() {
        let role = Role::from_raw(&json!({
            "id": "7",
            "nombre": "Bodega",
            "descripcion": null,
            "activo": 1,
            "permisos": [
                {"id": 2, "nombre": "lectura"},
                {"id": "x", "nombre": "rota"},
                {"id": 3, "nombre": ""},
                {"id": 3, "nombre": "escritura"}
            ]
        }))
        .unwrap();

        assert_eq!(role.id, 7);
        assert!(role.activo);
        assert_eq!(role.descripcion, "");
        assert_eq!(role.permission_ids(), vec![2, 3]);
    }

    #[test]
    fn test_role_without_numeric_id_is_rejected() {
        assert!(Role::from_raw(&json!({"id": "abc", "nombre": "x"})).is_none());
        assert!(Role::from_raw(&json!("not an object")).is_none());
    }

    #[test]
    fn test_request_uses_permisos_ids() {
        let body = serde_json::to_value(RoleRequest {
            nombre: "Auditor".into(),
            descripcion: "Solo lectura".into(),
            activo: true,
            permisos_ids: vec![2],
        })
        .unwrap();
        assert_eq!(body["permisos_ids"], json!([2]));
    }
}
