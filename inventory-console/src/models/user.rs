use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use super::lenient::bool_from_any;
use crate::utils::validation::{cedula_rule, password_rule};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub cedula: String,
    pub nombre_usuario: String,
    pub correo: String,
    pub rol_id: i64,
    #[serde(deserialize_with = "bool_from_any")]
    pub activo: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_creacion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_actualizacion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ultimo_acceso: Option<String>,
}

const LOGIN_REQUIRED_KEYS: [&str; 6] = ["id", "nombre_usuario", "correo", "rol_id", "activo", "cedula"];

impl UserInfo {
    /// Normalize the `user` object of a login response.
    ///
    /// All of `id, nombre_usuario, correo, rol_id, activo, cedula` must be
    /// present; the error lists the missing keys.
    pub fn from_login(value: &Value) -> Result<Self, String> {
        let obj = value
            .as_object()
            .ok_or_else(|| "Respuesta de login inválida".to_string())?;

        let missing: Vec<&str> = LOGIN_REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| !obj.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return Err(format!(
                "Campos obligatorios faltantes: {}",
                missing.join(", ")
            ));
        }

        let number = |key: &str| -> i64 {
            match obj.get(key) {
                Some(Value::Number(n)) => n.as_f64().map(|v| v as i64).unwrap_or(0),
                Some(Value::String(s)) => s.trim().parse::<i64>().unwrap_or(0),
                _ => 0,
            }
        };
        let text = |key: &str| -> String {
            match obj.get(key) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            }
        };
        let optional = |key: &str| -> Option<String> {
            obj.get(key).and_then(Value::as_str).map(str::to_string)
        };
        let activo = match obj.get("activo") {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64() == Some(1.0),
            Some(Value::String(s)) => s.trim() == "1",
            _ => false,
        };

        Ok(Self {
            id: number("id"),
            cedula: text("cedula"),
            nombre_usuario: text("nombre_usuario"),
            correo: text("correo"),
            rol_id: number("rol_id"),
            activo,
            fecha_creacion: optional("fecha_creacion"),
            fecha_actualizacion: optional("fecha_actualizacion"),
            ultimo_acceso: optional("ultimo_acceso"),
        })
    }
}

/// Login credentials; the password is already HMAC-digested.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub correo: String,
    pub password: String,
}

/// Raw login response; `user` and `permissions` are normalized by the session.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Value,
    #[serde(default)]
    pub permissions: Option<Vec<Value>>,
}

/// Registration form as typed by the operator, before encryption.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(custom(function = "cedula_rule"))]
    pub cedula: String,
    #[validate(length(min = 1, max = 100, message = "El nombre de usuario es obligatorio"))]
    pub nombre_usuario: String,
    #[validate(email(message = "Correo electrónico inválido"))]
    pub correo: String,
    #[validate(custom(function = "password_rule"))]
    pub password: String,
    #[validate(range(min = 1, message = "Seleccione un rol"))]
    pub rol_id: i64,
}

/// Wire body of `POST /register`: encrypted cédula, digested password.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterPayload {
    pub cedula: String,
    pub nombre_usuario: String,
    pub correo: String,
    pub password: String,
    pub rol_id: i64,
}

/// Wire body of `PUT /profile`; `cedula` is already encrypted.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpdate {
    #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    pub cedula: String,
    pub nombre_usuario: String,
    pub correo: String,
    pub estado: bool,
}

/// Wire body of `PUT /update-password`; both values are HMAC digests.
#[derive(Debug, Clone, Serialize)]
pub struct PasswordUpdate {
    #[serde(rename = "oldPassword")]
    pub old_password: String,
    #[serde(rename = "newPassword")]
    pub new_password: String,
}

/// Response of the profile and registration endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct UserMutationResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<UserInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_login_user_normalization() {
        let user = UserInfo::from_login(&json!({
            "id": "12",
            "nombre_usuario": "ana",
            "correo": "ana@example.com",
            "rol_id": 2,
            "activo": 1,
            "cedula": "cipher==",
            "ultimo_acceso": null
        }))
        .unwrap();

        assert_eq!(user.id, 12);
        assert!(user.activo);
        assert_eq!(user.rol_id, 2);
        assert!(user.ultimo_acceso.is_none());
    }

    #[test]
    fn test_login_user_missing_keys() {
        let err = UserInfo::from_login(&json!({
            "id": 1,
            "nombre_usuario": "ana",
            "correo": "ana@example.com"
        }))
        .unwrap_err();

        assert_eq!(err, "Campos obligatorios faltantes: rol_id, activo, cedula");
    }

    #[test]
    fn test_activo_zero_is_inactive() {
        let user = UserInfo::from_login(&json!({
            "id": 1, "nombre_usuario": "a", "correo": "a@b.co", "rol_id": 1, "activo": 0, "cedula": "x"
        }))
        .unwrap();
        assert!(!user.activo);
    }

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            cedula: "1710034065".into(),
            nombre_usuario: "ana".into(),
            correo: "ana@example.com".into(),
            password: "Abc123!45".into(),
            rol_id: 2,
        };
        assert!(valid.validate().is_ok());

        let bad_cedula = RegisterRequest {
            cedula: "1710034066".into(),
            ..valid.clone()
        };
        assert!(bad_cedula.validate().is_err());

        let weak = RegisterRequest {
            password: "Abc12345".into(),
            ..valid
        };
        assert!(weak.validate().is_err());
    }

    #[test]
    fn test_password_update_wire_names() {
        let body = serde_json::to_value(PasswordUpdate {
            old_password: "a".into(),
            new_password: "b".into(),
        })
        .unwrap();
        assert_eq!(body, json!({"oldPassword": "a", "newPassword": "b"}));
    }
}
