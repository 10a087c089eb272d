use serde::{Deserialize, Serialize};
use validator::Validate;

use super::lenient::{bool_from_any, string_or_empty};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub nombre: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub descripcion: String,
    #[serde(default, deserialize_with = "bool_from_any")]
    pub activo: bool,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub fecha_creacion: String,
    #[serde(default)]
    pub fecha_actualizacion: Option<String>,
}

/// Body for `POST /categorias` and `PUT /categorias/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CategoryForm {
    #[validate(length(min = 1, max = 100, message = "El nombre es obligatorio"))]
    pub nombre: String,
    #[validate(length(max = 500))]
    pub descripcion: String,
    pub activo: bool,
}

impl From<&Category> for CategoryForm {
    fn from(category: &Category) -> Self {
        Self {
            nombre: category.nombre.clone(),
            descripcion: category.descripcion.clone(),
            activo: category.activo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_accepts_numeric_flag() {
        let category: Category = serde_json::from_value(json!({
            "id": 4,
            "nombre": "Lácteos",
            "descripcion": null,
            "activo": 1,
            "fecha_creacion": "2024-01-01T00:00:00.000Z"
        }))
        .unwrap();

        assert!(category.activo);
        assert_eq!(category.descripcion, "");
        assert!(category.fecha_actualizacion.is_none());
    }

    #[test]
    fn test_form_requires_name() {
        let form = CategoryForm {
            nombre: String::new(),
            descripcion: "x".into(),
            activo: true,
        };
        assert!(form.validate().is_err());
    }
}
