use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use super::lenient::{bool_from_any, f64_from_any, string_or_empty};

/// Unit of measure as served by `GET /unidad-medida`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitMeasure {
    pub id: i64,
    pub nombre: String,
    pub abreviatura: String,
    #[serde(default)]
    pub descripcion: String,
    #[serde(deserialize_with = "bool_from_any")]
    pub activo: bool,
}

impl UnitMeasure {
    /// Validate one raw catalog entry.
    ///
    /// `id` must be numeric, the three text fields must be strings and
    /// `activo` must be a number or a boolean. Anything else is rejected.
    pub fn from_raw(value: &serde_json::Value) -> Option<Self> {
        let obj = value.as_object()?;
        let id = obj.get("id")?.as_f64()?;
        let nombre = obj.get("nombre")?.as_str()?;
        let abreviatura = obj.get("abreviatura")?.as_str()?;
        let descripcion = obj.get("descripcion")?.as_str()?;
        let activo = match obj.get("activo")? {
            serde_json::Value::Bool(b) => *b,
            serde_json::Value::Number(n) => n.as_f64()? == 1.0,
            _ => return None,
        };

        Some(Self {
            id: id as i64,
            nombre: nombre.to_string(),
            abreviatura: abreviatura.to_string(),
            descripcion: descripcion.to_string(),
            activo,
        })
    }

    /// Case-insensitive match against abbreviation or name.
    pub fn matches_label(&self, label: &str) -> bool {
        let label = label.trim().to_lowercase();
        !label.is_empty()
            && (self.abreviatura.to_lowercase() == label || self.nombre.to_lowercase() == label)
    }
}

/// Find the unit id for a free-text label, 0 when nothing matches.
pub fn resolve_unit_id(units: &[UnitMeasure], label: &str) -> i64 {
    units
        .iter()
        .find(|u| u.matches_label(label))
        .map(|u| u.id)
        .unwrap_or(0)
}

/// Unit embedded in a product row.
///
/// Listings send a plain label; update responses send the full object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitRef {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub abreviatura: String,
}

impl UnitRef {
    pub fn label(&self) -> &str {
        if self.abreviatura.is_empty() {
            &self.nombre
        } else {
            &self.abreviatura
        }
    }
}

fn unit_ref_from_any<'de, D>(deserializer: D) -> Result<Option<UnitRef>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Label(String),
        Object(UnitRef),
    }

    Ok(match Option::<Repr>::deserialize(deserializer)? {
        None => None,
        Some(Repr::Label(label)) => Some(UnitRef {
            id: 0,
            nombre: label.clone(),
            abreviatura: label,
        }),
        Some(Repr::Object(unit)) => Some(unit),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub id: i64,
    pub nombre: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub descripcion: String,
    #[serde(default)]
    pub categoria_id: i64,
    #[serde(default, deserialize_with = "unit_ref_from_any")]
    pub unidad_medida: Option<UnitRef>,
    #[serde(default)]
    pub unidad_medida_id: Option<i64>,
    #[serde(default, deserialize_with = "f64_from_any")]
    pub stock_actual: f64,
    #[serde(default, deserialize_with = "f64_from_any")]
    pub stock_minimo: f64,
    #[serde(default, deserialize_with = "f64_from_any")]
    pub precio_referencia: f64,
    #[serde(default, deserialize_with = "bool_from_any")]
    pub activo: bool,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub fecha_creacion: String,
    #[serde(default)]
    pub fecha_actualizacion: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    Critical,
    Low,
    Normal,
}

impl Product {
    pub fn unit_label(&self) -> &str {
        self.unidad_medida.as_ref().map(UnitRef::label).unwrap_or("")
    }

    /// Unit id, from the explicit column or the embedded object.
    pub fn unit_id(&self) -> Option<i64> {
        self.unidad_medida_id
            .filter(|id| *id > 0)
            .or_else(|| self.unidad_medida.as_ref().map(|u| u.id).filter(|id| *id > 0))
    }

    /// Critical at or below half the minimum, low at or below the minimum.
    pub fn stock_level(&self) -> StockLevel {
        if self.stock_actual <= self.stock_minimo * 0.5 {
            StockLevel::Critical
        } else if self.stock_actual <= self.stock_minimo {
            StockLevel::Low
        } else {
            StockLevel::Normal
        }
    }

    pub fn stock_value(&self) -> f64 {
        self.stock_actual * self.precio_referencia
    }
}

/// Body for `POST /productos` and `PUT /productos/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ProductForm {
    #[validate(length(min = 1, max = 150, message = "El nombre es obligatorio"))]
    pub nombre: String,
    #[validate(length(max = 500))]
    pub descripcion: String,
    #[validate(range(min = 1, message = "Seleccione una categoría"))]
    pub categoria_id: i64,
    #[validate(range(min = 1, message = "Seleccione una unidad de medida"))]
    pub unidad_medida_id: i64,
    #[validate(range(min = 0.0))]
    pub stock_actual: f64,
    #[validate(range(min = 0.0))]
    pub stock_minimo: f64,
    #[validate(range(min = 0.0))]
    pub precio_referencia: f64,
    pub activo: bool,
}

/// Query parameters for `GET /productos`.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub page: u32,
    pub limit: u32,
    pub active: Option<bool>,
    pub search: Option<String>,
    pub unidad_medida: Option<String>,
    pub categoria_id: Option<i64>,
}

impl ProductQuery {
    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            ..Default::default()
        }
    }

    pub fn with_search(mut self, search: &str) -> Self {
        self.search = Some(search.to_string());
        self
    }

    /// Query pairs in wire order; blank text filters are omitted and text is trimmed.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string()), ("limit", self.limit.to_string())];
        if let Some(active) = self.active {
            pairs.push(("active", active.to_string()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        if let Some(unit) = self
            .unidad_medida
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            pairs.push(("unidad_medida", unit.to_string()));
        }
        if let Some(categoria_id) = self.categoria_id {
            pairs.push(("categoria_id", categoria_id.to_string()));
        }
        pairs
    }
}
