//! Valores de parámetros/propiedades de ejecución.
//!
//! Unión etiquetada explícita: exactamente una variante poblada por
//! propiedad. Los overrides de un driver reemplazan el valor completo, nunca
//! campos sueltos de un registro multi-campo.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Valor escalar o lista de un parámetro declarado en el `NodeSpec`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Str(String),
    Int(i64),
    Float(f64),
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    /// Representación JSON plana, usada para canonicalizar parámetros dentro
    /// del fingerprint de cache.
    pub fn as_json(&self) -> Value {
        match self {
            PropertyValue::Str(s) => Value::String(s.clone()),
            PropertyValue::Int(i) => Value::from(*i),
            PropertyValue::Float(f) => Value::from(*f),
            PropertyValue::List(items) => Value::Array(items.iter().map(|v| v.as_json()).collect()),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Str(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Str(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Int(i)
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Float(f)
    }
}
