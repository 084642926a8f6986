//! Driver `property_override`: inyección declarativa de propiedades.
//!
//! Payload: `{"properties": {"clave": valor, ..}}`. Cada valor reemplaza por
//! completo la propiedad homónima antes de la decisión de cache, de modo que
//! dos lanzamientos con overrides distintos nunca comparten bucket.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use orch_core::{DriverOperator, DriverOutput, DriverRegistry, ExecutionInfo, LaunchError,
                PropertyValue};

#[derive(Debug, Clone, Deserialize)]
struct OverridePayload {
    properties: BTreeMap<String, Value>,
}

struct PropertyOverrideDriver {
    overrides: BTreeMap<String, PropertyValue>,
}

impl DriverOperator for PropertyOverrideDriver {
    fn run_driver(&self, _info: &ExecutionInfo) -> Result<DriverOutput, LaunchError> {
        Ok(DriverOutput { output_artifacts: BTreeMap::new(),
                          exec_properties: self.overrides.clone() })
    }
}

fn value_to_property(key: &str, value: &Value) -> Result<PropertyValue, LaunchError> {
    match value {
        Value::String(s) => Ok(PropertyValue::Str(s.clone())),
        Value::Number(n) if n.is_i64() => Ok(PropertyValue::Int(n.as_i64().unwrap_or_default())),
        Value::Number(n) => Ok(PropertyValue::Float(n.as_f64().unwrap_or_default())),
        Value::Array(items) => {
            let converted = items.iter()
                                 .map(|v| value_to_property(key, v))
                                 .collect::<Result<Vec<_>, _>>()?;
            Ok(PropertyValue::List(converted))
        }
        other => Err(LaunchError::Driver(format!("property '{key}' has unsupported value: {other}"))),
    }
}

/// Registra la factory del discriminador `property_override`.
pub fn register_property_override_driver(registry: &mut DriverRegistry) {
    registry.register("property_override", |spec| {
                let payload: OverridePayload =
                    serde_json::from_value(spec.payload.clone())
                        .map_err(|e| LaunchError::UnknownDriver(format!("property_override payload: {e}")))?;
                let overrides = payload.properties
                                       .iter()
                                       .map(|(k, v)| value_to_property(k, v).map(|p| (k.clone(), p)))
                                       .collect::<Result<BTreeMap<_, _>, _>>()?;
                Ok(Box::new(PropertyOverrideDriver { overrides }) as Box<dyn DriverOperator>)
            });
}
