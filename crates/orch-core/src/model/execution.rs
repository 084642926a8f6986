//! Registro de ejecución y resultados estructurados de operators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Artifact, PropertyValue};

/// Estado terminal (o transitorio `Running`) de una ejecución registrada.
///
/// Transiciones válidas:
/// - `Running` -> `Succeeded`
/// - `Running` -> `Failed`
/// - `Running` -> `Cached`
///
/// No se permiten reversiones: una ejecución terminal es un hecho histórico.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionState {
    Running,
    Succeeded,
    Failed,
    /// Satisfecha por cache: nunca se invocó el executor, pero el registro
    /// existe igualmente para auditoría y linaje.
    Cached,
}

/// Fila creada exactamente una vez por intento de lanzamiento.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub id: i64,
    pub type_name: String,
    pub state: ExecutionState,
    pub properties: BTreeMap<String, PropertyValue>,
    pub created_at: DateTime<Utc>,
}

/// Resultado estructurado del `ExecutorOperator`: código de estado (0 = ok)
/// y mensaje opcional legible. `annotations` transporta etiquetas añadidas
/// por el launcher al publicar (p.ej. versión).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorResult {
    pub code: i32,
    pub message: Option<String>,
    pub annotations: BTreeMap<String, String>,
}

impl ExecutorResult {
    pub fn ok() -> Self {
        Self { code: 0, message: None, annotations: BTreeMap::new() }
    }

    pub fn failed(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: Some(message.into()), annotations: BTreeMap::new() }
    }
}

/// Salida estructurada de un driver: outputs reemplazados por clave y
/// overrides de propiedades de ejecución. El launcher la mergea **antes** de
/// derivar el fingerprint de cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverOutput {
    pub output_artifacts: BTreeMap<String, Vec<Artifact>>,
    pub exec_properties: BTreeMap<String, PropertyValue>,
}
