//! Bundle transitorio por intento de ejecución.

use std::collections::BTreeMap;
use std::path::PathBuf;

use super::{Artifact, PropertyValue};

/// Valor inmutable construido fresco por intento y pasado por referencia a
/// driver y executor. Nunca se persiste: se descarta tras la limpieza.
///
/// Para la fase de driver, `stateful_working_dir` y `tmp_dir` van vacíos (el
/// driver corre antes de decidir si la ejecución es necesaria).
#[derive(Debug, Clone)]
pub struct ExecutionInfo {
    pub execution_id: i64,
    pub inputs: BTreeMap<String, Vec<Artifact>>,
    pub outputs: BTreeMap<String, Vec<Artifact>>,
    pub exec_properties: BTreeMap<String, PropertyValue>,
    /// URI dedicada donde el operator puede escribir su resultado
    /// estructurado.
    pub execution_output_uri: String,
    /// Directorio estable entre reintentos del mismo execution id (resume de
    /// progreso tras un fallo).
    pub stateful_working_dir: PathBuf,
    /// Directorio temporal por intento; borrable siempre al terminar.
    pub tmp_dir: PathBuf,
    pub pipeline_run_id: String,
}
