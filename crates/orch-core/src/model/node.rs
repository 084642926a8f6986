//! Especificación inmutable de un nodo del pipeline.
//!
//! Un `NodeSpec` describe un paso: identidad, inputs declarados (referencias
//! a outputs de nodos upstream), outputs declarados (tipo de artifact),
//! parámetros, referencia de executable (discriminador + payload opaco para
//! elegir el `ExecutorOperator`), driver opcional y política de cache. El
//! núcleo no interpreta el payload del executable; sólo lo enruta por el
//! discriminador.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::PropertyValue;

/// Referencia opaca a lógica ejecutable: `kind` discrimina la factory en el
/// registry, `payload` viaja intacto hasta el operator concreto.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutableSpec {
    pub kind: String,
    pub payload: Value,
}

impl ExecutableSpec {
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self { kind: kind.into(), payload }
    }
}

/// Input declarado: referencia al output `output_key` del nodo
/// `producer_node`. `min_count` define cuántos artifacts vivos se requieren;
/// con menos, la resolución reporta "not ready" (skip, no error).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSpec {
    pub producer_node: String,
    pub output_key: String,
    pub min_count: usize,
}

/// Output declarado: sólo el tipo de artifact. Las URIs concretas las asigna
/// el Output Resolver por ejecución.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub artifact_type: String,
}

/// Contexto de metadatos al que pertenece el nodo (p.ej. "pipeline_run").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSpec {
    pub type_name: String,
    pub name: String,
}

/// Descripción completa e inmutable de un paso del pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Identificador estable y único dentro del pipeline.
    pub id: String,
    /// Marcador de tipo del nodo. Los nodos de sistema se reconocen por este
    /// nombre en el `SystemHandlerRegistry`.
    pub type_name: String,
    pub contexts: Vec<ContextSpec>,
    pub inputs: BTreeMap<String, InputSpec>,
    pub outputs: BTreeMap<String, OutputSpec>,
    pub parameters: BTreeMap<String, PropertyValue>,
    pub executable: Option<ExecutableSpec>,
    pub driver: Option<ExecutableSpec>,
    /// Política de caching del nodo. Con `false` el fingerprint se deriva y
    /// registra igualmente (linaje), pero nunca se reutilizan outputs.
    pub enable_cache: bool,
}

impl NodeSpec {
    /// Spec mínimo; el resto de campos se puebla directamente.
    pub fn new(id: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self { id: id.into(),
               type_name: type_name.into(),
               contexts: Vec::new(),
               inputs: BTreeMap::new(),
               outputs: BTreeMap::new(),
               parameters: BTreeMap::new(),
               executable: None,
               driver: None,
               enable_cache: false }
    }
}
