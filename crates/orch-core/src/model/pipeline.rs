//! Identidad de pipeline y de run.
//!
//! Inmutables durante un lanzamiento: namespacing de ubicaciones de output y
//! scoping de contextos de metadatos.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineInfo {
    pub name: String,
    pub id: String,
}

impl PipelineInfo {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self { name: name.into(), id: id.into() }
    }
}

/// Información runtime de un run concreto del pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeSpec {
    pub run_id: String,
    /// Raíz bajo la que el Output Resolver deriva todas las rutas.
    pub base_dir: PathBuf,
}

impl RuntimeSpec {
    pub fn new(run_id: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
        Self { run_id: run_id.into(), base_dir: base_dir.into() }
    }

    /// Run nuevo con id generado.
    pub fn new_run(base_dir: impl Into<PathBuf>) -> Self {
        Self::new(Uuid::new_v4().to_string(), base_dir)
    }
}
