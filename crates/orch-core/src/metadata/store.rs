//! Contrato del store de metadatos (ejecuciones, artifacts, contextos).
//!
//! El store es transaccional por llamada: cada operación de publish debe ser
//! atómica respecto de lectores posteriores (ningún downstream puede observar
//! una ejecución a medio publicar). El launcher sólo acota el scope de
//! conexión; la consistencia interna es responsabilidad del store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::LaunchError;
use crate::model::{Artifact, ContextSpec, Execution, ExecutorResult, PropertyValue};

/// Referencia a un contexto materializado en el store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextRef {
    pub id: i64,
    pub type_name: String,
    pub name: String,
}

pub trait MetadataStore {
    /// Materializa (o recupera) los contextos del nodo. Idempotente: seguro
    /// de repetir entre reintentos del mismo lanzamiento.
    fn prepare_contexts(&mut self, specs: &[ContextSpec]) -> Result<Vec<ContextRef>, LaunchError>;

    /// Crea el registro de ejecución enlazando contextos, inputs y
    /// parámetros. Exactamente una vez por intento, siempre antes de
    /// cualquier consulta de cache.
    fn register_execution(&mut self,
                          type_name: &str,
                          contexts: &[ContextRef],
                          inputs: &BTreeMap<String, Vec<Artifact>>,
                          properties: &BTreeMap<String, PropertyValue>)
                          -> Result<Execution, LaunchError>;

    /// Contexto de cache asociado a un fingerprint (get-or-create).
    fn cache_context(&mut self, fingerprint: &str) -> Result<ContextRef, LaunchError>;

    /// Outputs sellados registrados contra ese contexto de cache, si los hay.
    fn cached_outputs(&self, cache_context: &ContextRef) -> Result<Option<BTreeMap<String, Vec<Artifact>>>, LaunchError>;

    /// Marca la ejecución como satisfecha por cache, asociándole los outputs
    /// reutilizados. No sella nada: los artifacts ya son `Live`.
    fn publish_cached_execution(&mut self,
                                execution_id: i64,
                                contexts: &[ContextRef],
                                outputs: &BTreeMap<String, Vec<Artifact>>)
                                -> Result<(), LaunchError>;

    /// Publica éxito: sella los outputs (`Live` + fingerprint), registra el
    /// resultado estructurado y transiciona la ejecución a `Succeeded`.
    /// Devuelve los artifacts ya sellados.
    fn publish_succeeded_execution(&mut self,
                                   execution_id: i64,
                                   contexts: &[ContextRef],
                                   outputs: &BTreeMap<String, Vec<Artifact>>,
                                   result: &ExecutorResult)
                                   -> Result<BTreeMap<String, Vec<Artifact>>, LaunchError>;

    /// Publica fallo, registrando el resultado estructurado disponible.
    fn publish_failed_execution(&mut self,
                                execution_id: i64,
                                contexts: &[ContextRef],
                                result: Option<&ExecutorResult>)
                                -> Result<(), LaunchError>;

    /// Artifacts `Live` producidos por `producer_node` bajo `output_key`
    /// (resolución de inputs).
    fn live_artifacts(&self, producer_node: &str, output_key: &str) -> Result<Vec<Artifact>, LaunchError>;

    /// Lectura puntual de una ejecución registrada.
    fn execution(&self, id: i64) -> Result<Option<Execution>, LaunchError>;
}
