//! Implementación in-memory de referencia del `MetadataStore`.
//!
//! Misma semántica observable que un backend real: ids autoasignados,
//! contextos get-or-create, atribuciones contexto→ejecución y sellado de
//! outputs al publicar. Pensada para tests y demos; un backend persistente
//! implementaría el mismo trait contra su motor transaccional.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use serde_json::json;

use crate::errors::LaunchError;
use crate::hashing::hash_value;
use crate::model::{Artifact, ArtifactState, ContextSpec, Execution, ExecutionState, ExecutorResult, PropertyValue};

use super::store::{ContextRef, MetadataStore};

#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    contexts: Vec<ContextRef>,
    executions: HashMap<i64, Execution>,
    artifacts: HashMap<i64, Artifact>,
    /// contexto id -> ejecuciones atribuidas (linaje).
    attributions: HashMap<i64, Vec<i64>>,
    /// ejecución id -> inputs enlazados (identidades por clave declarada).
    execution_inputs: HashMap<i64, BTreeMap<String, Vec<String>>>,
    /// ejecución id -> outputs publicados (ids de artifact por clave).
    execution_outputs: HashMap<i64, BTreeMap<String, Vec<i64>>>,
    next_execution_id: i64,
    next_artifact_id: i64,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cantidad de ejecuciones registradas (útil en tests de no-escritura).
    pub fn execution_count(&self) -> usize {
        self.executions.len()
    }

    /// Cantidad de artifacts registrados.
    pub fn artifact_count(&self) -> usize {
        self.artifacts.len()
    }

    /// Inputs enlazados a una ejecución, tal como se registraron.
    pub fn inputs_of(&self, execution_id: i64) -> Option<&BTreeMap<String, Vec<String>>> {
        self.execution_inputs.get(&execution_id)
    }

    fn get_or_create_context(&mut self, type_name: &str, name: &str) -> ContextRef {
        if let Some(existing) = self.contexts
                                    .iter()
                                    .find(|c| c.type_name == type_name && c.name == name)
        {
            return existing.clone();
        }
        let ctx = ContextRef { id: self.contexts.len() as i64 + 1,
                               type_name: type_name.to_string(),
                               name: name.to_string() };
        self.contexts.push(ctx.clone());
        ctx
    }

    fn attribute(&mut self, contexts: &[ContextRef], execution_id: i64) {
        for ctx in contexts {
            let execs = self.attributions.entry(ctx.id).or_default();
            if !execs.contains(&execution_id) {
                execs.push(execution_id);
            }
        }
    }

    fn running_execution_mut(&mut self, execution_id: i64) -> Result<&mut Execution, LaunchError> {
        let exec = self.executions
                       .get_mut(&execution_id)
                       .ok_or_else(|| LaunchError::Metadata(format!("unknown execution id {execution_id}")))?;
        if exec.state != ExecutionState::Running {
            return Err(LaunchError::Metadata(format!("execution {execution_id} is already terminal")));
        }
        Ok(exec)
    }

    /// Fingerprint de sellado: propiedad final y estable del artifact.
    fn seal_fingerprint(artifact: &Artifact) -> String {
        hash_value(&json!({ "type": artifact.type_name, "uri": artifact.uri }))
    }

    fn record_result(exec: &mut Execution, result: &ExecutorResult) {
        exec.properties.insert("result_code".to_string(), PropertyValue::Int(result.code as i64));
        if let Some(msg) = &result.message {
            exec.properties.insert("result_message".to_string(), PropertyValue::Str(msg.clone()));
        }
        for (k, v) in &result.annotations {
            exec.properties.insert(k.clone(), PropertyValue::Str(v.clone()));
        }
    }
}

impl MetadataStore for InMemoryMetadataStore {
    fn prepare_contexts(&mut self, specs: &[ContextSpec]) -> Result<Vec<ContextRef>, LaunchError> {
        Ok(specs.iter()
                .map(|s| self.get_or_create_context(&s.type_name, &s.name))
                .collect())
    }

    fn register_execution(&mut self,
                          type_name: &str,
                          contexts: &[ContextRef],
                          inputs: &BTreeMap<String, Vec<Artifact>>,
                          properties: &BTreeMap<String, PropertyValue>)
                          -> Result<Execution, LaunchError> {
        self.next_execution_id += 1;
        let execution = Execution { id: self.next_execution_id,
                                    type_name: type_name.to_string(),
                                    state: ExecutionState::Running,
                                    properties: properties.clone(),
                                    created_at: Utc::now() };
        let linked: BTreeMap<String, Vec<String>> =
            inputs.iter()
                  .map(|(k, arts)| (k.clone(), arts.iter().map(|a| a.identity()).collect()))
                  .collect();
        self.execution_inputs.insert(execution.id, linked);
        self.executions.insert(execution.id, execution.clone());
        self.attribute(contexts, execution.id);
        Ok(execution)
    }

    fn cache_context(&mut self, fingerprint: &str) -> Result<ContextRef, LaunchError> {
        Ok(self.get_or_create_context("cache", fingerprint))
    }

    fn cached_outputs(&self, cache_context: &ContextRef) -> Result<Option<BTreeMap<String, Vec<Artifact>>>, LaunchError> {
        let Some(exec_ids) = self.attributions.get(&cache_context.id) else {
            return Ok(None);
        };
        // Última ejecución terminal con outputs bajo ese contexto de cache.
        let candidate = exec_ids.iter()
                                .copied()
                                .filter(|id| {
                                    self.executions
                                        .get(id)
                                        .map(|e| matches!(e.state, ExecutionState::Succeeded | ExecutionState::Cached))
                                        .unwrap_or(false)
                                })
                                .filter(|id| self.execution_outputs.contains_key(id))
                                .max();
        let Some(exec_id) = candidate else { return Ok(None) };
        let outputs = &self.execution_outputs[&exec_id];
        let resolved: BTreeMap<String, Vec<Artifact>> =
            outputs.iter()
                   .map(|(key, ids)| {
                       let arts = ids.iter().filter_map(|id| self.artifacts.get(id).cloned()).collect();
                       (key.clone(), arts)
                   })
                   .collect();
        Ok(Some(resolved))
    }

    fn publish_cached_execution(&mut self,
                                execution_id: i64,
                                contexts: &[ContextRef],
                                outputs: &BTreeMap<String, Vec<Artifact>>)
                                -> Result<(), LaunchError> {
        let mut linked: BTreeMap<String, Vec<i64>> = BTreeMap::new();
        for (key, artifacts) in outputs {
            let mut ids = Vec::with_capacity(artifacts.len());
            for a in artifacts {
                let id = a.id
                          .ok_or_else(|| LaunchError::Metadata(format!("cached output '{key}' has no artifact id")))?;
                ids.push(id);
            }
            linked.insert(key.clone(), ids);
        }
        let exec = self.running_execution_mut(execution_id)?;
        exec.state = ExecutionState::Cached;
        self.execution_outputs.insert(execution_id, linked);
        self.attribute(contexts, execution_id);
        Ok(())
    }

    fn publish_succeeded_execution(&mut self,
                                   execution_id: i64,
                                   contexts: &[ContextRef],
                                   outputs: &BTreeMap<String, Vec<Artifact>>,
                                   result: &ExecutorResult)
                                   -> Result<BTreeMap<String, Vec<Artifact>>, LaunchError> {
        // Validar el estado antes de sellar nada: la publicación debe ser
        // atómica respecto de lectores posteriores.
        self.running_execution_mut(execution_id)?;

        let mut sealed: BTreeMap<String, Vec<Artifact>> = BTreeMap::new();
        let mut linked: BTreeMap<String, Vec<i64>> = BTreeMap::new();
        for (key, artifacts) in outputs {
            let mut sealed_list = Vec::with_capacity(artifacts.len());
            let mut ids = Vec::with_capacity(artifacts.len());
            for artifact in artifacts {
                let mut a = artifact.clone();
                let id = a.id.unwrap_or_else(|| {
                                 self.next_artifact_id += 1;
                                 self.next_artifact_id
                             });
                a.id = Some(id);
                a.state = ArtifactState::Live;
                a.fingerprint = Some(Self::seal_fingerprint(&a));
                self.artifacts.insert(id, a.clone());
                ids.push(id);
                sealed_list.push(a);
            }
            sealed.insert(key.clone(), sealed_list);
            linked.insert(key.clone(), ids);
        }

        let exec = self.running_execution_mut(execution_id)?;
        exec.state = ExecutionState::Succeeded;
        Self::record_result(exec, result);
        self.execution_outputs.insert(execution_id, linked);
        self.attribute(contexts, execution_id);
        Ok(sealed)
    }

    fn publish_failed_execution(&mut self,
                                execution_id: i64,
                                contexts: &[ContextRef],
                                result: Option<&ExecutorResult>)
                                -> Result<(), LaunchError> {
        let exec = self.running_execution_mut(execution_id)?;
        exec.state = ExecutionState::Failed;
        if let Some(r) = result {
            Self::record_result(exec, r);
        }
        self.attribute(contexts, execution_id);
        Ok(())
    }

    fn live_artifacts(&self, producer_node: &str, output_key: &str) -> Result<Vec<Artifact>, LaunchError> {
        let mut found: Vec<Artifact> =
            self.artifacts
                .values()
                .filter(|a| a.state == ArtifactState::Live)
                .filter(|a| {
                    a.properties.get("producer_node").and_then(|v| v.as_str()) == Some(producer_node)
                    && a.properties.get("output_key").and_then(|v| v.as_str()) == Some(output_key)
                })
                .cloned()
                .collect();
        // Orden estable por id: los inputs son posicionales dentro de una clave.
        found.sort_by_key(|a| a.id);
        Ok(found)
    }

    fn execution(&self, id: i64) -> Result<Option<Execution>, LaunchError> {
        Ok(self.executions.get(&id).cloned())
    }
}
