//! Handler de sistema `importer`: registra un artifact externo preexistente.
//!
//! El nodo declara por parámetros el tipo y la URI del dato externo. El
//! handler publica un artifact `Live` apuntando a esa URI bajo la clave
//! `result`, sin ejecutar nada. Con `reimport = 0` (default) una URI ya
//! importada por el mismo nodo se reutiliza en lugar de duplicarse.

use std::collections::BTreeMap;

use log::info;
use serde_json::json;

use orch_core::{Artifact, Execution, ExecutorResult, LaunchError, MetadataHandle, MetadataStore,
                NodeSpec, PipelineInfo, PropertyValue, RuntimeSpec, SystemNodeHandler};

use super::str_param;

pub const IMPORT_OUTPUT_KEY: &str = "result";

/// Sin estado propio: la conexión de metadatos llega en cada `run`.
#[derive(Default)]
pub struct ImporterHandler;

impl ImporterHandler {
    pub fn new() -> Self {
        Self
    }
}

impl<M: MetadataStore> SystemNodeHandler<M> for ImporterHandler {
    fn run(&self,
           metadata: &MetadataHandle<M>,
           node: &NodeSpec,
           _pipeline: &PipelineInfo,
           _runtime: &RuntimeSpec)
           -> Result<Option<Execution>, LaunchError> {
        let artifact_type = str_param(node, "artifact_type")?;
        let uri = str_param(node, "uri")?;
        let reimport = matches!(node.parameters.get("reimport"), Some(PropertyValue::Int(i)) if *i != 0);

        metadata.with(|m| {
            let contexts = m.prepare_contexts(&node.contexts)?;
            let execution =
                m.register_execution(&node.type_name, &contexts, &BTreeMap::new(), &node.parameters)?;

            let existing = if reimport {
                None
            } else {
                m.live_artifacts(&node.id, IMPORT_OUTPUT_KEY)?
                 .into_iter()
                 .rev()
                 .find(|a| a.uri == uri)
            };

            match existing {
                Some(found) => {
                    info!("importer '{}' reusing artifact {:?} for {}", node.id, found.id, uri);
                    let outputs = BTreeMap::from([(IMPORT_OUTPUT_KEY.to_string(), vec![found])]);
                    m.publish_cached_execution(execution.id, &contexts, &outputs)?;
                }
                None => {
                    info!("importer '{}' importing {} as {}", node.id, uri, artifact_type);
                    let artifact = Artifact::pending(&artifact_type,
                                                     &uri,
                                                     json!({
                                                         "producer_node": node.id,
                                                         "output_key": IMPORT_OUTPUT_KEY,
                                                     }));
                    let outputs = BTreeMap::from([(IMPORT_OUTPUT_KEY.to_string(), vec![artifact])]);
                    m.publish_succeeded_execution(execution.id, &contexts, &outputs, &ExecutorResult::ok())?;
                }
            }
            m.execution(execution.id)
        })
    }
}
