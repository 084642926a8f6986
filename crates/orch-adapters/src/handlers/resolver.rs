//! Handler de sistema `latest_artifact_resolver`.
//!
//! Resolución pura de metadatos: selecciona los N artifacts `Live` más
//! recientes de un nodo productor y los registra como outputs de una
//! ejecución propia (estado `Cached`: no se produjo dato nuevo, sólo
//! linaje). Sin candidatos, el nodo no registra ejecución alguna.

use std::collections::BTreeMap;

use log::{debug, info};

use orch_core::{Execution, LaunchError, MetadataHandle, MetadataStore, NodeSpec, PipelineInfo,
                PropertyValue, RuntimeSpec, SystemNodeHandler};

use super::str_param;

pub const RESOLVED_OUTPUT_KEY: &str = "resolved";

/// Sin estado propio: la conexión de metadatos llega en cada `run`.
#[derive(Default)]
pub struct LatestArtifactResolver;

impl LatestArtifactResolver {
    pub fn new() -> Self {
        Self
    }
}

impl<M: MetadataStore> SystemNodeHandler<M> for LatestArtifactResolver {
    fn run(&self,
           metadata: &MetadataHandle<M>,
           node: &NodeSpec,
           _pipeline: &PipelineInfo,
           _runtime: &RuntimeSpec)
           -> Result<Option<Execution>, LaunchError> {
        let source_node = str_param(node, "source_node")?;
        let output_key = str_param(node, "output_key")?;
        let limit = match node.parameters.get("limit") {
            Some(PropertyValue::Int(n)) if *n > 0 => *n as usize,
            _ => 1,
        };

        metadata.with(|m| {
            let mut candidates = m.live_artifacts(&source_node, &output_key)?;
            if candidates.is_empty() {
                debug!("resolver '{}' found nothing under {}/{}", node.id, source_node, output_key);
                return Ok(None);
            }
            let keep_from = candidates.len().saturating_sub(limit);
            let selected = candidates.split_off(keep_from);
            info!("resolver '{}' selected {} artifact(s) from {}/{}",
                  node.id,
                  selected.len(),
                  source_node,
                  output_key);

            let contexts = m.prepare_contexts(&node.contexts)?;
            let execution =
                m.register_execution(&node.type_name, &contexts, &BTreeMap::new(), &node.parameters)?;
            let outputs = BTreeMap::from([(RESOLVED_OUTPUT_KEY.to_string(), selected)]);
            m.publish_cached_execution(execution.id, &contexts, &outputs)?;
            m.execution(execution.id)
        })
    }
}
