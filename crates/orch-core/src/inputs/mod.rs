//! Resolución de parámetros e inputs declarados.
//!
//! Contrato clave: un input requerido sin suficientes artifacts upstream NO
//! es un error; la resolución devuelve `None` ("not ready") y el lanzamiento
//! transiciona a skip sin registrar ejecución ni efectos colaterales.

use log::debug;
use std::collections::BTreeMap;

use crate::errors::LaunchError;
use crate::metadata::MetadataStore;
use crate::model::{Artifact, NodeSpec, PropertyValue};

/// Resuelve los parámetros declarados a valores concretos. Puro: los
/// parámetros del spec ya son valores finales.
pub fn resolve_parameters(node: &NodeSpec) -> BTreeMap<String, PropertyValue> {
    node.parameters.clone()
}

/// Resuelve cada input declarado a artifacts `Live` de su nodo productor.
///
/// Devuelve `None` si algún input no alcanza su `min_count` (not ready).
/// El orden dentro de cada clave es el orden estable del store: los inputs
/// son posicionales dentro de una clave.
pub fn resolve_input_artifacts<M: MetadataStore>(store: &M,
                                                 node: &NodeSpec)
                                                 -> Result<Option<BTreeMap<String, Vec<Artifact>>>, LaunchError> {
    let mut resolved = BTreeMap::new();
    for (key, spec) in &node.inputs {
        let artifacts = store.live_artifacts(&spec.producer_node, &spec.output_key)?;
        if artifacts.len() < spec.min_count {
            debug!("input '{}' of node '{}' not ready ({} of {} artifacts)",
                   key,
                   node.id,
                   artifacts.len(),
                   spec.min_count);
            return Ok(None);
        }
        resolved.insert(key.clone(), artifacts);
    }
    Ok(Some(resolved))
}
