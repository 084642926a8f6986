//! Handlers de nodos de sistema.

pub mod importer;
pub mod resolver;

use orch_core::{LaunchError, NodeSpec, PropertyValue};

/// Lee un parámetro string obligatorio del spec del nodo.
fn str_param(node: &NodeSpec, name: &str) -> Result<String, LaunchError> {
    match node.parameters.get(name) {
        Some(PropertyValue::Str(s)) => Ok(s.clone()),
        _ => Err(LaunchError::Internal(format!("node '{}' requires string parameter '{}'", node.id, name))),
    }
}
