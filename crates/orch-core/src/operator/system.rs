//! Handlers de nodos de sistema.
//!
//! Camino alterno de ejecución para nodos cuya semántica conoce por completo
//! el orquestador (p.ej. importación o resolución pura de metadatos). Un
//! nodo de sistema nunca pasa por driver, cache ni executor: el handler es
//! dueño del protocolo completo, incluido decidir si registra ejecución.
//! La conexión de metadatos llega por parámetro en cada `run`, de modo que
//! un mismo handler sirve a cualquier store.

use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::LaunchError;
use crate::metadata::{MetadataHandle, MetadataStore};
use crate::model::{Execution, NodeSpec, PipelineInfo, RuntimeSpec};

pub trait SystemNodeHandler<M: MetadataStore>: Send + Sync {
    /// Ejecuta el nodo de sistema contra la conexión recibida. `None` si el
    /// handler eligió no registrar ejecución alguna.
    fn run(&self,
           metadata: &MetadataHandle<M>,
           node: &NodeSpec,
           pipeline: &PipelineInfo,
           runtime: &RuntimeSpec)
           -> Result<Option<Execution>, LaunchError>;
}

/// Registry nombre-de-tipo-de-nodo → handler compartido.
pub struct SystemHandlerRegistry<M: MetadataStore> {
    handlers: HashMap<String, Arc<dyn SystemNodeHandler<M>>>,
}

impl<M: MetadataStore> Default for SystemHandlerRegistry<M> {
    fn default() -> Self {
        Self { handlers: HashMap::new() }
    }
}

impl<M: MetadataStore> SystemHandlerRegistry<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self,
                    type_name: impl Into<String>,
                    handler: Arc<dyn SystemNodeHandler<M>>) {
        self.handlers.insert(type_name.into(), handler);
    }

    pub fn lookup(&self, type_name: &str) -> Option<Arc<dyn SystemNodeHandler<M>>> {
        self.handlers.get(type_name).cloned()
    }
}
