//! Executor `function`: lógica in-process resuelta desde un catálogo.
//!
//! El payload del executable es `{"function": "<nombre>"}`; el catálogo
//! mapea nombres a closures. Un nombre ausente es error de configuración en
//! construcción del Launcher, nunca en `launch`.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use orch_core::{ExecutionInfo, ExecutorOperator, ExecutorRegistry, ExecutorResult, LaunchError};

pub type NodeFn = Arc<dyn Fn(&ExecutionInfo) -> Result<ExecutorResult, LaunchError> + Send + Sync>;

/// Catálogo nombre → función. Clonable para capturarlo en la factory.
#[derive(Clone, Default)]
pub struct FunctionCatalog {
    functions: HashMap<String, NodeFn>,
}

impl FunctionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<F>(&mut self, name: impl Into<String>, f: F)
        where F: Fn(&ExecutionInfo) -> Result<ExecutorResult, LaunchError> + Send + Sync + 'static
    {
        self.functions.insert(name.into(), Arc::new(f));
    }

    fn get(&self, name: &str) -> Option<NodeFn> {
        self.functions.get(name).cloned()
    }
}

#[derive(Deserialize)]
struct FunctionPayload {
    function: String,
}

struct FunctionExecutor {
    f: NodeFn,
}

impl ExecutorOperator for FunctionExecutor {
    fn run_executor(&self, info: &ExecutionInfo) -> Result<ExecutorResult, LaunchError> {
        (self.f)(info)
    }
}

/// Registra la factory del discriminador `function` contra un catálogo.
pub fn register_function_executor(registry: &mut ExecutorRegistry, catalog: FunctionCatalog) {
    registry.register("function", move |spec, _cfg| {
                let payload: FunctionPayload =
                    serde_json::from_value(spec.payload.clone())
                        .map_err(|e| LaunchError::UnknownExecutable(format!("function payload: {e}")))?;
                let f = catalog.get(&payload.function)
                               .ok_or_else(|| {
                                   LaunchError::UnknownExecutable(format!("function '{}'", payload.function))
                               })?;
                Ok(Box::new(FunctionExecutor { f }) as Box<dyn ExecutorOperator>)
            });
}
