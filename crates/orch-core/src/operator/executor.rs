//! Contrato del Executor Operator y su registry de factories.

use serde_json::Value;
use std::collections::HashMap;

use crate::errors::LaunchError;
use crate::model::{ExecutableSpec, ExecutionInfo, ExecutorResult};

/// Ejecuta la computación real del nodo de forma síncrona, escribiendo en
/// las ubicaciones de output pre-asignadas. Un código distinto de cero en el
/// resultado se trata como fallo de ejecución.
///
/// La llamada puede bloquear largo tiempo y puede usar concurrencia interna;
/// ambas cosas son opacas para el launcher.
pub trait ExecutorOperator: Send + Sync {
    fn run_executor(&self, info: &ExecutionInfo) -> Result<ExecutorResult, LaunchError>;
}

/// Factory: construye un operator a partir del spec del executable y de la
/// configuración de plataforma auxiliar.
pub type ExecutorFactory =
    Box<dyn Fn(&ExecutableSpec, Option<&Value>) -> Result<Box<dyn ExecutorOperator>, LaunchError> + Send + Sync>;

/// Registry discriminador → factory. Construir un Launcher para un nodo cuyo
/// discriminador no está registrado es error fatal de configuración.
#[derive(Default)]
pub struct ExecutorRegistry {
    factories: HashMap<String, ExecutorFactory>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F)
        where F: Fn(&ExecutableSpec, Option<&Value>) -> Result<Box<dyn ExecutorOperator>, LaunchError>
                  + Send
                  + Sync
                  + 'static
    {
        self.factories.insert(kind.into(), Box::new(factory));
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    pub fn build(&self,
                 spec: &ExecutableSpec,
                 platform_config: Option<&Value>)
                 -> Result<Box<dyn ExecutorOperator>, LaunchError> {
        match self.factories.get(&spec.kind) {
            Some(factory) => factory(spec, platform_config),
            None => Err(LaunchError::UnknownExecutable(spec.kind.clone())),
        }
    }
}
