//! Contrato del Driver Operator: hook opcional pre-ejecución.
//!
//! Un driver puede reemplazar outputs por clave e inyectar/overridear
//! propiedades de ejecución. El launcher mergea su salida **antes** de
//! derivar el fingerprint de cache, de modo que los rewrites afectan al
//! caching. El driver puede usar su propia conexión de metadatos (clonando
//! el handle); el launcher libera la suya antes de invocarlo.

use std::collections::HashMap;

use crate::errors::LaunchError;
use crate::model::{DriverOutput, ExecutableSpec, ExecutionInfo};

pub trait DriverOperator: Send + Sync {
    fn run_driver(&self, info: &ExecutionInfo) -> Result<DriverOutput, LaunchError>;
}

/// Driver por defecto: no reescribe nada.
#[derive(Debug, Default)]
pub struct NoOpDriver;

impl DriverOperator for NoOpDriver {
    fn run_driver(&self, _info: &ExecutionInfo) -> Result<DriverOutput, LaunchError> {
        Ok(DriverOutput::default())
    }
}

pub type DriverFactory =
    Box<dyn Fn(&ExecutableSpec) -> Result<Box<dyn DriverOperator>, LaunchError> + Send + Sync>;

#[derive(Default)]
pub struct DriverRegistry {
    factories: HashMap<String, DriverFactory>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F)
        where F: Fn(&ExecutableSpec) -> Result<Box<dyn DriverOperator>, LaunchError> + Send + Sync + 'static
    {
        self.factories.insert(kind.into(), Box::new(factory));
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    pub fn build(&self, spec: &ExecutableSpec) -> Result<Box<dyn DriverOperator>, LaunchError> {
        match self.factories.get(&spec.kind) {
            Some(factory) => factory(spec),
            None => Err(LaunchError::UnknownDriver(spec.kind.clone())),
        }
    }
}
