//! Output Resolver: ubicaciones de outputs y directorios de trabajo.
//!
//! Todas las rutas se derivan determinísticamente de la identidad
//! pipeline/run/execution, de modo que reintentar el mismo execution id es
//! idempotente. La creación de directorios de output se difiere hasta que el
//! launcher confirma que la ejecución es necesaria (`make_output_dirs`).
//!
//! Disposición bajo `base_dir`:
//! ```text
//! <base>/<pipeline>/<node>/<output_key>/<execution_id>/   # URI de artifact
//! <base>/<pipeline>/<node>/.system/stateful_working_dir/<run_id>/
//! <base>/<pipeline>/<node>/.system/executor_execution/<execution_id>/.temp/
//! <base>/<pipeline>/<node>/.system/executor_execution/<execution_id>/executor_output.json
//! <base>/<pipeline>/<node>/.system/driver_execution/driver_output.json
//! ```

use log::debug;
use serde_json::json;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::LaunchError;
use crate::model::{Artifact, NodeSpec, OutputSpec, PipelineInfo, RuntimeSpec};

pub struct OutputResolver {
    node_id: String,
    node_outputs: BTreeMap<String, OutputSpec>,
    pipeline_name: String,
    run_id: String,
    base_dir: PathBuf,
}

impl OutputResolver {
    pub fn new(node: &NodeSpec, pipeline: &PipelineInfo, runtime: &RuntimeSpec) -> Self {
        Self { node_id: node.id.clone(),
               node_outputs: node.outputs.clone(),
               pipeline_name: pipeline.name.clone(),
               run_id: runtime.run_id.clone(),
               base_dir: runtime.base_dir.clone() }
    }

    fn node_dir(&self) -> PathBuf {
        self.base_dir.join(&self.pipeline_name).join(&self.node_id)
    }

    fn system_dir(&self) -> PathBuf {
        self.node_dir().join(".system")
    }

    /// Placeholders `Pending` por clave de output declarada. Sin efectos de
    /// filesystem: las URIs sólo se calculan. Mismo execution id ⇒ mismas
    /// URIs (idempotencia de reintento).
    pub fn generate_output_artifacts(&self, execution_id: i64) -> BTreeMap<String, Vec<Artifact>> {
        self.node_outputs
            .iter()
            .map(|(key, spec)| {
                let uri = self.node_dir().join(key).join(execution_id.to_string());
                let artifact = Artifact::pending(&spec.artifact_type,
                                                 uri.to_string_lossy().to_string(),
                                                 json!({
                                                     "producer_node": self.node_id,
                                                     "output_key": key,
                                                 }));
                (key.clone(), vec![artifact])
            })
            .collect()
    }

    /// URI donde el executor puede dejar su resultado estructurado.
    pub fn executor_output_uri(&self, execution_id: i64) -> String {
        self.system_dir()
            .join("executor_execution")
            .join(execution_id.to_string())
            .join("executor_output.json")
            .to_string_lossy()
            .to_string()
    }

    /// URI dedicada para la salida estructurada del driver.
    pub fn driver_output_uri(&self) -> String {
        self.system_dir()
            .join("driver_execution")
            .join("driver_output.json")
            .to_string_lossy()
            .to_string()
    }

    /// Directorio stateful, estable entre reintentos del mismo run (permite
    /// resumir progreso tras un fallo). Se crea si no existe.
    pub fn stateful_working_dir(&self) -> Result<PathBuf, LaunchError> {
        let dir = self.system_dir().join("stateful_working_dir").join(&self.run_id);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Directorio temporal por intento. Seguro de borrar al terminar.
    pub fn make_tmp_dir(&self, execution_id: i64) -> Result<PathBuf, LaunchError> {
        let dir = self.system_dir()
                      .join("executor_execution")
                      .join(execution_id.to_string())
                      .join(".temp");
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Crea los directorios de output justo antes de ejecutar.
    pub fn make_output_dirs(outputs: &BTreeMap<String, Vec<Artifact>>) -> Result<(), LaunchError> {
        for artifacts in outputs.values() {
            for artifact in artifacts {
                fs::create_dir_all(&artifact.uri)?;
            }
        }
        Ok(())
    }

    /// Rollback: elimina los directorios de output del intento fallido.
    pub fn remove_output_dirs(outputs: &BTreeMap<String, Vec<Artifact>>) -> Result<(), LaunchError> {
        for artifacts in outputs.values() {
            for artifact in artifacts {
                debug!("removing output dir {}", artifact.uri);
                remove_dir_if_exists(Path::new(&artifact.uri))?;
            }
        }
        Ok(())
    }

    /// Limpieza post-éxito: el progreso stateful ya no se necesita.
    pub fn remove_stateful_working_dir(dir: &Path) -> Result<(), LaunchError> {
        remove_dir_if_exists(dir)
    }

    /// Limpieza incondicional del directorio temporal del intento.
    pub fn remove_tmp_dir(dir: &Path) -> Result<(), LaunchError> {
        remove_dir_if_exists(dir)
    }
}

fn remove_dir_if_exists(dir: &Path) -> Result<(), LaunchError> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
