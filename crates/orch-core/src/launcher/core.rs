//! Núcleo del protocolo de lanzamiento.
//!
//! `Launcher` orquesta el ciclo completo de un nodo: preparación de
//! contextos, resolución de inputs, registro de ejecución, driver opcional,
//! decisión de cache, ejecución y publicación. Es genérico sobre el store de
//! metadatos, igual que los operators lo son sobre la lógica concreta.
//!
//! Disciplina de conexión: cada grupo de operaciones de metadatos corre en
//! su propio scope `with(..)`; entre grupos no se retiene el lock. El driver
//! corre siempre sin lock tomado (puede traer su propio handle clonado).

use log::{debug, info, warn};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::execution_fingerprint;
use crate::constants::{LAUNCHER_VERSION, VERSION_ANNOTATION_KEY};
use crate::errors::LaunchError;
use crate::inputs::{resolve_input_artifacts, resolve_parameters};
use crate::metadata::{ContextRef, MetadataHandle, MetadataStore};
use crate::model::{Artifact, DriverOutput, Execution, ExecutionInfo, ExecutorResult, NodeSpec,
                   PipelineInfo, PropertyValue, RuntimeSpec};
use crate::operator::{DriverOperator, DriverRegistry, ExecutorOperator, ExecutorRegistry,
                      SystemHandlerRegistry, SystemNodeHandler};
use crate::outputs::OutputResolver;

/// Resultado de la fase de preparación.
enum Prepared {
    /// Algún input no está listo: no hay ejecución que registrar.
    Skipped,
    Ready(Box<PreparedExecution>),
}

struct PreparedExecution {
    contexts: Vec<ContextRef>,
    execution: Execution,
    exec_properties: BTreeMap<String, PropertyValue>,
    input_artifacts: BTreeMap<String, Vec<Artifact>>,
    output_artifacts: BTreeMap<String, Vec<Artifact>>,
}

/// Orquestador del ciclo de vida de un nodo.
///
/// La construcción valida la configuración completa: discriminadores de
/// executable/driver resueltos contra sus registries, o handler de sistema
/// registrado para el tipo del nodo. Un nodo sin camino de ejecución es
/// `NotLaunchable` en construcción, nunca en `launch`.
pub struct Launcher<M: MetadataStore> {
    node: NodeSpec,
    metadata: MetadataHandle<M>,
    pipeline: PipelineInfo,
    runtime: RuntimeSpec,
    executor: Option<Box<dyn ExecutorOperator>>,
    driver: Option<Box<dyn DriverOperator>>,
    system_handler: Option<Arc<dyn SystemNodeHandler<M>>>,
    outputs: OutputResolver,
}

impl<M: MetadataStore> std::fmt::Debug for Launcher<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Launcher")
         .field("node", &self.node.id)
         .finish_non_exhaustive()
    }
}

impl<M: MetadataStore> Launcher<M> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(node: NodeSpec,
               metadata: MetadataHandle<M>,
               pipeline: PipelineInfo,
               runtime: RuntimeSpec,
               executors: &ExecutorRegistry,
               drivers: &DriverRegistry,
               system_handlers: &SystemHandlerRegistry<M>,
               platform_config: Option<&Value>)
               -> Result<Self, LaunchError> {
        let system_handler = system_handlers.lookup(&node.type_name);

        let executor = match (&system_handler, &node.executable) {
            (Some(_), _) => None,
            (None, Some(spec)) => Some(executors.build(spec, platform_config)?),
            (None, None) => {
                return Err(LaunchError::NotLaunchable(node.id.clone()));
            }
        };

        let driver = match (&system_handler, &node.driver) {
            (None, Some(spec)) => Some(drivers.build(spec)?),
            _ => None,
        };

        let outputs = OutputResolver::new(&node, &pipeline, &runtime);

        Ok(Self { node, metadata, pipeline, runtime, executor, driver, system_handler, outputs })
    }

    /// Corre el protocolo completo.
    ///
    /// - `Ok(None)`: lanzamiento saltado (inputs no listos) o handler de
    ///   sistema sin ejecución que reportar.
    /// - `Ok(Some(exec))`: ejecución terminal (`Succeeded` o `Cached`),
    ///   releída del store tras publicar.
    /// - `Err(..)`: fallo; si había ejecución registrada, quedó publicada
    ///   como `Failed` antes de retornar.
    ///
    /// En éxito, el stateful dir se elimina antes del publish: si el publish
    /// falla después de un executor exitoso, el progreso stateful ya no
    /// existe y los datos de output quedan huérfanos en el filesystem.
    /// Reconciliar eso es trabajo de la capa de orquestación.
    pub fn launch(&self) -> Result<Option<Execution>, LaunchError> {
        if let Some(handler) = &self.system_handler {
            debug!("node '{}' handled as system node", self.node.id);
            return handler.run(&self.metadata, &self.node, &self.pipeline, &self.runtime);
        }

        let mut prepared = match self.prepare()? {
            Prepared::Skipped => {
                info!("node '{}' skipped: inputs not ready", self.node.id);
                return Ok(None);
            }
            Prepared::Ready(p) => *p,
        };
        let execution_id = prepared.execution.id;
        info!("node '{}' registered execution {}", self.node.id, execution_id);

        // Driver opcional, siempre sin conexión tomada.
        if let Some(driver) = &self.driver {
            let info = ExecutionInfo { execution_id,
                                       inputs: prepared.input_artifacts.clone(),
                                       outputs: prepared.output_artifacts.clone(),
                                       exec_properties: prepared.exec_properties.clone(),
                                       execution_output_uri: self.outputs.driver_output_uri(),
                                       stateful_working_dir: PathBuf::new(),
                                       tmp_dir: PathBuf::new(),
                                       pipeline_run_id: self.runtime.run_id.clone() };
            let output = driver.run_driver(&info)?;
            self.apply_driver_output(&mut prepared, output)?;
        }

        // Fingerprint y decisión de cache. El contexto de cache se anexa a la
        // ejecución haya hit o no.
        let fingerprint = execution_fingerprint(self.node.executable.as_ref(),
                                                &prepared.input_artifacts,
                                                &prepared.output_artifacts,
                                                &prepared.exec_properties);
        let cached = self.metadata.with(|m| {
                             let cache_ctx = m.cache_context(&fingerprint)?;
                             prepared.contexts.push(cache_ctx.clone());
                             if self.node.enable_cache {
                                 m.cached_outputs(&cache_ctx)
                             } else {
                                 Ok(None)
                             }
                         })?;

        if let Some(outputs) = cached {
            info!("node '{}' execution {} satisfied from cache", self.node.id, execution_id);
            self.metadata
                .with(|m| m.publish_cached_execution(execution_id, &prepared.contexts, &outputs))?;
            return self.reread_execution(execution_id).map(Some);
        }

        self.execute_and_publish(&prepared).map(Some)
    }

    /// Scope 1: contextos, resolución de inputs y registro de la ejecución.
    fn prepare(&self) -> Result<Prepared, LaunchError> {
        let exec_properties = resolve_parameters(&self.node);
        let prepared = self.metadata.with(|m| {
                               let contexts = m.prepare_contexts(&self.node.contexts)?;
                               let inputs = match resolve_input_artifacts(&*m, &self.node)? {
                                   Some(inputs) => inputs,
                                   None => return Ok(None),
                               };
                               let execution = m.register_execution(&self.node.type_name,
                                                                    &contexts,
                                                                    &inputs,
                                                                    &exec_properties)?;
                               Ok(Some((contexts, inputs, execution)))
                           })?;

        let (contexts, input_artifacts, execution) = match prepared {
            Some(parts) => parts,
            None => return Ok(Prepared::Skipped),
        };
        let output_artifacts = self.outputs.generate_output_artifacts(execution.id);

        Ok(Prepared::Ready(Box::new(PreparedExecution { contexts,
                                                        execution,
                                                        exec_properties,
                                                        input_artifacts,
                                                        output_artifacts })))
    }

    /// Mergea la salida del driver: las claves de output reemplazan la lista
    /// completa; las propiedades se insertan u overridean una a una.
    fn apply_driver_output(&self,
                           prepared: &mut PreparedExecution,
                           output: DriverOutput)
                           -> Result<(), LaunchError> {
        for (key, artifacts) in output.output_artifacts {
            if !prepared.output_artifacts.contains_key(&key) {
                return Err(LaunchError::Driver(format!(
                    "driver produced unknown output key '{}' for node '{}'",
                    key, self.node.id
                )));
            }
            debug!("driver replaced output key '{}' of node '{}'", key, self.node.id);
            prepared.output_artifacts.insert(key, artifacts);
        }
        for (key, value) in output.exec_properties {
            prepared.exec_properties.insert(key, value);
        }
        Ok(())
    }

    /// Ejecuta el operator y publica el resultado terminal.
    fn execute_and_publish(&self, prepared: &PreparedExecution) -> Result<Execution, LaunchError> {
        let execution_id = prepared.execution.id;
        let stateful_working_dir = self.outputs.stateful_working_dir()?;
        let tmp_dir = self.outputs.make_tmp_dir(execution_id)?;

        let info = ExecutionInfo { execution_id,
                                   inputs: prepared.input_artifacts.clone(),
                                   outputs: prepared.output_artifacts.clone(),
                                   exec_properties: prepared.exec_properties.clone(),
                                   execution_output_uri: self.outputs.executor_output_uri(execution_id),
                                   stateful_working_dir,
                                   tmp_dir: tmp_dir.clone(),
                                   pipeline_run_id: self.runtime.run_id.clone() };

        let attempt = (|| -> Result<ExecutorResult, LaunchError> {
            OutputResolver::make_output_dirs(&prepared.output_artifacts)?;
            let executor = self.executor
                               .as_ref()
                               .ok_or_else(|| LaunchError::NotLaunchable(self.node.id.clone()))?;
            let result = executor.run_executor(&info)?;
            if result.code != 0 {
                return Err(LaunchError::ExecutionFailed { execution_id, result });
            }
            Ok(result)
        })();

        match attempt {
            Ok(mut result) => {
                // Limpieza previa al publish: tmp y luego stateful (el nodo ya
                // no puede reanudar progreso tras un éxito).
                OutputResolver::remove_tmp_dir(&info.tmp_dir)?;
                OutputResolver::remove_stateful_working_dir(&info.stateful_working_dir)?;
                result.annotations
                      .insert(VERSION_ANNOTATION_KEY.to_string(), LAUNCHER_VERSION.to_string());
                self.metadata.with(|m| {
                        m.publish_succeeded_execution(execution_id,
                                                      &prepared.contexts,
                                                      &prepared.output_artifacts,
                                                      &result)
                    })?;
                info!("node '{}' execution {} succeeded", self.node.id, execution_id);
                self.reread_execution(execution_id)
            }
            Err(err) => {
                // Rollback de ubicaciones de output del intento fallido. El
                // stateful dir se conserva para reintentos.
                if let Err(clean) = OutputResolver::remove_output_dirs(&prepared.output_artifacts) {
                    warn!("failed to remove output dirs of execution {}: {}", execution_id, clean);
                }
                if let Err(clean) = OutputResolver::remove_tmp_dir(&info.tmp_dir) {
                    warn!("failed to remove tmp dir of execution {}: {}", execution_id, clean);
                }
                let result = match &err {
                    LaunchError::ExecutionFailed { result, .. } => Some(result.clone()),
                    _ => None,
                };
                self.metadata.with(|m| {
                        m.publish_failed_execution(execution_id, &prepared.contexts, result.as_ref())
                    })?;
                warn!("node '{}' execution {} failed: {}", self.node.id, execution_id, err);
                Err(err)
            }
        }
    }

    /// Relee la ejecución publicada; el llamador observa el estado terminal
    /// real del store, no una copia local.
    fn reread_execution(&self, execution_id: i64) -> Result<Execution, LaunchError> {
        self.metadata
            .with(|m| m.execution(execution_id))?
            .ok_or_else(|| LaunchError::Internal(format!("execution {} vanished after publish", execution_id)))
    }
}
