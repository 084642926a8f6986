//! Ciclo completo de lanzamiento contra el store in-memory: skip, éxito,
//! fallo, cache y nodos de sistema.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use orch_core::{Artifact, ContextRef, ContextSpec, DriverOperator, DriverOutput, DriverRegistry,
                ExecutableSpec, Execution, ExecutionInfo, ExecutionState, ExecutorOperator,
                ExecutorRegistry, ExecutorResult, InMemoryMetadataStore, InputSpec, LaunchError,
                Launcher, MetadataHandle, MetadataStore, NodeSpec, OutputSpec, PipelineInfo,
                PropertyValue, RuntimeSpec, SystemHandlerRegistry, SystemNodeHandler};

fn temp_base() -> PathBuf {
    std::env::temp_dir().join(format!("orchflow-test-{}", Uuid::new_v4()))
}

/// Executor que escribe un archivo marcador en cada output y cuenta llamadas.
struct MarkerExecutor {
    calls: Arc<AtomicUsize>,
}

impl ExecutorOperator for MarkerExecutor {
    fn run_executor(&self, info: &ExecutionInfo) -> Result<ExecutorResult, LaunchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        for artifacts in info.outputs.values() {
            for artifact in artifacts {
                fs::write(Path::new(&artifact.uri).join("data.txt"), b"ok")?;
            }
        }
        Ok(ExecutorResult::ok())
    }
}

struct FailingExecutor;

impl ExecutorOperator for FailingExecutor {
    fn run_executor(&self, _info: &ExecutionInfo) -> Result<ExecutorResult, LaunchError> {
        Ok(ExecutorResult::failed(42, "boom"))
    }
}

fn registries_with_marker(calls: Arc<AtomicUsize>) -> ExecutorRegistry {
    let mut executors = ExecutorRegistry::new();
    executors.register("marker", move |_spec, _cfg| {
                 Ok(Box::new(MarkerExecutor { calls: calls.clone() }) as Box<dyn ExecutorOperator>)
             });
    executors
}

fn trainer_node(id: &str, enable_cache: bool) -> NodeSpec {
    let mut node = NodeSpec::new(id, "trainer");
    node.outputs.insert("model".to_string(), OutputSpec { artifact_type: "Model".to_string() });
    node.parameters.insert("epochs".to_string(), PropertyValue::Int(3));
    node.executable = Some(ExecutableSpec::new("marker", json!({})));
    node.enable_cache = enable_cache;
    node
}

fn launch_node(node: NodeSpec,
               metadata: &MetadataHandle<InMemoryMetadataStore>,
               executors: &ExecutorRegistry,
               base: &Path)
               -> Result<Option<Execution>, LaunchError> {
    let pipeline = PipelineInfo::new("pipe", "pipe-id");
    let runtime = RuntimeSpec::new_run(base);
    let launcher = Launcher::new(node,
                                 metadata.clone(),
                                 pipeline,
                                 runtime,
                                 executors,
                                 &DriverRegistry::new(),
                                 &SystemHandlerRegistry::new(),
                                 None)?;
    launcher.launch()
}

#[test]
fn skip_when_inputs_not_ready_registers_nothing() {
    let base = temp_base();
    let metadata = MetadataHandle::new(InMemoryMetadataStore::new());

    let mut node = trainer_node("trainer", false);
    node.inputs.insert("examples".to_string(),
                       InputSpec { producer_node: "ingest".to_string(),
                                   output_key: "out".to_string(),
                                   min_count: 1 });

    let calls = Arc::new(AtomicUsize::new(0));
    let executors = registries_with_marker(calls.clone());
    let result = launch_node(node, &metadata, &executors, &base).expect("skip is not an error");

    assert!(result.is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    metadata.with(|m| {
                assert_eq!(m.execution_count(), 0, "skip must leave no execution record");
                assert_eq!(m.artifact_count(), 0);
                Ok(())
            })
            .unwrap();
}

#[test]
fn successful_launch_publishes_seals_and_cleans_up() {
    let base = temp_base();
    let metadata = MetadataHandle::new(InMemoryMetadataStore::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let executors = registries_with_marker(calls.clone());

    let execution = launch_node(trainer_node("trainer", false), &metadata, &executors, &base)
        .expect("launch should succeed")
        .expect("inputs are trivially ready");

    assert_eq!(execution.state, ExecutionState::Succeeded);
    // La versión del protocolo queda anotada en la ejecución publicada.
    assert_eq!(execution.properties.get("launcher_version"),
               Some(&PropertyValue::Str("L1.0".to_string())));
    assert_eq!(execution.properties.get("result_code"), Some(&PropertyValue::Int(0)));

    metadata.with(|m| {
                assert_eq!(m.artifact_count(), 1);
                let live = m.live_artifacts("trainer", "model")?;
                assert_eq!(live.len(), 1);
                assert!(live[0].fingerprint.is_some(), "published artifact must be sealed");
                assert!(Path::new(&live[0].uri).join("data.txt").exists());
                Ok(())
            })
            .unwrap();

    // Directorios auxiliares eliminados tras el éxito.
    let node_system = base.join("pipe").join("trainer").join(".system");
    assert!(!node_system.join("executor_execution")
                        .join(execution.id.to_string())
                        .join(".temp")
                        .exists());
    assert!(!node_system.join("stateful_working_dir").exists()
            || fs::read_dir(node_system.join("stateful_working_dir")).unwrap().next().is_none());
}

#[test]
fn downstream_consumes_upstream_outputs() {
    let base = temp_base();
    let metadata = MetadataHandle::new(InMemoryMetadataStore::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let executors = registries_with_marker(calls.clone());

    launch_node(trainer_node("trainer", false), &metadata, &executors, &base).unwrap().unwrap();

    let mut consumer = NodeSpec::new("pusher", "pusher");
    consumer.inputs.insert("model".to_string(),
                           InputSpec { producer_node: "trainer".to_string(),
                                       output_key: "model".to_string(),
                                       min_count: 1 });
    consumer.outputs
            .insert("pushed".to_string(), OutputSpec { artifact_type: "PushedModel".to_string() });
    consumer.executable = Some(ExecutableSpec::new("marker", json!({})));

    let execution = launch_node(consumer, &metadata, &executors, &base)
        .expect("consumer should launch")
        .expect("upstream output is live");

    assert_eq!(execution.state, ExecutionState::Succeeded);
    metadata.with(|m| {
                let inputs = m.inputs_of(execution.id).expect("inputs must be linked");
                assert_eq!(inputs.get("model").map(Vec::len), Some(1));
                Ok(())
            })
            .unwrap();
}

#[test]
fn failing_executor_publishes_failed_and_rolls_back_outputs() {
    let base = temp_base();
    let metadata = MetadataHandle::new(InMemoryMetadataStore::new());

    let mut executors = ExecutorRegistry::new();
    executors.register("failing", |_spec, _cfg| Ok(Box::new(FailingExecutor) as Box<dyn ExecutorOperator>));

    let mut node = trainer_node("trainer", false);
    node.executable = Some(ExecutableSpec::new("failing", json!({})));

    let err = launch_node(node, &metadata, &executors, &base).expect_err("non-zero code is a failure");
    let execution_id = match err {
        LaunchError::ExecutionFailed { execution_id, ref result } => {
            assert_eq!(result.code, 42);
            assert_eq!(result.message.as_deref(), Some("boom"));
            execution_id
        }
        other => panic!("expected ExecutionFailed, got {other}"),
    };

    metadata.with(|m| {
                let exec = m.execution(execution_id)?.expect("execution must exist");
                assert_eq!(exec.state, ExecutionState::Failed);
                assert_eq!(exec.properties.get("result_code"), Some(&PropertyValue::Int(42)));
                assert_eq!(m.artifact_count(), 0, "no artifact may be sealed on failure");
                Ok(())
            })
            .unwrap();

    let node_dir = base.join("pipe").join("trainer");
    assert!(!node_dir.join("model").join(execution_id.to_string()).exists(),
            "output dirs must be rolled back");
    assert!(!node_dir.join(".system")
                     .join("executor_execution")
                     .join(execution_id.to_string())
                     .join(".temp")
                     .exists(),
            "tmp dir is always removed");
    // El stateful dir sobrevive al fallo para permitir reanudar.
    assert!(node_dir.join(".system").join("stateful_working_dir").exists());
}

/// Store que delega en el in-memory pero rechaza el publish de éxito.
struct PublishRejectingStore {
    inner: InMemoryMetadataStore,
}

impl MetadataStore for PublishRejectingStore {
    fn prepare_contexts(&mut self, specs: &[ContextSpec]) -> Result<Vec<ContextRef>, LaunchError> {
        self.inner.prepare_contexts(specs)
    }

    fn register_execution(&mut self,
                          type_name: &str,
                          contexts: &[ContextRef],
                          inputs: &BTreeMap<String, Vec<Artifact>>,
                          properties: &BTreeMap<String, PropertyValue>)
                          -> Result<Execution, LaunchError> {
        self.inner.register_execution(type_name, contexts, inputs, properties)
    }

    fn cache_context(&mut self, fingerprint: &str) -> Result<ContextRef, LaunchError> {
        self.inner.cache_context(fingerprint)
    }

    fn cached_outputs(&self,
                      cache_context: &ContextRef)
                      -> Result<Option<BTreeMap<String, Vec<Artifact>>>, LaunchError> {
        self.inner.cached_outputs(cache_context)
    }

    fn publish_cached_execution(&mut self,
                                execution_id: i64,
                                contexts: &[ContextRef],
                                outputs: &BTreeMap<String, Vec<Artifact>>)
                                -> Result<(), LaunchError> {
        self.inner.publish_cached_execution(execution_id, contexts, outputs)
    }

    fn publish_succeeded_execution(&mut self,
                                   _execution_id: i64,
                                   _contexts: &[ContextRef],
                                   _outputs: &BTreeMap<String, Vec<Artifact>>,
                                   _result: &ExecutorResult)
                                   -> Result<BTreeMap<String, Vec<Artifact>>, LaunchError> {
        Err(LaunchError::Metadata("store unavailable".to_string()))
    }

    fn publish_failed_execution(&mut self,
                                execution_id: i64,
                                contexts: &[ContextRef],
                                result: Option<&ExecutorResult>)
                                -> Result<(), LaunchError> {
        self.inner.publish_failed_execution(execution_id, contexts, result)
    }

    fn live_artifacts(&self, producer_node: &str, output_key: &str) -> Result<Vec<Artifact>, LaunchError> {
        self.inner.live_artifacts(producer_node, output_key)
    }

    fn execution(&self, id: i64) -> Result<Option<Execution>, LaunchError> {
        self.inner.execution(id)
    }
}

#[test]
fn stateful_dir_is_removed_before_the_success_publish() {
    let base = temp_base();
    let metadata = MetadataHandle::new(PublishRejectingStore { inner: InMemoryMetadataStore::new() });
    let calls = Arc::new(AtomicUsize::new(0));
    let executors = registries_with_marker(calls.clone());

    let launcher = Launcher::new(trainer_node("trainer", false),
                                 metadata.clone(),
                                 PipelineInfo::new("pipe", "pipe-id"),
                                 RuntimeSpec::new("run-1", &base),
                                 &executors,
                                 &DriverRegistry::new(),
                                 &SystemHandlerRegistry::new(),
                                 None).unwrap();
    let err = launcher.launch().expect_err("publish failure must surface");
    assert!(matches!(err, LaunchError::Metadata(_)), "got {err}");
    assert_eq!(calls.load(Ordering::SeqCst), 1, "the executor did run");

    // Orden de limpieza en éxito: tmp y stateful se eliminan antes del
    // publish, así que un publish fallido no los deja atrás.
    let node_system = base.join("pipe").join("trainer").join(".system");
    assert!(!node_system.join("stateful_working_dir").join("run-1").exists(),
            "stateful dir must already be gone when the publish runs");
    assert!(!node_system.join("executor_execution").join("1").join(".temp").exists());
}

#[test]
fn cache_hit_reuses_outputs_without_running_executor() {
    let base = temp_base();
    let metadata = MetadataHandle::new(InMemoryMetadataStore::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let executors = registries_with_marker(calls.clone());

    let first = launch_node(trainer_node("trainer", true), &metadata, &executors, &base)
        .unwrap()
        .unwrap();
    assert_eq!(first.state, ExecutionState::Succeeded);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let second = launch_node(trainer_node("trainer", true), &metadata, &executors, &base)
        .unwrap()
        .unwrap();
    assert_eq!(second.state, ExecutionState::Cached);
    assert_eq!(calls.load(Ordering::SeqCst), 1, "cached launch must not invoke the executor");
    assert_ne!(first.id, second.id, "the cached launch still registers its own execution");

    metadata.with(|m| {
                assert_eq!(m.artifact_count(), 1, "cache reuses the sealed artifact, creates none");
                Ok(())
            })
            .unwrap();
}

#[test]
fn cache_disabled_always_executes() {
    let base = temp_base();
    let metadata = MetadataHandle::new(InMemoryMetadataStore::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let executors = registries_with_marker(calls.clone());

    launch_node(trainer_node("trainer", false), &metadata, &executors, &base).unwrap().unwrap();
    let second = launch_node(trainer_node("trainer", false), &metadata, &executors, &base)
        .unwrap()
        .unwrap();

    assert_eq!(second.state, ExecutionState::Succeeded);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn parameter_change_invalidates_cache() {
    let base = temp_base();
    let metadata = MetadataHandle::new(InMemoryMetadataStore::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let executors = registries_with_marker(calls.clone());

    launch_node(trainer_node("trainer", true), &metadata, &executors, &base).unwrap().unwrap();

    let mut changed = trainer_node("trainer", true);
    changed.parameters.insert("epochs".to_string(), PropertyValue::Int(4));
    let second = launch_node(changed, &metadata, &executors, &base).unwrap().unwrap();

    assert_eq!(second.state, ExecutionState::Succeeded);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

struct PropertyDriver;

impl DriverOperator for PropertyDriver {
    fn run_driver(&self, _info: &ExecutionInfo) -> Result<DriverOutput, LaunchError> {
        let mut out = DriverOutput::default();
        out.exec_properties
           .insert("span".to_string(), PropertyValue::Int(7));
        Ok(out)
    }
}

struct BadKeyDriver;

impl DriverOperator for BadKeyDriver {
    fn run_driver(&self, _info: &ExecutionInfo) -> Result<DriverOutput, LaunchError> {
        let mut out = DriverOutput::default();
        out.output_artifacts
           .insert("nope".to_string(), vec![Artifact::pending("X", "/tmp/x", json!({}))]);
        Ok(out)
    }
}

fn launch_with_driver(node: NodeSpec,
                      metadata: &MetadataHandle<InMemoryMetadataStore>,
                      executors: &ExecutorRegistry,
                      drivers: &DriverRegistry,
                      base: &Path)
                      -> Result<Option<Execution>, LaunchError> {
    let launcher = Launcher::new(node,
                                 metadata.clone(),
                                 PipelineInfo::new("pipe", "pipe-id"),
                                 RuntimeSpec::new_run(base),
                                 executors,
                                 drivers,
                                 &SystemHandlerRegistry::new(),
                                 None)?;
    launcher.launch()
}

#[test]
fn driver_overrides_exec_properties_before_publish() {
    let base = temp_base();
    let metadata = MetadataHandle::new(InMemoryMetadataStore::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let executors = registries_with_marker(calls.clone());

    let mut drivers = DriverRegistry::new();
    drivers.register("prop", |_spec| Ok(Box::new(PropertyDriver) as Box<dyn DriverOperator>));

    let mut node = trainer_node("trainer", false);
    node.driver = Some(ExecutableSpec::new("prop", json!({})));

    let execution = launch_with_driver(node, &metadata, &executors, &drivers, &base)
        .unwrap()
        .unwrap();
    assert_eq!(execution.properties.get("span"), Some(&PropertyValue::Int(7)));
}

#[test]
fn driver_with_unknown_output_key_fails_the_launch() {
    let base = temp_base();
    let metadata = MetadataHandle::new(InMemoryMetadataStore::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let executors = registries_with_marker(calls.clone());

    let mut drivers = DriverRegistry::new();
    drivers.register("bad", |_spec| Ok(Box::new(BadKeyDriver) as Box<dyn DriverOperator>));

    let mut node = trainer_node("trainer", false);
    node.driver = Some(ExecutableSpec::new("bad", json!({})));

    let err = launch_with_driver(node, &metadata, &executors, &drivers, &base)
        .expect_err("unknown output key must fail");
    assert!(matches!(err, LaunchError::Driver(_)), "got {err}");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

struct NoWriteHandler;

impl<M: MetadataStore> SystemNodeHandler<M> for NoWriteHandler {
    fn run(&self,
           _metadata: &MetadataHandle<M>,
           _node: &NodeSpec,
           _pipeline: &PipelineInfo,
           _runtime: &RuntimeSpec)
           -> Result<Option<Execution>, LaunchError> {
        Ok(None)
    }
}

#[test]
fn system_node_bypasses_the_protocol() {
    let base = temp_base();
    let metadata = MetadataHandle::new(InMemoryMetadataStore::new());

    let mut handlers = SystemHandlerRegistry::new();
    handlers.register("resolver", Arc::new(NoWriteHandler));

    let node = NodeSpec::new("resolve-latest", "resolver");
    let launcher = Launcher::new(node,
                                 metadata.clone(),
                                 PipelineInfo::new("pipe", "pipe-id"),
                                 RuntimeSpec::new_run(&base),
                                 &ExecutorRegistry::new(),
                                 &DriverRegistry::new(),
                                 &handlers,
                                 None).expect("system nodes need no executable");

    assert!(launcher.launch().unwrap().is_none());
    metadata.with(|m| {
                assert_eq!(m.execution_count(), 0);
                Ok(())
            })
            .unwrap();
}

#[test]
fn construction_rejects_unknown_executable_kind() {
    let metadata = MetadataHandle::new(InMemoryMetadataStore::new());
    let node = trainer_node("trainer", false);

    let err = Launcher::new(node,
                            metadata,
                            PipelineInfo::new("pipe", "pipe-id"),
                            RuntimeSpec::new_run(temp_base()),
                            &ExecutorRegistry::new(),
                            &DriverRegistry::new(),
                            &SystemHandlerRegistry::new(),
                            None).expect_err("no factory registered for 'marker'");
    assert!(matches!(err, LaunchError::UnknownExecutable(ref k) if k == "marker"), "got {err}");
}

#[test]
fn construction_rejects_node_with_no_execution_path() {
    let metadata = MetadataHandle::new(InMemoryMetadataStore::new());
    let node = NodeSpec::new("ghost", "ghost");

    let err = Launcher::new(node,
                            metadata,
                            PipelineInfo::new("pipe", "pipe-id"),
                            RuntimeSpec::new_run(temp_base()),
                            &ExecutorRegistry::new(),
                            &DriverRegistry::new(),
                            &SystemHandlerRegistry::new(),
                            None).expect_err("neither system handler nor executable");
    assert!(matches!(err, LaunchError::NotLaunchable(ref id) if id == "ghost"), "got {err}");
}
