//! Demo del protocolo de lanzamiento: un pipeline de dos nodos corrido dos
//! veces contra el mismo store para observar el hit de cache en la segunda
//! pasada.

mod config;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::json;

use orch_adapters::{register_function_executor, register_property_override_driver, FunctionCatalog};
use orch_core::{DriverRegistry, ExecutableSpec, Execution, ExecutionState, ExecutorRegistry,
                ExecutorResult, InMemoryMetadataStore, InputSpec, LaunchError, Launcher,
                MetadataHandle, NodeSpec, OutputSpec, PipelineInfo, PropertyValue, RuntimeSpec,
                SystemHandlerRegistry};

use config::OrchConfig;

fn demo_catalog() -> FunctionCatalog {
    let mut catalog = FunctionCatalog::new();
    catalog.insert("generate", |info| {
               for artifacts in info.outputs.values() {
                   for artifact in artifacts {
                       fs::write(Path::new(&artifact.uri).join("examples.jsonl"), b"{\"x\":1}\n")?;
                   }
               }
               Ok(ExecutorResult::ok())
           });
    catalog.insert("train", |info| {
               let sources = info.inputs.values().map(Vec::len).sum::<usize>();
               for artifacts in info.outputs.values() {
                   for artifact in artifacts {
                       fs::write(Path::new(&artifact.uri).join("model.bin"),
                                 format!("model from {sources} input(s)"))?;
                   }
               }
               Ok(ExecutorResult::ok())
           });
    catalog
}

fn demo_nodes() -> Vec<NodeSpec> {
    let mut generator = NodeSpec::new("generator", "generator");
    generator.outputs
             .insert("examples".to_string(), OutputSpec { artifact_type: "Examples".to_string() });
    generator.parameters
             .insert("rows".to_string(), PropertyValue::Int(100));
    generator.executable = Some(ExecutableSpec::new("function", json!({"function": "generate"})));
    generator.enable_cache = true;

    let mut trainer = NodeSpec::new("trainer", "trainer");
    trainer.inputs.insert("examples".to_string(),
                          InputSpec { producer_node: "generator".to_string(),
                                      output_key: "examples".to_string(),
                                      min_count: 1 });
    trainer.outputs.insert("model".to_string(), OutputSpec { artifact_type: "Model".to_string() });
    trainer.executable = Some(ExecutableSpec::new("function", json!({"function": "train"})));
    trainer.driver = Some(ExecutableSpec::new("property_override", json!({
        "properties": {"epochs": 3},
    })));
    trainer.enable_cache = true;

    vec![generator, trainer]
}

/// Etiqueta de consola de un estado terminal; `None` para estados que un
/// launch devuelto con `Ok` no puede reportar.
fn state_label(state: ExecutionState) -> Option<&'static str> {
    match state {
        ExecutionState::Succeeded => Some("ejecutado"),
        ExecutionState::Cached => Some("cache hit"),
        ExecutionState::Running | ExecutionState::Failed => None,
    }
}

fn run_pass(pass: usize,
            config: &OrchConfig,
            metadata: &MetadataHandle<InMemoryMetadataStore>,
            executors: &ExecutorRegistry,
            drivers: &DriverRegistry)
            -> Result<Vec<Execution>, LaunchError> {
    let pipeline = PipelineInfo::new(&config.pipeline_name, format!("{}-id", config.pipeline_name));
    let runtime = RuntimeSpec::new_run(&config.base_dir);
    let handlers = SystemHandlerRegistry::new();
    println!("— pasada {pass} (run {})", runtime.run_id);

    let mut results = Vec::new();
    for node in demo_nodes() {
        let id = node.id.clone();
        let launcher = Launcher::new(node,
                                     metadata.clone(),
                                     pipeline.clone(),
                                     runtime.clone(),
                                     executors,
                                     drivers,
                                     &handlers,
                                     None)?;
        match launcher.launch()? {
            Some(execution) => {
                let label = match state_label(execution.state) {
                    Some(label) => label,
                    None => {
                        eprintln!("[orchflow] estado no terminal de '{id}': {:?}", execution.state);
                        std::process::exit(5);
                    }
                };
                println!("  {id}: execution {} → {label}", execution.id);
                results.push(execution);
            }
            None => println!("  {id}: saltado"),
        }
    }
    Ok(results)
}

fn main() {
    let config = OrchConfig::from_env();
    println!("orchflow demo (base: {})", config.base_dir.display());

    let metadata = MetadataHandle::new(InMemoryMetadataStore::new());
    let mut executors = ExecutorRegistry::new();
    register_function_executor(&mut executors, demo_catalog());
    let mut drivers = DriverRegistry::new();
    register_property_override_driver(&mut drivers);

    let first = match run_pass(1, &config, &metadata, &executors, &drivers) {
        Ok(r) => r,
        Err(e) => { eprintln!("[orchflow] primera pasada falló: {e}"); std::process::exit(5); }
    };
    let second = match run_pass(2, &config, &metadata, &executors, &drivers) {
        Ok(r) => r,
        Err(e) => { eprintln!("[orchflow] segunda pasada falló: {e}"); std::process::exit(5); }
    };

    let executed = first.iter().filter(|e| e.state == ExecutionState::Succeeded).count();
    let cached = second.iter().filter(|e| e.state == ExecutionState::Cached).count();
    println!("resumen: {executed} nodo(s) ejecutados, {cached} reutilizados de cache");

    // Linaje observable: inputs del trainer de la segunda pasada.
    if let Some(trainer) = second.last() {
        let _ = metadata.with(|m| {
                    if let Some(inputs) = m.inputs_of(trainer.id) {
                        let linked: BTreeMap<_, _> =
                            inputs.iter().map(|(k, v)| (k.as_str(), v.len())).collect();
                        println!("inputs enlazados del trainer: {linked:?}");
                    }
                    Ok(())
                });
    }
}
