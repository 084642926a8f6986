use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use orch_adapters::{register_function_executor, FunctionCatalog};
use orch_core::cache::execution_fingerprint;
use orch_core::{Artifact, DriverRegistry, ExecutableSpec, ExecutionState, ExecutorRegistry,
                ExecutorResult, InMemoryMetadataStore, InputSpec, Launcher, MetadataHandle,
                NodeSpec, OutputSpec, PipelineInfo, RuntimeSpec, SystemHandlerRegistry};
use serde_json::json;

fn main() {
    // Cargar .env si existe para obtener ORCHFLOW_BASE_DIR
    let _ = dotenvy::dotenv();
    // CLI mínima: `orch-cli launch [--base <DIR>] [--cache]` y
    //             `orch-cli fingerprint --node <FILE>`
    let args: Vec<String> = std::env::args().collect();
    if args.len() >= 2 && args[1] == "launch" {
        let mut base: Option<PathBuf> = None;
        let mut cache = false;
        let mut i = 2;
        while i < args.len() {
            match args[i].as_str() {
                "--base" => {
                    i += 1;
                    if i < args.len() { base = Some(PathBuf::from(&args[i])); }
                }
                "--cache" => { cache = true; }
                _ => {}
            }
            i += 1;
        }
        let base = base.or_else(|| std::env::var("ORCHFLOW_BASE_DIR").ok().map(PathBuf::from))
                       .unwrap_or_else(|| std::env::temp_dir().join("orchflow"));
        run_demo_pipeline(&base, cache);
    } else if args.len() >= 2 && args[1] == "fingerprint" {
        let mut node_file: Option<String> = None;
        let mut i = 2;
        while i < args.len() {
            match args[i].as_str() {
                "--node" => {
                    i += 1;
                    if i < args.len() { node_file = Some(args[i].clone()); }
                }
                _ => {}
            }
            i += 1;
        }
        if let Some(path) = node_file {
            let raw = match fs::read_to_string(&path) {
                Ok(r) => r,
                Err(e) => { eprintln!("[orch fingerprint] no se pudo leer {path}: {e}"); std::process::exit(5); }
            };
            let node: NodeSpec = match serde_json::from_str(&raw) {
                Ok(n) => n,
                Err(e) => { eprintln!("[orch fingerprint] JSON inválido: {e}"); std::process::exit(3); }
            };
            // Fingerprint declarativo: sin inputs resueltos, outputs sólo por tipo.
            let outputs: BTreeMap<String, Vec<Artifact>> =
                node.outputs
                    .iter()
                    .map(|(k, spec)| (k.clone(), vec![Artifact::pending(&spec.artifact_type, "", json!({}))]))
                    .collect();
            let fp = execution_fingerprint(node.executable.as_ref(),
                                           &BTreeMap::new(),
                                           &outputs,
                                           &node.parameters);
            println!("{fp}");
            std::process::exit(0);
        } else {
            eprintln!("Uso: orch-cli fingerprint --node <FILE>");
            std::process::exit(2);
        }
    } else {
        println!("orch-cli: use 'launch' or 'fingerprint' subcommands");
    }
}

/// Pipeline de demostración: generator → trainer contra el store in-memory.
fn run_demo_pipeline(base: &Path, cache: bool) {
    let metadata = MetadataHandle::new(InMemoryMetadataStore::new());

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
               let n = info.inputs.values().map(Vec::len).sum::<usize>();
               for artifacts in info.outputs.values() {
                   for artifact in artifacts {
                       fs::write(Path::new(&artifact.uri).join("model.bin"), format!("trained on {n}"))?;
                   }
               }
               Ok(ExecutorResult::ok())
           });
    let mut executors = ExecutorRegistry::new();
    register_function_executor(&mut executors, catalog);

    let mut generator = NodeSpec::new("generator", "generator");
    generator.outputs
             .insert("examples".to_string(), OutputSpec { artifact_type: "Examples".to_string() });
    generator.executable = Some(ExecutableSpec::new("function", json!({"function": "generate"})));
    generator.enable_cache = cache;

    let mut trainer = NodeSpec::new("trainer", "trainer");
    trainer.inputs.insert("examples".to_string(),
                          InputSpec { producer_node: "generator".to_string(),
                                      output_key: "examples".to_string(),
                                      min_count: 1 });
    trainer.outputs.insert("model".to_string(), OutputSpec { artifact_type: "Model".to_string() });
    trainer.executable = Some(ExecutableSpec::new("function", json!({"function": "train"})));
    trainer.enable_cache = cache;

    let pipeline = PipelineInfo::new("demo", "demo-id");
    let runtime = RuntimeSpec::new_run(base);
    let drivers = DriverRegistry::new();
    let handlers = SystemHandlerRegistry::new();

    for node in [generator, trainer] {
        let id = node.id.clone();
        let launcher = match Launcher::new(node,
                                           metadata.clone(),
                                           pipeline.clone(),
                                           runtime.clone(),
                                           &executors,
                                           &drivers,
                                           &handlers,
                                           None) {
            Ok(l) => l,
            Err(e) => { eprintln!("[orch launch] configuración inválida para '{id}': {e}"); std::process::exit(4); }
        };
        match launcher.launch() {
            Ok(Some(execution)) => {
                let state = match execution.state {
                    ExecutionState::Succeeded => "succeeded",
                    ExecutionState::Cached => "cached",
                    ExecutionState::Failed => "failed",
                    ExecutionState::Running => "running",
                };
                println!("{id}: execution {} {state}", execution.id);
            }
            Ok(None) => println!("{id}: skipped"),
            Err(e) => { eprintln!("[orch launch] '{id}' falló: {e}"); std::process::exit(5); }
        }
    }
}
