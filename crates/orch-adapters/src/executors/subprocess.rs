//! Executor `subprocess`: delega la computación a un programa externo.
//!
//! Payload: `{"program": "...", "args": [...], "env": {..}?}`. El contrato
//! con el proceso hijo va por variables de entorno:
//!
//! - `ORCH_EXECUTION_ID`, `ORCH_RUN_ID`
//! - `ORCH_TMP_DIR`, `ORCH_STATEFUL_DIR`, `ORCH_EXECUTION_OUTPUT_URI`
//! - `ORCH_OUTPUT_<CLAVE>`: URI del primer artifact de cada clave de output.
//!
//! El código de salida del proceso es el código del `ExecutorResult`; una
//! terminación por señal se reporta como código -1.

use std::collections::BTreeMap;
use std::process::Command;

use log::debug;
use serde::Deserialize;

use orch_core::{ExecutionInfo, ExecutorOperator, ExecutorRegistry, ExecutorResult, LaunchError};

#[derive(Debug, Clone, Deserialize)]
struct SubprocessPayload {
    program: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: BTreeMap<String, String>,
}

struct SubprocessExecutor {
    payload: SubprocessPayload,
}

impl ExecutorOperator for SubprocessExecutor {
    fn run_executor(&self, info: &ExecutionInfo) -> Result<ExecutorResult, LaunchError> {
        let mut cmd = Command::new(&self.payload.program);
        cmd.args(&self.payload.args)
           .envs(&self.payload.env)
           .env("ORCH_EXECUTION_ID", info.execution_id.to_string())
           .env("ORCH_RUN_ID", &info.pipeline_run_id)
           .env("ORCH_TMP_DIR", &info.tmp_dir)
           .env("ORCH_STATEFUL_DIR", &info.stateful_working_dir)
           .env("ORCH_EXECUTION_OUTPUT_URI", &info.execution_output_uri);
        for (key, artifacts) in &info.outputs {
            if let Some(first) = artifacts.first() {
                cmd.env(format!("ORCH_OUTPUT_{}", key.to_uppercase()), &first.uri);
            }
        }

        debug!("spawning '{}' for execution {}", self.payload.program, info.execution_id);
        let status = cmd.status()?;
        match status.code() {
            Some(0) => Ok(ExecutorResult::ok()),
            Some(code) => Ok(ExecutorResult::failed(code, format!("'{}' exited with {code}", self.payload.program))),
            None => Ok(ExecutorResult::failed(-1, format!("'{}' terminated by signal", self.payload.program))),
        }
    }
}

/// Registra la factory del discriminador `subprocess`.
pub fn register_subprocess_executor(registry: &mut ExecutorRegistry) {
    registry.register("subprocess", |spec, _cfg| {
                let payload: SubprocessPayload =
                    serde_json::from_value(spec.payload.clone())
                        .map_err(|e| LaunchError::UnknownExecutable(format!("subprocess payload: {e}")))?;
                Ok(Box::new(SubprocessExecutor { payload }) as Box<dyn ExecutorOperator>)
            });
}
