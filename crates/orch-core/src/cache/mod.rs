//! Cache Coordinator: fingerprint de ejecución y reutilización de outputs.
//!
//! El fingerprint es una función pura de {executable, inputs resueltos,
//! outputs declarados, parámetros}:
//! - independiente del orden de claves (mapas canonicalizados),
//! - dependiente del orden posicional de artifacts dentro de una clave,
//! - independiente de las URIs de output (incluyen el execution id y
//!   romperían el matching entre ejecuciones).
//!
//! El contexto de cache se materializa en el store y se anexa a los
//! contextos de la ejecución haya hit o no, para que el linaje registre
//! siempre qué bucket se consultó.

use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::constants::LAUNCHER_VERSION;
use crate::hashing::hash_value;
use crate::model::{Artifact, ExecutableSpec, PropertyValue};

/// Deriva el fingerprint de cache de un intento de ejecución.
pub fn execution_fingerprint(executable: Option<&ExecutableSpec>,
                             inputs: &BTreeMap<String, Vec<Artifact>>,
                             outputs: &BTreeMap<String, Vec<Artifact>>,
                             parameters: &BTreeMap<String, PropertyValue>)
                             -> String {
    let input_ids: BTreeMap<&str, Vec<String>> =
        inputs.iter()
              .map(|(k, arts)| (k.as_str(), arts.iter().map(|a| a.identity()).collect()))
              .collect();
    let output_types: BTreeMap<&str, Vec<&str>> =
        outputs.iter()
               .map(|(k, arts)| (k.as_str(), arts.iter().map(|a| a.type_name.as_str()).collect()))
               .collect();
    let params: BTreeMap<&str, Value> = parameters.iter().map(|(k, v)| (k.as_str(), v.as_json())).collect();

    hash_value(&json!({
        "launcher_version": LAUNCHER_VERSION,
        "executable": executable,
        "inputs": input_ids,
        "outputs": output_types,
        "parameters": params,
    }))
}
