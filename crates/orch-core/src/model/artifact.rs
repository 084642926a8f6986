//! Artifact: unidad de datos tipada y direccionada por URI.
//!
//! Propiedad y ciclo de vida:
//! - Los outputs nacen `Pending` (URI asignada, sin datos garantizados) antes
//!   de ejecutar, y se "sellan" (`Live` + fingerprint) sólo cuando la
//!   ejecución productora publica éxito.
//! - Los inputs son siempre artifacts `Live` preexistentes de ejecuciones
//!   upstream; el launcher nunca los muta.
//! - `properties` anota información auxiliar (nodo productor, clave de
//!   output) que no entra al fingerprint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Estado del artifact en el store de metadatos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactState {
    /// Creado con URI asignada; la ejecución productora aún no publicó.
    Pending,
    /// Sellado: hecho histórico inmutable, visible para resolución de inputs.
    Live,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Id asignado por el store al publicar. `None` mientras es placeholder.
    pub id: Option<i64>,
    pub type_name: String,
    pub uri: String,
    pub state: ArtifactState,
    /// Propiedad final asignada al sellar (clave de deduplicación/cache).
    pub fingerprint: Option<String>,
    pub properties: Value,
}

impl Artifact {
    /// Placeholder `Pending` para un output aún no producido.
    pub fn pending(type_name: impl Into<String>, uri: impl Into<String>, properties: Value) -> Self {
        Self { id: None,
               type_name: type_name.into(),
               uri: uri.into(),
               state: ArtifactState::Pending,
               fingerprint: None,
               properties }
    }

    /// Identidad estable del artifact para el fingerprint de cache: id del
    /// store si existe, URI en su defecto.
    pub fn identity(&self) -> String {
        match self.id {
            Some(id) => id.to_string(),
            None => self.uri.clone(),
        }
    }
}
