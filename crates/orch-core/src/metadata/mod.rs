//! Cliente del store de metadatos.
//!
//! El store en sí es un colaborador externo; aquí vive únicamente su
//! contrato (`MetadataStore`), una implementación in-memory de referencia
//! para tests y demos, y el handle de adquisición con scope de conexión.

pub mod handle;
pub mod memory;
pub mod store;

pub use handle::MetadataHandle;
pub use memory::InMemoryMetadataStore;
pub use store::{ContextRef, MetadataStore};
