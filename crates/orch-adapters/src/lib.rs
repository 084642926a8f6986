//! orch-adapters: operators y handlers concretos sobre el núcleo neutro
//!
//! Este crate provee:
//! - Executors: `function` (lógica in-process desde un catálogo) y
//!   `subprocess` (programa externo con contrato de variables de entorno).
//! - Drivers: `property_override` (inyección declarativa de propiedades).
//! - Handlers de sistema: `importer` (registra un artifact externo ya
//!   existente) y `latest_artifact_resolver` (resolución pura de metadatos).
//!
//! El núcleo sólo conoce discriminadores y payloads opacos; aquí se les da
//! semántica concreta y se registran las factories correspondientes.

pub mod drivers;
pub mod executors;
pub mod handlers;

pub use drivers::property_override::register_property_override_driver;
pub use executors::function::{register_function_executor, FunctionCatalog};
pub use executors::subprocess::register_subprocess_executor;
pub use handlers::importer::ImporterHandler;
pub use handlers::resolver::LatestArtifactResolver;
