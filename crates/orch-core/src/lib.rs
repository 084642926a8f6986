//! orch-core: protocolo de lanzamiento de nodos de pipeline
pub mod cache;
pub mod constants;
pub mod errors;
pub mod hashing;
pub mod inputs;
pub mod launcher;
pub mod metadata;
pub mod model;
pub mod operator;
pub mod outputs;

pub use errors::LaunchError;
pub use launcher::Launcher;
pub use metadata::{ContextRef, InMemoryMetadataStore, MetadataHandle, MetadataStore};
pub use model::{Artifact, ArtifactState, ContextSpec, DriverOutput, ExecutableSpec, Execution,
                ExecutionInfo, ExecutionState, ExecutorResult, InputSpec, NodeSpec, OutputSpec,
                PipelineInfo, PropertyValue, RuntimeSpec};
pub use operator::{DriverOperator, DriverRegistry, ExecutorOperator, ExecutorRegistry, NoOpDriver,
                   SystemHandlerRegistry, SystemNodeHandler};
pub use outputs::OutputResolver;
