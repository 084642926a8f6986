//! Modelos del dominio de lanzamiento (NodeSpec, Artifact, Execution,...)

pub mod artifact;
pub mod exec_info;
pub mod execution;
pub mod node;
pub mod pipeline;
pub mod property;

pub use artifact::{Artifact, ArtifactState};
pub use exec_info::ExecutionInfo;
pub use execution::{DriverOutput, Execution, ExecutionState, ExecutorResult};
pub use node::{ContextSpec, ExecutableSpec, InputSpec, NodeSpec, OutputSpec};
pub use pipeline::{PipelineInfo, RuntimeSpec};
pub use property::PropertyValue;
