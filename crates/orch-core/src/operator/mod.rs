//! Contratos polimórficos de operators y sus registries.
//!
//! Dispatch por discriminador: el `kind` del `ExecutableSpec` selecciona una
//! factory en el registry correspondiente (el nombre de tipo del nodo, en el
//! caso de los handlers de sistema). Sin jerarquías de herencia: trait
//! objects con tags explícitos en el spec del nodo.

pub mod driver;
pub mod executor;
pub mod system;

pub use driver::{DriverOperator, DriverRegistry, NoOpDriver};
pub use executor::{ExecutorOperator, ExecutorRegistry};
pub use system::{SystemHandlerRegistry, SystemNodeHandler};
