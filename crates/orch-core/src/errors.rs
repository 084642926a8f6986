//! Errores del núcleo de lanzamiento.
//!
//! La taxonomía distingue errores de configuración (detectados al construir
//! el `Launcher`, nunca reintentables) de los fallos de ejecución, que
//! transportan el `ExecutorResult` estructurado cuando existe para que la
//! capa de orquestación pueda reportarlo sin inspección dinámica de tipos.

use thiserror::Error;

use crate::model::ExecutorResult;

#[derive(Debug, Error)]
pub enum LaunchError {
    /// Discriminador de executable sin factory registrada. Fatal en
    /// construcción del Launcher.
    #[error("unknown executable kind: {0}")]
    UnknownExecutable(String),

    /// Discriminador de driver sin factory registrada. Fatal en construcción.
    #[error("unknown driver kind: {0}")]
    UnknownDriver(String),

    /// El nodo no es de sistema y tampoco declara executable.
    #[error("node '{0}' must be a system node or declare an executable")]
    NotLaunchable(String),

    /// El executor devolvió código distinto de cero (o lanzó). Transporta el
    /// resultado estructurado para el publish de ejecución fallida.
    #[error("execution {execution_id} failed with code {code}: {message}",
            code = .result.code,
            message = .result.message.as_deref().unwrap_or("<no message>"))]
    ExecutionFailed { execution_id: i64, result: ExecutorResult },

    /// Error propagado desde un driver externo, sin modificar.
    #[error("driver: {0}")]
    Driver(String),

    /// Fallo del store de metadatos (conexión, registro inexistente, etc.).
    #[error("metadata store: {0}")]
    Metadata(String),

    /// Fallo de la superficie de filesystem del Output Resolver.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal: {0}")]
    Internal(String),
}
