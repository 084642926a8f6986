//! Carga de configuración del demo desde variables de entorno.
//! Usa convención `ORCHFLOW_BASE_DIR` con fallback al directorio temporal.

use std::env;
use std::path::PathBuf;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

#[derive(Debug, Clone)]
pub struct OrchConfig {
    pub base_dir: PathBuf,
    pub pipeline_name: String,
}

impl OrchConfig {
    pub fn from_env() -> Self {
        // asegura que .env se haya cargado
        Lazy::force(&DOTENV_LOADED);
        let base_dir = env::var("ORCHFLOW_BASE_DIR").map(PathBuf::from)
                                                    .unwrap_or_else(|_| env::temp_dir().join("orchflow"));
        let pipeline_name = env::var("ORCHFLOW_PIPELINE").unwrap_or_else(|_| "demo".to_string());
        Self { base_dir, pipeline_name }
    }
}
