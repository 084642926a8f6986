//! Constantes del núcleo de lanzamiento.
//!
//! Este módulo agrupa valores estáticos que participan en el cálculo de
//! fingerprints de cache y en el etiquetado de resultados publicados.
//! Cambiar `LAUNCHER_VERSION` invalida las entradas de cache existentes.

/// Versión lógica del launcher. Se incluye en el fingerprint de cache para
/// que un cambio incompatible del protocolo invalide determinísticamente los
/// resultados previos, y se anota en el `ExecutorResult` de toda ejecución
/// publicada como exitosa. Mantener estable mientras no haya cambios
/// incompatibles.
pub const LAUNCHER_VERSION: &str = "L1.0";

/// Clave bajo la que se anota la versión del launcher en el resultado del
/// executor al publicar (paso de publicación del protocolo).
pub const VERSION_ANNOTATION_KEY: &str = "launcher_version";
