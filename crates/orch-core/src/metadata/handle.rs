//! Adquisición con scope de la conexión de metadatos.
//!
//! Disciplina del recurso compartido (un store, N launchers):
//! - Cada grupo lógico de operaciones corre dentro de un único `with(..)`.
//! - El lock se libera entre grupos, de modo que un driver externo que tenga
//!   su propio handle clonado nunca puede deadlockear contra el launcher.
//! - Un hilo jamás mantiene dos scopes abiertos a la vez (el closure recibe
//!   el guard por `&mut`, no puede re-entrar en `with`).

use std::sync::{Arc, Mutex};

use crate::errors::LaunchError;

use super::store::MetadataStore;

/// Handle clonable y compartible a un `MetadataStore`.
#[derive(Debug)]
pub struct MetadataHandle<M> {
    inner: Arc<Mutex<M>>,
}

impl<M> Clone for MetadataHandle<M> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<M: MetadataStore> MetadataHandle<M> {
    pub fn new(store: M) -> Self {
        Self { inner: Arc::new(Mutex::new(store)) }
    }

    /// Ejecuta `f` con la conexión adquirida; la libera al retornar.
    pub fn with<R>(&self, f: impl FnOnce(&mut M) -> Result<R, LaunchError>) -> Result<R, LaunchError> {
        let mut guard = self.inner
                            .lock()
                            .map_err(|_| LaunchError::Metadata("metadata connection poisoned".to_string()))?;
        f(&mut guard)
    }
}
