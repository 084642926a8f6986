//! Protocolo de lanzamiento de un nodo individual.

pub mod core;

pub use core::Launcher;
