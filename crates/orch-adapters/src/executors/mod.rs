//! Executors concretos.

pub mod function;
pub mod subprocess;
