//! Drivers concretos.

pub mod property_override;
