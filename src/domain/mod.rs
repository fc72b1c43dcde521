//! Domain layer: pure types, errors, and port traits.

pub mod errors;
pub mod models;
pub mod ports;
