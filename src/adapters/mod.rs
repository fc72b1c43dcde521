//! Adapters: persistence and transport implementations behind the domain ports.

pub mod sqlite;
pub mod stdio;
