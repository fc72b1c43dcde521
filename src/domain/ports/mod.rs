//! Port traits: the seams between the service layer and its adapters.

pub mod memory_store;

pub use memory_store::MemoryStore;
