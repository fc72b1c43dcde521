//! Synapse: a Model Context Protocol broker.
//!
//! Agents exchange typed JSON messages through a single dispatch facade that
//! maintains shared contexts with TTL expiry, threads conversations, and
//! tracks a registry of connected agents, all persisted to local SQLite.

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;
