//! Storage Layer
//!
//! Durable persistence for snapshots, invocation audit trails and derived
//! results, backed by SQLite.

pub mod database;

pub use database::*;
