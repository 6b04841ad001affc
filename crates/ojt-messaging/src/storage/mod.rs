//! Storage layer
//!
//! SQLite-backed persistence: connection pool management and schema
//! migrations for the messaging tables.

pub mod database;
pub mod migrations;

pub use database::{Database, DatabaseConfig};
