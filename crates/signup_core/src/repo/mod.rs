//! Persistence adapter: raw key-value storage plus typed collections.
//!
//! # Responsibility
//! - Define the key-value contract the desk persists through.
//! - Isolate SQLite and JSON encoding from service orchestration.
//!
//! # Invariants
//! - Collections are saved whole under fixed keys (`accounts`,
//!   `notifications`).
//! - Malformed stored data surfaces as `PersistError::Corrupt`.

pub mod collection_repo;
pub mod kv_repo;
