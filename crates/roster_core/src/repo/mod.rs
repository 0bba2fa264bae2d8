//! Persistence contracts and board snapshot mapping.
//!
//! # Responsibility
//! - Define the string key-value contract the board persists through.
//! - Map the in-memory board to and from the stored keys.
//!
//! # Invariants
//! - Only `BoardRepository` knows storage key names and payload shapes.
//! - SQLite details stay inside `state_store`.

pub mod board_repo;
pub mod state_store;
