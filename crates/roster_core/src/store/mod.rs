//! In-memory board stores.
//!
//! # Responsibility
//! - Keep pool, category and grid collections with narrow, total operations.
//! - Aggregate them into one owned `SchedulingState`.
//!
//! # Invariants
//! - Stores never drop a name silently; displaced names are returned to callers.

pub mod assignments;
pub mod pool;
pub mod state;
pub mod time_grid;
