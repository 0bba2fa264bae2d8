//! Roster board domain model.
//!
//! # Responsibility
//! - Define typed locations, panels and name colors shared by stores and services.
//!
//! # Invariants
//! - Locations are typed values; string container ids exist only at the edges.
//! - Panel intervals are always clamped into the supported range.

pub mod location;
pub mod palette;
pub mod panel;
