//! Board use-case services.
//!
//! # Responsibility
//! - `DropReconciler` and `PanelLifecycle` are the only writers of board state.
//! - `BoardService` sequences mutate, persist, render for callers.
//!
//! # Invariants
//! - Rendering collaborators only ever see owned snapshots.

pub mod board_service;
pub mod panel_service;
pub mod reconciler;
pub mod render;
