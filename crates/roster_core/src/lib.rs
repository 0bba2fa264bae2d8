//! Core of the roster board: a pool of names, per-panel categories and
//! time-slot grids, moved around by drag-and-drop.
//! This crate owns every board invariant; shells only render snapshots.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use config::BoardConfig;
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use error::{BoardError, BoardResult};
pub use logging::{
    init_logging, log_board_settings, logging_status, LogLevel, LogTarget, LoggingError,
};
pub use model::location::{Location, LocationParseError, PanelId};
pub use model::palette::{text_color_for, NamePalette, NAME_COLORS};
pub use model::panel::{IntervalNotice, Panel};
pub use repo::board_repo::{BoardRepository, RepairReport, StorageKeys};
pub use repo::state_store::{
    MemoryStateStore, SqliteStateStore, StateStore, StorageError, StorageResult,
};
pub use service::board_service::BoardService;
pub use service::panel_service::{
    GlobalIntervalChange, IntervalChange, PanelCreated, PanelLifecycle, RenameOutcome,
    StaleCleanup,
};
pub use service::reconciler::{DropOutcome, DropReconciler, IgnoreReason};
pub use service::render::{
    BoardSnapshot, NameChip, NoopRenderSink, PanelView, RenderSink, SlotView,
};
pub use store::state::SchedulingState;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
