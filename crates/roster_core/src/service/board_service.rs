//! Board use-case service.
//!
//! # Responsibility
//! - Single entry point for UI shells: names, drops and panel edits.
//! - Persist and re-render after every state change, in that order.
//!
//! # Invariants
//! - Failed or ignored operations write nothing and render nothing.
//! - An operation whose save fails leaves the in-memory board as it was.
//! - Drop targets are re-bound only when the panel set or slot layout changed.

use crate::config::BoardConfig;
use crate::error::{BoardError, BoardResult};
use crate::logging::sanitize_message;
use crate::model::location::{Location, PanelId};
use crate::repo::board_repo::{BoardRepository, RepairReport};
use crate::repo::state_store::StateStore;
use crate::service::panel_service::{
    GlobalIntervalChange, IntervalChange, PanelCreated, PanelLifecycle, RenameOutcome,
};
use crate::service::reconciler::{DropOutcome, DropReconciler};
use crate::service::render::{BoardSnapshot, RenderSink};
use crate::store::state::SchedulingState;
use log::{error, info};

const MAX_LOGGED_NAME_CHARS: usize = 40;

/// Owns one board, its persistence and its renderer.
pub struct BoardService<S: StateStore, R: RenderSink> {
    state: SchedulingState,
    repo: BoardRepository<S>,
    renderer: R,
    repair: RepairReport,
}

impl<S: StateStore, R: RenderSink> BoardService<S, R> {
    /// Loads the board, saves it back when load had to repair anything, then
    /// renders and binds drop targets.
    ///
    /// # Errors
    /// - `Storage` when the store cannot be read or the repaired board written.
    pub fn open(store: S, renderer: R, config: &BoardConfig) -> BoardResult<Self> {
        let mut repo = BoardRepository::new(store, config);
        let (state, repair) = repo.load(config)?;
        if !repair.is_clean() {
            repo.save(&state)?;
        }
        let mut service = Self {
            state,
            repo,
            renderer,
            repair,
        };
        service.refresh(true);
        Ok(service)
    }

    pub fn state(&self) -> &SchedulingState {
        &self.state
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot::capture(&self.state)
    }

    /// What `open` had to fix in the stored data.
    pub fn repair_report(&self) -> &RepairReport {
        &self.repair
    }

    pub fn store(&self) -> &S {
        self.repo.store()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn into_parts(self) -> (S, R) {
        (self.repo.into_store(), self.renderer)
    }

    /// Adds a name to the pool and returns it trimmed.
    ///
    /// # Errors
    /// - `InvalidName` for blank input.
    /// - `DuplicateName` when the name is already on the board.
    pub fn add_name(&mut self, raw: &str) -> BoardResult<String> {
        self.transact(
            |state| {
                let name = raw.trim();
                if name.is_empty() {
                    return Err(BoardError::InvalidName);
                }
                if state.contains_name(name) {
                    return Err(BoardError::DuplicateName(name.to_string()));
                }
                state.pool.push(name);
                if state.color_names {
                    state.palette.assign(name);
                }
                info!(
                    "event=name_add module=board status=ok name={}",
                    sanitize_message(name, MAX_LOGGED_NAME_CHARS)
                );
                Ok(name.to_string())
            },
            |_| Some(false),
        )
    }

    /// Removes a name from wherever it is. Returns `false` when it was not on
    /// the board.
    pub fn remove_name(&mut self, name: &str) -> BoardResult<bool> {
        self.transact(
            |state| {
                let Some(location) = state.locate(name) else {
                    return Ok(false);
                };
                state.take_from(name, &location)?;
                state.palette.release(name);
                info!("event=name_remove module=board status=ok location={location}");
                Ok(true)
            },
            |removed| removed.then_some(false),
        )
    }

    /// Applies one drag-and-drop gesture.
    pub fn drop_name(
        &mut self,
        name: &str,
        source: &Location,
        target: &Location,
    ) -> BoardResult<DropOutcome> {
        self.transact(
            |state| DropReconciler::new(state).apply(name, source, target),
            |outcome| outcome.changed_state().then_some(false),
        )
    }

    /// Applies a drop given the UI container ids (`names`, `trash`,
    /// `panel-N`, `panel-N-S`).
    pub fn drop_by_ids(
        &mut self,
        name: &str,
        source_id: &str,
        target_id: &str,
    ) -> BoardResult<DropOutcome> {
        self.transact(
            |state| DropReconciler::new(state).apply_container_ids(name, source_id, target_id),
            |outcome| outcome.changed_state().then_some(false),
        )
    }

    pub fn create_panel(
        &mut self,
        display_name: &str,
        interval: Option<i64>,
    ) -> BoardResult<PanelCreated> {
        self.transact(
            |state| PanelLifecycle::new(state).create_panel(display_name, interval),
            |_| Some(true),
        )
    }

    /// Deletes a panel; its names go back to the pool and are returned.
    pub fn delete_panel(&mut self, id: PanelId) -> BoardResult<Vec<String>> {
        self.transact(
            |state| PanelLifecycle::new(state).delete_panel(id),
            |_| Some(true),
        )
    }

    pub fn rename_panel(&mut self, id: PanelId, new_name: &str) -> BoardResult<RenameOutcome> {
        self.transact(
            |state| PanelLifecycle::new(state).rename_panel(id, new_name),
            |outcome| (*outcome == RenameOutcome::Renamed).then_some(false),
        )
    }

    pub fn set_interval(&mut self, id: PanelId, minutes: i64) -> BoardResult<IntervalChange> {
        self.transact(
            |state| PanelLifecycle::new(state).set_interval(id, minutes),
            |_| Some(true),
        )
    }

    pub fn set_global_interval(&mut self, minutes: i64) -> BoardResult<GlobalIntervalChange> {
        self.transact(
            |state| Ok(PanelLifecycle::new(state).set_global_interval(minutes)),
            |_| Some(true),
        )
    }

    /// Runs `op` against the board, then persists and re-renders.
    ///
    /// `persist` decides from the result whether anything changed:
    /// `None` skips the save, `Some(layout_changed)` saves and re-renders.
    /// When `op` or the save fails the board is restored to its prior state.
    fn transact<T>(
        &mut self,
        op: impl FnOnce(&mut SchedulingState) -> BoardResult<T>,
        persist: impl FnOnce(&T) -> Option<bool>,
    ) -> BoardResult<T> {
        let before = self.state.clone();
        let value = match op(&mut self.state) {
            Ok(value) => value,
            Err(err) => {
                self.state = before;
                return Err(err);
            }
        };
        let Some(layout_changed) = persist(&value) else {
            return Ok(value);
        };
        if let Err(err) = self.repo.save(&self.state) {
            error!("event=board_save module=board status=error error={err}");
            self.state = before;
            return Err(err.into());
        }
        self.refresh(layout_changed);
        Ok(value)
    }

    fn refresh(&mut self, layout_changed: bool) {
        let snapshot = BoardSnapshot::capture(&self.state);
        self.renderer.render(&snapshot);
        if layout_changed {
            self.renderer.rebind_drop_targets(&snapshot.panels);
        }
    }
}
