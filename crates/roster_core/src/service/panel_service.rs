//! Panel lifecycle: create, delete, rename, re-interval and stale cleanup.
//!
//! # Responsibility
//! - Own panel existence and per-panel intervals.
//! - Keep grid rows and categories in lockstep with live panels.
//!
//! # Invariants
//! - Display names are trimmed, non-empty and unique case-insensitively.
//! - Deleting a panel returns every name it held to the pool before the panel
//!   record disappears.
//! - Interval changes clamp into `[10, 720]`; names in slots past the new slot
//!   count go to the pool, lower slots keep their occupants.
//! - Panel ids are never reused.

use crate::error::{BoardError, BoardResult};
use crate::logging::sanitize_message;
use crate::model::location::PanelId;
use crate::model::panel::{clamp_interval, display_names_match, IntervalNotice, Panel};
use crate::store::state::SchedulingState;
use log::{info, warn};

const MAX_LOGGED_PANEL_CHARS: usize = 60;

/// Result of creating a panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelCreated {
    pub id: PanelId,
    /// Set when the requested interval had to be clamped.
    pub notice: Option<IntervalNotice>,
}

/// Result of renaming a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameOutcome {
    Renamed,
    /// New name equals the current one after trim.
    Unchanged,
}

/// Result of changing one panel's interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalChange {
    pub panel: PanelId,
    pub applied_minutes: u32,
    pub slot_count: usize,
    /// Set when the requested interval was out of range and got clamped.
    pub notice: Option<IntervalNotice>,
    /// Names moved to the pool because their slot no longer exists.
    pub displaced: Vec<String>,
}

/// Result of changing the board-wide interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalIntervalChange {
    pub applied_minutes: u32,
    pub notice: Option<IntervalNotice>,
    pub displaced: Vec<String>,
}

/// Findings of a stale-panel scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaleCleanup {
    /// Grid/category keys that had no live panel and were dropped.
    pub stale_panels: Vec<PanelId>,
    /// Live panels that were missing a grid row or category.
    pub created_grids: Vec<PanelId>,
    /// Live panels whose grid length disagreed with their interval.
    pub resized_panels: Vec<PanelId>,
    /// Names moved to the pool by this scan.
    pub rescued_names: Vec<String>,
}

impl StaleCleanup {
    pub fn is_clean(&self) -> bool {
        self.stale_panels.is_empty()
            && self.created_grids.is_empty()
            && self.resized_panels.is_empty()
            && self.rescued_names.is_empty()
    }
}

/// Sole writer of panel existence and intervals.
pub struct PanelLifecycle<'a> {
    state: &'a mut SchedulingState,
}

impl<'a> PanelLifecycle<'a> {
    pub fn new(state: &'a mut SchedulingState) -> Self {
        Self { state }
    }

    /// Creates a panel with an empty grid and category.
    ///
    /// `interval` defaults to the board-wide interval and is clamped.
    ///
    /// # Errors
    /// - `EmptyPanelName` for blank names.
    /// - `NameTaken` when a live panel already uses the name.
    /// - `PanelIdsExhausted` when the counter is at its ceiling.
    pub fn create_panel(
        &mut self,
        display_name: &str,
        interval: Option<i64>,
    ) -> BoardResult<PanelCreated> {
        let normalized = normalize_panel_name(display_name)?;
        if self.state.panel_named(&normalized).is_some() {
            return Err(BoardError::NameTaken(normalized));
        }

        let (interval_minutes, notice) = match interval {
            Some(requested) => clamp_interval(requested),
            None => (self.state.global_interval_minutes, None),
        };

        let raw_id = self.state.next_panel_id;
        let next_id = raw_id
            .checked_add(1)
            .ok_or(BoardError::PanelIdsExhausted)?;
        let id = PanelId::new(raw_id);
        self.state.next_panel_id = next_id;

        let panel = Panel::new(id, normalized, interval_minutes);
        self.state.grid.create_panel_grid(id, panel.slot_count());
        self.state.categories.create_category(id);
        info!(
            "event=panel_create module=panel status=ok panel={} interval={} slots={} name={}",
            id,
            panel.interval_minutes,
            panel.slot_count(),
            sanitize_message(&panel.display_name, MAX_LOGGED_PANEL_CHARS)
        );
        self.state.panels.insert(id, panel);

        Ok(PanelCreated { id, notice })
    }

    /// Deletes a panel and returns the names moved back to the pool
    /// (grid slots in index order, then the category list).
    ///
    /// # Errors
    /// - `PanelNotFound` for unknown ids.
    pub fn delete_panel(&mut self, id: PanelId) -> BoardResult<Vec<String>> {
        self.state.require_panel(id)?;

        let mut freed = self
            .state
            .grid
            .delete_panel_grid(id)
            .into_iter()
            .map(|(_, name)| name)
            .collect::<Vec<_>>();
        freed.extend(self.state.categories.delete_category(id));
        for name in &freed {
            self.state.pool.push(name.clone());
        }
        self.state.panels.remove(&id);

        info!(
            "event=panel_delete module=panel status=ok panel={} returned_names={}",
            id,
            freed.len()
        );
        Ok(freed)
    }

    /// Renames a panel.
    ///
    /// Only an exact match with the current name is `Unchanged`; a case-only
    /// change (`night` to `Night`) is a rename and gets saved.
    ///
    /// # Errors
    /// - `PanelNotFound`, `EmptyPanelName`, or `NameTaken` (another live panel).
    pub fn rename_panel(&mut self, id: PanelId, new_name: &str) -> BoardResult<RenameOutcome> {
        let current = self.state.require_panel(id)?.display_name.clone();
        let normalized = normalize_panel_name(new_name)?;
        if normalized == current {
            return Ok(RenameOutcome::Unchanged);
        }

        let taken = self
            .state
            .panels
            .values()
            .any(|panel| panel.id != id && display_names_match(&panel.display_name, &normalized));
        if taken {
            return Err(BoardError::NameTaken(normalized));
        }

        if let Some(panel) = self.state.panels.get_mut(&id) {
            panel.display_name = normalized;
        }
        info!("event=panel_rename module=panel status=ok panel={id}");
        Ok(RenameOutcome::Renamed)
    }

    /// Changes a panel's slot interval, clamping into range.
    ///
    /// # Errors
    /// - `PanelNotFound` for unknown ids.
    pub fn set_interval(&mut self, id: PanelId, minutes: i64) -> BoardResult<IntervalChange> {
        self.state.require_panel(id)?;
        let (applied, notice) = clamp_interval(minutes);
        if let Some(notice) = notice {
            warn!(
                "event=panel_interval module=panel status=clamped panel={} requested={} applied={}",
                id, notice.requested, notice.applied
            );
        }
        let (slot_count, displaced) = self.apply_interval(id, applied);
        Ok(IntervalChange {
            panel: id,
            applied_minutes: applied,
            slot_count,
            notice,
            displaced,
        })
    }

    /// Sets the board-wide interval: the default for new panels, applied to
    /// every live panel.
    pub fn set_global_interval(&mut self, minutes: i64) -> GlobalIntervalChange {
        let (applied, notice) = clamp_interval(minutes);
        self.state.global_interval_minutes = applied;

        let ids = self.state.panels.keys().copied().collect::<Vec<_>>();
        let mut displaced = Vec::new();
        for id in ids {
            displaced.extend(self.apply_interval(id, applied).1);
        }
        info!(
            "event=global_interval module=panel status=ok applied={} clamped={} displaced={}",
            applied,
            notice.is_some(),
            displaced.len()
        );
        GlobalIntervalChange {
            applied_minutes: applied,
            notice,
            displaced,
        }
    }

    /// Drops grid/category data that has no live panel and repairs live panels
    /// missing a grid row, a category, or with a mis-sized row.
    ///
    /// Names from dropped data go to the pool unless already placed elsewhere;
    /// nothing is merged into another panel.
    pub fn reconcile_stale_panels(&mut self) -> StaleCleanup {
        let mut cleanup = StaleCleanup::default();
        let mut orphaned = Vec::new();

        let mut stale = self
            .state
            .grid
            .panel_ids()
            .into_iter()
            .chain(self.state.categories.category_ids())
            .filter(|id| !self.state.panels.contains_key(id))
            .collect::<Vec<_>>();
        stale.sort();
        stale.dedup();

        for id in &stale {
            orphaned.extend(
                self.state
                    .grid
                    .delete_panel_grid(*id)
                    .into_iter()
                    .map(|(_, name)| name),
            );
            orphaned.extend(self.state.categories.delete_category(*id));
            warn!("event=stale_panel module=panel status=dropped panel={id}");
        }
        cleanup.stale_panels = stale;

        let live = self
            .state
            .panels
            .values()
            .map(|panel| (panel.id, panel.slot_count()))
            .collect::<Vec<_>>();
        for (id, slot_count) in live {
            let mut created = false;
            if !self.state.grid.has_panel(id) {
                self.state.grid.create_panel_grid(id, slot_count);
                created = true;
            }
            if !self.state.categories.has_category(id) {
                self.state.categories.create_category(id);
                created = true;
            }
            if created {
                cleanup.created_grids.push(id);
            }
            if self.state.grid.slot_count(id) != Some(slot_count) {
                orphaned.extend(self.state.grid.resize(id, slot_count));
                cleanup.resized_panels.push(id);
            }
        }

        if let Some(max_id) = self.state.panels.keys().map(|id| id.get()).max() {
            if self.state.next_panel_id <= max_id {
                self.state.next_panel_id = max_id.saturating_add(1);
            }
        }

        cleanup.rescued_names = self.state.return_to_pool(orphaned);
        if !cleanup.is_clean() {
            info!(
                "event=stale_cleanup module=panel status=ok stale={} created={} resized={} rescued={}",
                cleanup.stale_panels.len(),
                cleanup.created_grids.len(),
                cleanup.resized_panels.len(),
                cleanup.rescued_names.len()
            );
        }
        cleanup
    }

    fn apply_interval(&mut self, id: PanelId, applied: u32) -> (usize, Vec<String>) {
        let Some(panel) = self.state.panels.get_mut(&id) else {
            return (0, Vec::new());
        };
        panel.interval_minutes = applied;
        let slot_count = panel.slot_count();

        let displaced = self.state.grid.resize(id, slot_count);
        for name in &displaced {
            self.state.pool.push(name.clone());
        }
        (slot_count, displaced)
    }
}

fn normalize_panel_name(value: &str) -> BoardResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BoardError::EmptyPanelName);
    }
    Ok(trimmed.to_string())
}
