//! Owned aggregate of every board store.
//!
//! # Responsibility
//! - Own pool, category lists, time grids, live panels and name colors.
//! - Answer cross-store questions: where a name is, whether a location exists.
//!
//! # Invariants
//! - A name lives in at most one location across all stores.
//! - Grid rows and categories exist only for live panels once load repair ran.
//! - `next_panel_id` is greater than every live panel id.

use crate::error::{BoardError, BoardResult};
use crate::model::location::{Location, PanelId};
use crate::model::palette::NamePalette;
use crate::model::panel::{Panel, DEFAULT_INTERVAL_MINUTES};
use crate::store::assignments::AssignmentStore;
use crate::store::pool::EntityPool;
use crate::store::time_grid::TimeGrid;
use std::collections::{BTreeMap, HashSet};

/// Single owned board state passed explicitly to services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulingState {
    pub(crate) pool: EntityPool,
    pub(crate) categories: AssignmentStore,
    pub(crate) grid: TimeGrid,
    pub(crate) panels: BTreeMap<PanelId, Panel>,
    pub(crate) next_panel_id: u32,
    pub(crate) global_interval_minutes: u32,
    pub(crate) palette: NamePalette,
    pub(crate) color_names: bool,
}

impl Default for SchedulingState {
    fn default() -> Self {
        Self {
            pool: EntityPool::new(),
            categories: AssignmentStore::new(),
            grid: TimeGrid::new(),
            panels: BTreeMap::new(),
            next_panel_id: 1,
            global_interval_minutes: DEFAULT_INTERVAL_MINUTES,
            palette: NamePalette::new(),
            color_names: true,
        }
    }
}

impl SchedulingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pool(&self) -> &EntityPool {
        &self.pool
    }

    pub fn categories(&self) -> &AssignmentStore {
        &self.categories
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    pub fn palette(&self) -> &NamePalette {
        &self.palette
    }

    pub fn panel(&self, id: PanelId) -> Option<&Panel> {
        self.panels.get(&id)
    }

    /// Live panels in id order.
    pub fn panels(&self) -> impl Iterator<Item = &Panel> {
        self.panels.values()
    }

    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    pub fn next_panel_id(&self) -> u32 {
        self.next_panel_id
    }

    pub fn global_interval_minutes(&self) -> u32 {
        self.global_interval_minutes
    }

    pub fn color_names(&self) -> bool {
        self.color_names
    }

    /// Live panel whose display name matches case-insensitively.
    pub fn panel_named(&self, display_name: &str) -> Option<&Panel> {
        self.panels.values().find(|panel| {
            crate::model::panel::display_names_match(&panel.display_name, display_name)
        })
    }

    /// Where `name` currently lives. Grid slots win over categories over pool.
    pub fn locate(&self, name: &str) -> Option<Location> {
        if let Some((panel, index)) = self.grid.find(name) {
            return Some(Location::Slot { panel, index });
        }
        if let Some(panel) = self.categories.find(name) {
            return Some(Location::Category(panel));
        }
        self.pool.contains(name).then_some(Location::Pool)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.locate(name).is_some()
    }

    /// Every location holding `name`; more than one entry means the board is inconsistent.
    pub fn occurrences(&self, name: &str) -> Vec<Location> {
        let mut found = Vec::new();
        for (panel, row) in self.grid.iter() {
            for (index, slot) in row.iter().enumerate() {
                if slot.as_deref() == Some(name) {
                    found.push(Location::Slot { panel, index });
                }
            }
        }
        for (panel, list) in self.categories.iter() {
            found.extend(
                list.iter()
                    .filter(|current| current.as_str() == name)
                    .map(|_| Location::Category(panel)),
            );
        }
        found.extend(
            self.pool
                .list()
                .iter()
                .filter(|current| current.as_str() == name)
                .map(|_| Location::Pool),
        );
        found
    }

    /// Every placed name: grid slots (panel, slot order), categories, then pool.
    pub fn all_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for (_, row) in self.grid.iter() {
            names.extend(row.iter().flatten().cloned());
        }
        for (_, list) in self.categories.iter() {
            names.extend(list.iter().cloned());
        }
        names.extend(self.pool.list().iter().cloned());
        names
    }

    /// Checks that a location can be read from or written to.
    ///
    /// # Errors
    /// - `PanelNotFound` when a category/slot names a missing panel.
    /// - `SlotOutOfRange` when a slot index is past the panel's slot count.
    pub fn validate_location(&self, location: &Location) -> BoardResult<()> {
        match location {
            Location::Pool | Location::Trash => Ok(()),
            Location::Category(panel) => self.require_panel(*panel).map(|_| ()),
            Location::Slot { panel, index } => {
                let slot_count = self.require_panel(*panel)?.slot_count();
                if *index >= slot_count {
                    return Err(BoardError::SlotOutOfRange {
                        panel: *panel,
                        index: *index,
                        slot_count,
                    });
                }
                Ok(())
            }
        }
    }

    /// Whether `name` is currently at `location`.
    pub fn is_at(&self, name: &str, location: &Location) -> bool {
        match location {
            Location::Pool => self.pool.contains(name),
            Location::Category(panel) => self.categories.contains(*panel, name),
            Location::Slot { panel, index } => self.grid.get(*panel, *index) == Some(name),
            Location::Trash => false,
        }
    }

    pub(crate) fn require_panel(&self, id: PanelId) -> BoardResult<&Panel> {
        self.panels.get(&id).ok_or(BoardError::PanelNotFound(id))
    }

    /// Removes `name` from one location. Returns whether it was there.
    pub(crate) fn take_from(&mut self, name: &str, location: &Location) -> BoardResult<bool> {
        let removed = match location {
            Location::Pool => self.pool.remove(name),
            Location::Category(panel) => self.categories.remove_from(*panel, name),
            Location::Slot { panel, index } => {
                if self.grid.get(*panel, *index) == Some(name) {
                    self.grid.clear(*panel, *index)?.is_some()
                } else {
                    false
                }
            }
            Location::Trash => false,
        };
        Ok(removed)
    }

    /// Appends every name to the pool, skipping ones already placed elsewhere.
    pub(crate) fn return_to_pool(&mut self, names: impl IntoIterator<Item = String>) -> Vec<String> {
        let mut returned = Vec::new();
        for name in names {
            if self.contains_name(&name) {
                continue;
            }
            self.pool.push(name.clone());
            returned.push(name);
        }
        returned
    }

    /// Removes later duplicates so each name keeps exactly one location.
    ///
    /// Precedence follows `all_names`: grid, then categories, then pool.
    /// Returns the duplicate names that were dropped.
    pub(crate) fn dedupe_placements(&mut self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut dropped = Vec::new();

        self.grid.retain_names(|_, _, name| {
            let keep = seen.insert(name.clone());
            if !keep {
                dropped.push(name.clone());
            }
            keep
        });
        self.categories.retain_names(|_, name| {
            let keep = seen.insert(name.clone());
            if !keep {
                dropped.push(name.clone());
            }
            keep
        });
        self.pool.retain(|name| {
            let keep = seen.insert(name.clone());
            if !keep {
                dropped.push(name.clone());
            }
            keep
        });
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::SchedulingState;
    use crate::model::location::{Location, PanelId};
    use crate::model::panel::Panel;

    fn state_with_panel() -> (SchedulingState, PanelId) {
        let mut state = SchedulingState::new();
        let id = PanelId::new(1);
        state.panels.insert(id, Panel::new(id, "Morning", 60));
        state.grid.create_panel_grid(id, 24);
        state.categories.create_category(id);
        state.next_panel_id = 2;
        (state, id)
    }

    #[test]
    fn locate_prefers_grid_then_category_then_pool() {
        let (mut state, id) = state_with_panel();
        state.pool.push("Alice");
        assert_eq!(state.locate("Alice"), Some(Location::Pool));

        state.categories.add_to(id, "Bob");
        assert_eq!(state.locate("Bob"), Some(Location::Category(id)));

        state.grid.set(id, 4, "Carol").unwrap();
        assert_eq!(state.locate("Carol"), Some(Location::slot(id, 4)));
        assert_eq!(state.locate("Dan"), None);
    }

    #[test]
    fn validate_location_checks_panel_and_slot_bounds() {
        let (state, id) = state_with_panel();
        assert!(state.validate_location(&Location::slot(id, 23)).is_ok());
        assert!(state.validate_location(&Location::slot(id, 24)).is_err());
        assert!(state
            .validate_location(&Location::Category(PanelId::new(5)))
            .is_err());
    }

    #[test]
    fn dedupe_keeps_first_placement() {
        let (mut state, id) = state_with_panel();
        state.grid.set(id, 0, "Alice").unwrap();
        state.categories.add_to(id, "Alice");
        state.pool.push("Alice");
        state.pool.push("Bob");
        state.pool.push("Bob");

        let dropped = state.dedupe_placements();
        assert_eq!(dropped, vec!["Alice", "Alice", "Bob"]);
        assert_eq!(state.occurrences("Alice"), vec![Location::slot(id, 0)]);
        assert_eq!(state.occurrences("Bob"), vec![Location::Pool]);
    }
}
