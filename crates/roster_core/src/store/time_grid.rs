//! Per-panel time grids.
//!
//! # Responsibility
//! - Hold one optional name per (panel, slot) cell.
//! - Report every displaced occupant instead of dropping it.
//!
//! # Invariants
//! - A slot holds zero or one name.
//! - `set` and `clear` return the previous occupant; callers relocate it.
//! - `resize` keeps indices below the new length unchanged.

use crate::model::location::PanelId;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Grid addressing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// No grid exists for the panel.
    MissingPanel(PanelId),
    /// Slot index is past the end of the panel's grid.
    IndexOutOfRange {
        panel: PanelId,
        index: usize,
        slot_count: usize,
    },
}

impl Display for GridError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingPanel(panel) => write!(f, "no time grid for {panel}"),
            Self::IndexOutOfRange {
                panel,
                index,
                slot_count,
            } => write!(
                f,
                "slot {index} is out of range for {panel} ({slot_count} slots)"
            ),
        }
    }
}

impl Error for GridError {}

/// Panel-keyed slot rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeGrid {
    rows: BTreeMap<PanelId, Vec<Option<String>>>,
}

impl TimeGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty row of `slot_count` slots. Existing rows are kept.
    pub fn create_panel_grid(&mut self, panel: PanelId, slot_count: usize) {
        self.rows
            .entry(panel)
            .or_insert_with(|| vec![None; slot_count]);
    }

    /// Removes a panel's row and returns the occupied `(index, name)` pairs.
    pub fn delete_panel_grid(&mut self, panel: PanelId) -> Vec<(usize, String)> {
        self.rows
            .remove(&panel)
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.map(|name| (index, name)))
            .collect()
    }

    pub fn has_panel(&self, panel: PanelId) -> bool {
        self.rows.contains_key(&panel)
    }

    pub fn slot_count(&self, panel: PanelId) -> Option<usize> {
        self.rows.get(&panel).map(Vec::len)
    }

    /// Occupant of a slot; `None` for empty or unknown slots.
    pub fn get(&self, panel: PanelId, index: usize) -> Option<&str> {
        self.rows
            .get(&panel)
            .and_then(|row| row.get(index))
            .and_then(|slot| slot.as_deref())
    }

    /// Writes `name` into a slot and returns the previous occupant.
    ///
    /// # Errors
    /// - `MissingPanel` / `IndexOutOfRange` when the slot does not exist.
    pub fn set(
        &mut self,
        panel: PanelId,
        index: usize,
        name: impl Into<String>,
    ) -> Result<Option<String>, GridError> {
        let slot = self.slot_mut(panel, index)?;
        Ok(slot.replace(name.into()))
    }

    /// Empties a slot and returns the previous occupant.
    pub fn clear(&mut self, panel: PanelId, index: usize) -> Result<Option<String>, GridError> {
        let slot = self.slot_mut(panel, index)?;
        Ok(slot.take())
    }

    /// Changes a row's length. Returns names from slots at `index >= new_slot_count`,
    /// in index order; the caller must relocate them.
    pub fn resize(&mut self, panel: PanelId, new_slot_count: usize) -> Vec<String> {
        let row = self.rows.entry(panel).or_default();
        let displaced = if row.len() > new_slot_count {
            row.split_off(new_slot_count)
                .into_iter()
                .flatten()
                .collect()
        } else {
            Vec::new()
        };
        row.resize(new_slot_count, None);
        displaced
    }

    /// First slot holding `name`, if any.
    pub fn find(&self, name: &str) -> Option<(PanelId, usize)> {
        self.rows.iter().find_map(|(panel, row)| {
            row.iter()
                .position(|slot| slot.as_deref() == Some(name))
                .map(|index| (*panel, index))
        })
    }

    pub fn row(&self, panel: PanelId) -> Option<&[Option<String>]> {
        self.rows.get(&panel).map(Vec::as_slice)
    }

    pub fn panel_ids(&self) -> Vec<PanelId> {
        self.rows.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PanelId, &[Option<String>])> {
        self.rows.iter().map(|(panel, row)| (*panel, row.as_slice()))
    }

    /// Number of occupied slots across every panel.
    pub fn occupied_count(&self) -> usize {
        self.rows.values().flatten().filter(|slot| slot.is_some()).count()
    }

    /// Replaces a row wholesale; used when restoring persisted state.
    pub(crate) fn restore_row(&mut self, panel: PanelId, row: Vec<Option<String>>) {
        self.rows.insert(panel, row);
    }

    /// Clears slots for which `keep` returns false.
    pub(crate) fn retain_names(&mut self, mut keep: impl FnMut(PanelId, usize, &String) -> bool) {
        for (panel, row) in self.rows.iter_mut() {
            for (index, slot) in row.iter_mut().enumerate() {
                if let Some(name) = slot {
                    if !keep(*panel, index, name) {
                        *slot = None;
                    }
                }
            }
        }
    }

    fn slot_mut(&mut self, panel: PanelId, index: usize) -> Result<&mut Option<String>, GridError> {
        let row = self
            .rows
            .get_mut(&panel)
            .ok_or(GridError::MissingPanel(panel))?;
        let slot_count = row.len();
        row.get_mut(index).ok_or(GridError::IndexOutOfRange {
            panel,
            index,
            slot_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{GridError, TimeGrid};
    use crate::model::location::PanelId;

    fn grid_with_panel(slot_count: usize) -> (TimeGrid, PanelId) {
        let mut grid = TimeGrid::new();
        let panel = PanelId::new(1);
        grid.create_panel_grid(panel, slot_count);
        (grid, panel)
    }

    #[test]
    fn set_returns_previous_occupant() {
        let (mut grid, panel) = grid_with_panel(24);
        assert_eq!(grid.set(panel, 3, "Alice").unwrap(), None);
        assert_eq!(grid.set(panel, 3, "Bob").unwrap(), Some("Alice".to_string()));
        assert_eq!(grid.get(panel, 3), Some("Bob"));
        assert_eq!(grid.clear(panel, 3).unwrap(), Some("Bob".to_string()));
        assert_eq!(grid.get(panel, 3), None);
    }

    #[test]
    fn set_rejects_missing_slots() {
        let (mut grid, panel) = grid_with_panel(2);
        let err = grid.set(panel, 2, "Alice").unwrap_err();
        assert_eq!(
            err,
            GridError::IndexOutOfRange {
                panel,
                index: 2,
                slot_count: 2
            }
        );
        let err = grid.clear(PanelId::new(9), 0).unwrap_err();
        assert_eq!(err, GridError::MissingPanel(PanelId::new(9)));
    }

    #[test]
    fn resize_displaces_only_trailing_slots() {
        let (mut grid, panel) = grid_with_panel(24);
        grid.set(panel, 0, "Alice").unwrap();
        grid.set(panel, 11, "Bob").unwrap();
        grid.set(panel, 12, "Carol").unwrap();
        grid.set(panel, 23, "Dan").unwrap();

        let displaced = grid.resize(panel, 12);
        assert_eq!(displaced, vec!["Carol", "Dan"]);
        assert_eq!(grid.slot_count(panel), Some(12));
        assert_eq!(grid.get(panel, 0), Some("Alice"));
        assert_eq!(grid.get(panel, 11), Some("Bob"));

        assert!(grid.resize(panel, 144).is_empty());
        assert_eq!(grid.slot_count(panel), Some(144));
        assert_eq!(grid.get(panel, 11), Some("Bob"));
    }

    #[test]
    fn delete_panel_grid_reports_occupied_slots() {
        let (mut grid, panel) = grid_with_panel(24);
        grid.set(panel, 5, "Alice").unwrap();
        grid.set(panel, 9, "Bob").unwrap();

        let removed = grid.delete_panel_grid(panel);
        assert_eq!(
            removed,
            vec![(5, "Alice".to_string()), (9, "Bob".to_string())]
        );
        assert!(!grid.has_panel(panel));
        assert_eq!(grid.find("Alice"), None);
    }
}
