//! Board snapshot persistence over a [`StateStore`].
//!
//! # Responsibility
//! - Map `SchedulingState` to the browser-compatible `scheduleApp*` keys.
//! - Repair whatever was loaded so every board invariant holds afterwards.
//!
//! # Invariants
//! - `save` writes every key in one batch; a failed save leaves the store untouched.
//! - `load` never fails on bad data, only on store I/O. Corrupt values are
//!   treated as absent and reported in [`RepairReport`].
//! - Loaded names are never lost: data that cannot be placed goes to the pool.

use crate::config::BoardConfig;
use crate::logging::sanitize_message;
use crate::model::location::PanelId;
use crate::model::palette::NamePalette;
use crate::model::panel::{clamp_interval, display_names_match, Panel};
use crate::repo::state_store::{StateStore, StorageResult};
use crate::service::panel_service::{PanelLifecycle, StaleCleanup};
use crate::store::pool::EntityPool;
use crate::store::state::SchedulingState;
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

const MAX_LOGGED_KEY_CHARS: usize = 60;

/// Fully qualified storage keys for one prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub names: String,
    pub assignments: String,
    pub grid: String,
    pub panel_counter: String,
    pub panel_names: String,
    pub panel_intervals: String,
    pub global_interval: String,
    pub name_colors: String,
    pub used_color_count: String,
}

impl StorageKeys {
    pub fn with_prefix(prefix: &str) -> Self {
        let key = |suffix: &str| format!("{prefix}{suffix}");
        Self {
            names: key("Names"),
            assignments: key("Assignments"),
            grid: key("HourlyAssignments"),
            panel_counter: key("CustomPanelCounter"),
            panel_names: key("PanelNames"),
            panel_intervals: key("PanelTimeIntervals"),
            global_interval: key("GlobalTimeInterval"),
            name_colors: key("NameColorMap"),
            used_color_count: key("UsedColorCount"),
        }
    }
}

/// One persisted grid row.
///
/// Current data is a dense array indexed by slot. Older data stored a sparse
/// object keyed by minute offset from midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GridRow {
    Dense(Vec<Option<String>>),
    Sparse(BTreeMap<String, Option<String>>),
}

/// Everything `load` had to fix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Keys whose stored value was not valid JSON of the expected shape.
    pub corrupt_keys: Vec<String>,
    /// Panel keys inside stored objects that are not `panel-<n>`.
    pub ignored_keys: Vec<String>,
    pub stale: StaleCleanup,
    /// Extra copies removed so each name has one location.
    pub dropped_duplicates: Vec<String>,
    /// Names that could not be placed where stored and went to the pool.
    pub rescued_names: Vec<String>,
    /// Panels whose display name was missing or clashed and was replaced.
    pub renamed_panels: Vec<PanelId>,
    /// Names that had no color yet and got one.
    pub colored_names: Vec<String>,
}

impl RepairReport {
    pub fn is_clean(&self) -> bool {
        self.corrupt_keys.is_empty()
            && self.ignored_keys.is_empty()
            && self.stale.is_clean()
            && self.dropped_duplicates.is_empty()
            && self.rescued_names.is_empty()
            && self.renamed_panels.is_empty()
            && self.colored_names.is_empty()
    }
}

/// Loads and saves whole boards.
pub struct BoardRepository<S: StateStore> {
    store: S,
    keys: StorageKeys,
}

impl<S: StateStore> BoardRepository<S> {
    pub fn new(store: S, config: &BoardConfig) -> Self {
        Self {
            store,
            keys: StorageKeys::with_prefix(&config.storage_key_prefix),
        }
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Reads every key and rebuilds a consistent board.
    ///
    /// # Errors
    /// - Store read failures only.
    pub fn load(&self, config: &BoardConfig) -> StorageResult<(SchedulingState, RepairReport)> {
        let mut report = RepairReport::default();
        let keys = &self.keys;

        let names: Vec<String> = self.read_json(&keys.names, &mut report)?.unwrap_or_default();
        let assignments: BTreeMap<String, Vec<String>> = self
            .read_json(&keys.assignments, &mut report)?
            .unwrap_or_default();
        let grid: BTreeMap<String, GridRow> =
            self.read_json(&keys.grid, &mut report)?.unwrap_or_default();
        let panel_names: BTreeMap<String, String> = self
            .read_json(&keys.panel_names, &mut report)?
            .unwrap_or_default();
        let panel_intervals: BTreeMap<String, i64> = self
            .read_json(&keys.panel_intervals, &mut report)?
            .unwrap_or_default();
        let name_colors: BTreeMap<String, String> = self
            .read_json(&keys.name_colors, &mut report)?
            .unwrap_or_default();
        let saved_counter: Option<u32> = self.read_number(&keys.panel_counter, &mut report)?;
        let saved_global: Option<i64> = self.read_number(&keys.global_interval, &mut report)?;

        let mut state = SchedulingState::new();
        state.color_names = config.color_names;
        state.global_interval_minutes = match saved_global {
            Some(minutes) => clamp_interval(minutes).0,
            None => config.default_interval(),
        };
        state.pool = EntityPool::from_names(
            names
                .into_iter()
                .filter(|name| !name.trim().is_empty())
                .collect(),
        );

        let mut orphaned = Vec::new();

        // Live panels: every named panel plus every panel that has a grid row.
        let mut live = BTreeSet::new();
        for key in panel_names.keys().chain(grid.keys()) {
            match PanelId::parse_storage_key(key) {
                Some(id) => {
                    live.insert(id);
                }
                None => note_ignored_key(&mut report, key),
            }
        }
        for key in assignments.keys().chain(panel_intervals.keys()) {
            if PanelId::parse_storage_key(key).is_none() {
                note_ignored_key(&mut report, key);
            }
        }

        for id in &live {
            let key = id.storage_key();
            let interval = match panel_intervals.get(&key) {
                Some(minutes) => clamp_interval(*minutes).0,
                None => state.global_interval_minutes,
            };
            let display_name = panel_names
                .get(&key)
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| {
                    report.renamed_panels.push(*id);
                    Panel::default_display_name(*id)
                });
            state.panels.insert(*id, Panel::new(*id, display_name, interval));
        }

        for (key, row) in grid {
            let Some(id) = PanelId::parse_storage_key(&key) else {
                orphaned.extend(row_names(row));
                continue;
            };
            let Some(panel) = state.panels.get(&id) else {
                continue;
            };
            let dense = match row {
                GridRow::Dense(slots) => slots,
                GridRow::Sparse(by_minute) => densify(panel, by_minute, &mut orphaned),
            };
            state.grid.restore_row(id, dense);
        }

        for (key, list) in assignments {
            match PanelId::parse_storage_key(&key) {
                Some(id) => state.categories.restore_list(id, list),
                None => orphaned.extend(list),
            }
        }

        if let Some(saved) = saved_counter {
            state.next_panel_id = state.next_panel_id.max(saved);
        }

        report.stale = PanelLifecycle::new(&mut state).reconcile_stale_panels();
        report.dropped_duplicates = state.dedupe_placements();
        report.rescued_names = state.return_to_pool(orphaned);
        dedupe_panel_names(&mut state, &mut report);

        if state.color_names {
            let mut palette = NamePalette::from_assignments(name_colors);
            let placed = state.all_names().into_iter().collect::<BTreeSet<_>>();
            palette.retain(|name| placed.contains(name));
            for name in &placed {
                if palette.color_of(name).is_none() {
                    palette.assign(name);
                    report.colored_names.push(name.clone());
                }
            }
            state.palette = palette;
        }

        info!(
            "event=board_load module=repo status=ok panels={} names={} repaired={}",
            state.panels.len(),
            state.all_names().len(),
            !report.is_clean()
        );
        Ok((state, report))
    }

    /// Writes the full board under every key as one batch.
    ///
    /// # Errors
    /// - Store write or JSON encode failures; nothing is written in either case.
    pub fn save(&mut self, state: &SchedulingState) -> StorageResult<()> {
        let assignments = state
            .categories
            .iter()
            .map(|(id, list)| (id.storage_key(), list.to_vec()))
            .collect::<BTreeMap<_, _>>();
        let grid = state
            .grid
            .iter()
            .map(|(id, row)| (id.storage_key(), GridRow::Dense(row.to_vec())))
            .collect::<BTreeMap<_, _>>();
        let panel_names = state
            .panels
            .values()
            .map(|panel| (panel.id.storage_key(), panel.display_name.clone()))
            .collect::<BTreeMap<_, _>>();
        let panel_intervals = state
            .panels
            .values()
            .map(|panel| (panel.id.storage_key(), panel.interval_minutes))
            .collect::<BTreeMap<_, _>>();

        let entries = [
            (
                self.keys.names.as_str(),
                serde_json::to_string(state.pool.list())?,
            ),
            (
                self.keys.assignments.as_str(),
                serde_json::to_string(&assignments)?,
            ),
            (self.keys.grid.as_str(), serde_json::to_string(&grid)?),
            (
                self.keys.panel_counter.as_str(),
                state.next_panel_id.to_string(),
            ),
            (
                self.keys.panel_names.as_str(),
                serde_json::to_string(&panel_names)?,
            ),
            (
                self.keys.panel_intervals.as_str(),
                serde_json::to_string(&panel_intervals)?,
            ),
            (
                self.keys.global_interval.as_str(),
                state.global_interval_minutes.to_string(),
            ),
            (
                self.keys.name_colors.as_str(),
                serde_json::to_string(state.palette.assignments())?,
            ),
            (
                self.keys.used_color_count.as_str(),
                serde_json::to_string(state.palette.use_counts())?,
            ),
        ];
        self.store.set_all(&entries)?;
        info!(
            "event=board_save module=repo status=ok panels={} names={}",
            state.panels.len(),
            state.all_names().len()
        );
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(
        &self,
        key: &str,
        report: &mut RepairReport,
    ) -> StorageResult<Option<T>> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!("event=board_load module=repo status=skip reason=corrupt_value key={key} error={err}");
                report.corrupt_keys.push(key.to_string());
                Ok(None)
            }
        }
    }

    fn read_number<T: std::str::FromStr>(
        &self,
        key: &str,
        report: &mut RepairReport,
    ) -> StorageResult<Option<T>> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };
        match raw.trim().parse() {
            Ok(value) => Ok(Some(value)),
            Err(_) => {
                warn!("event=board_load module=repo status=skip reason=corrupt_value key={key}");
                report.corrupt_keys.push(key.to_string());
                Ok(None)
            }
        }
    }
}

fn note_ignored_key(report: &mut RepairReport, key: &str) {
    if report.ignored_keys.iter().any(|known| known == key) {
        return;
    }
    warn!(
        "event=board_load module=repo status=skip reason=unparseable_panel_key key={}",
        sanitize_message(key, MAX_LOGGED_KEY_CHARS)
    );
    report.ignored_keys.push(key.to_string());
}

fn row_names(row: GridRow) -> Vec<String> {
    match row {
        GridRow::Dense(slots) => slots.into_iter().flatten().collect(),
        GridRow::Sparse(by_minute) => by_minute.into_values().flatten().collect(),
    }
}

/// Maps a minute-offset row onto slot indexes; entries that do not fit are orphaned.
fn densify(
    panel: &Panel,
    by_minute: BTreeMap<String, Option<String>>,
    orphaned: &mut Vec<String>,
) -> Vec<Option<String>> {
    let mut slots = vec![None; panel.slot_count()];
    let mut entries = by_minute
        .into_iter()
        .filter_map(|(offset, name)| Some((offset.trim().parse::<u32>().ok(), name?)))
        .collect::<Vec<_>>();
    // Numeric order; offsets that do not parse sort last.
    entries.sort_by_key(|(minutes, _)| minutes.unwrap_or(u32::MAX));
    for (minutes, name) in entries {
        let index = minutes.and_then(|minutes| panel.slot_for_minute(minutes));
        match index.and_then(|index| slots.get_mut(index)) {
            Some(slot @ None) => *slot = Some(name),
            _ => orphaned.push(name),
        }
    }
    slots
}

/// Renames later panels whose display name clashes with an earlier one.
fn dedupe_panel_names(state: &mut SchedulingState, report: &mut RepairReport) {
    let mut taken: Vec<String> = Vec::new();
    for panel in state.panels.values_mut() {
        let clashes = |candidate: &str, taken: &[String]| {
            taken.iter().any(|name| display_names_match(name, candidate))
        };
        if clashes(&panel.display_name, &taken) {
            let base = panel.display_name.clone();
            let mut suffix = 2;
            let mut candidate = format!("{base} ({suffix})");
            while clashes(&candidate, &taken) {
                suffix += 1;
                candidate = format!("{base} ({suffix})");
            }
            warn!(
                "event=board_load module=repo status=skip reason=duplicate_panel_name panel={}",
                panel.id
            );
            panel.display_name = candidate;
            if !report.renamed_panels.contains(&panel.id) {
                report.renamed_panels.push(panel.id);
            }
        }
        taken.push(panel.display_name.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::{BoardRepository, GridRow, StorageKeys};
    use crate::config::BoardConfig;
    use crate::model::location::{Location, PanelId};
    use crate::repo::state_store::MemoryStateStore;

    #[test]
    fn keys_follow_prefix() {
        let keys = StorageKeys::with_prefix("scheduleApp");
        assert_eq!(keys.grid, "scheduleAppHourlyAssignments");
        assert_eq!(keys.panel_counter, "scheduleAppCustomPanelCounter");
        assert_eq!(StorageKeys::with_prefix("x").names, "xNames");
    }

    #[test]
    fn grid_row_accepts_dense_and_sparse_shapes() {
        let dense: GridRow = serde_json::from_str(r#"[null, "Alice"]"#).unwrap();
        assert!(matches!(dense, GridRow::Dense(ref slots) if slots.len() == 2));
        let sparse: GridRow = serde_json::from_str(r#"{"540": "Bob"}"#).unwrap();
        assert!(matches!(sparse, GridRow::Sparse(_)));
    }

    #[test]
    fn sparse_rows_map_minute_offsets_to_slots() {
        let store = MemoryStateStore::with_entries([
            ("scheduleAppPanelNames", r#"{"panel-1": "Day"}"#),
            ("scheduleAppPanelTimeIntervals", r#"{"panel-1": 30}"#),
            (
                "scheduleAppHourlyAssignments",
                r#"{"panel-1": {"540": "Bob", "545": "Carol", "2000": "Dan"}}"#,
            ),
        ]);
        let config = BoardConfig::default();
        let (state, report) = BoardRepository::new(store, &config).load(&config).unwrap();
        let id = PanelId::new(1);
        assert_eq!(state.locate("Bob"), Some(Location::slot(id, 18)));
        assert_eq!(state.locate("Carol"), Some(Location::Pool));
        assert_eq!(state.locate("Dan"), Some(Location::Pool));
        assert_eq!(report.rescued_names, vec!["Carol", "Dan"]);
    }

    #[test]
    fn empty_store_loads_empty_board() {
        let config = BoardConfig::default();
        let (state, report) = BoardRepository::new(MemoryStateStore::new(), &config)
            .load(&config)
            .unwrap();
        assert!(report.is_clean());
        assert_eq!(state.panel_count(), 0);
        assert_eq!(state.next_panel_id(), 1);
        assert_eq!(state.global_interval_minutes(), 60);
    }
}
