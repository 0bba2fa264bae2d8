//! Schedule panel model and time-interval rules.
//!
//! # Invariants
//! - `interval_minutes` always lies in `[MIN_INTERVAL_MINUTES, MAX_INTERVAL_MINUTES]`.
//! - `slot_count() == MINUTES_PER_DAY / interval_minutes` (floored).
//! - Display names are compared case-insensitively for uniqueness.

use crate::model::location::PanelId;

pub const MIN_INTERVAL_MINUTES: u32 = 10;
pub const MAX_INTERVAL_MINUTES: u32 = 720;
pub const DEFAULT_INTERVAL_MINUTES: u32 = 60;
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// An interval request outside `[10, 720]` that was clamped to the nearest bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalNotice {
    /// Value the caller asked for.
    pub requested: i64,
    /// Value actually applied.
    pub applied: u32,
}

/// Clamps a requested interval into the supported range.
///
/// Returns the applied value and, when clamping happened, an out-of-range notice
/// the UI can surface.
pub fn clamp_interval(requested: i64) -> (u32, Option<IntervalNotice>) {
    let applied = requested.clamp(
        i64::from(MIN_INTERVAL_MINUTES),
        i64::from(MAX_INTERVAL_MINUTES),
    ) as u32;
    let notice = (i64::from(applied) != requested).then_some(IntervalNotice { requested, applied });
    (applied, notice)
}

/// Number of grid slots for one day at the given interval.
pub fn slot_count_for(interval_minutes: u32) -> usize {
    let interval = interval_minutes.clamp(MIN_INTERVAL_MINUTES, MAX_INTERVAL_MINUTES);
    (MINUTES_PER_DAY / interval) as usize
}

/// Case-insensitive display-name comparison used for panel uniqueness.
pub fn display_names_match(left: &str, right: &str) -> bool {
    left.trim().to_lowercase() == right.trim().to_lowercase()
}

/// User-created scheduling surface with its own grid and category list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    pub id: PanelId,
    /// Trimmed, non-empty, unique among live panels (case-insensitive).
    pub display_name: String,
    pub interval_minutes: u32,
}

impl Panel {
    /// Creates a panel; the interval is clamped into range.
    pub fn new(id: PanelId, display_name: impl Into<String>, interval_minutes: u32) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            interval_minutes: interval_minutes.clamp(MIN_INTERVAL_MINUTES, MAX_INTERVAL_MINUTES),
        }
    }

    /// Fallback label for panels restored without a saved name.
    pub fn default_display_name(id: PanelId) -> String {
        format!("Panel {}", id.get())
    }

    pub fn slot_count(&self) -> usize {
        slot_count_for(self.interval_minutes)
    }

    /// Minutes after midnight at which `index` starts.
    pub fn slot_start_minutes(&self, index: usize) -> u32 {
        index as u32 * self.interval_minutes
    }

    /// `HH:MM` label for a slot, e.g. `01:30` for index 6 of a 15-minute panel.
    pub fn slot_label(&self, index: usize) -> String {
        let minutes = self.slot_start_minutes(index);
        format!("{:02}:{:02}", minutes / 60, minutes % 60)
    }

    /// Slot index covering `minute_offset`, if it falls inside the day.
    pub fn slot_for_minute(&self, minute_offset: u32) -> Option<usize> {
        let index = (minute_offset / self.interval_minutes) as usize;
        (index < self.slot_count()).then_some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::{clamp_interval, display_names_match, slot_count_for, Panel};
    use crate::model::location::PanelId;

    #[test]
    fn slot_count_follows_interval() {
        assert_eq!(slot_count_for(60), 24);
        assert_eq!(slot_count_for(10), 144);
        assert_eq!(slot_count_for(720), 2);
        assert_eq!(slot_count_for(7), 144);
        assert_eq!(slot_count_for(45), 32);
        assert_eq!(slot_count_for(100), 14);
    }

    #[test]
    fn clamp_interval_reports_out_of_range_requests() {
        let (applied, notice) = clamp_interval(5);
        assert_eq!(applied, 10);
        let notice = notice.expect("5 minutes is below the minimum");
        assert_eq!(notice.requested, 5);

        let (applied, notice) = clamp_interval(1000);
        assert_eq!(applied, 720);
        assert!(notice.is_some());

        assert_eq!(clamp_interval(30), (30, None));
    }

    #[test]
    fn slot_labels_use_twenty_four_hour_clock() {
        let panel = Panel::new(PanelId::new(1), "Early", 15);
        assert_eq!(panel.slot_label(0), "00:00");
        assert_eq!(panel.slot_label(6), "01:30");
        assert_eq!(panel.slot_label(95), "23:45");
    }

    #[test]
    fn slot_for_minute_maps_offsets_into_range() {
        let panel = Panel::new(PanelId::new(1), "Late", 120);
        assert_eq!(panel.slot_for_minute(0), Some(0));
        assert_eq!(panel.slot_for_minute(130), Some(1));
        assert_eq!(panel.slot_for_minute(1440), None);
    }

    #[test]
    fn display_name_match_ignores_case_and_padding() {
        assert!(display_names_match("Night Shift", " night shift "));
        assert!(!display_names_match("Night Shift", "Day Shift"));
    }
}
