//! Name color assignment.
//!
//! # Responsibility
//! - Give every roster name a stable background color from a fixed palette.
//! - Spread colors evenly: unused colors first, then the least-used one.
//!
//! # Invariants
//! - `used` counts equal the number of names currently mapped to each color.
//! - Assignment is deterministic for a given history.

use std::collections::BTreeMap;

/// Pastel backgrounds, light enough for dark text in most cases.
pub const NAME_COLORS: [&str; 24] = [
    "#BBD6FF", "#FFCCCB", "#FFFFB3", "#C8E6C9", "#E1BEE7", "#F8BBD0", "#B2EBF2", "#DCEDC8",
    "#FFE0B2", "#D1C4E9", "#B3E5FC", "#CFD8DC", "#F0F4C3", "#FFECB3", "#D7CCC8", "#FCE4EC",
    "#B2DFDB", "#E8F5E9", "#FFCCBC", "#D0D9FF", "#F3E5F5", "#E6EE9C", "#FFF3E0", "#E0F7FA",
];

/// Color bookkeeping for names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamePalette {
    assigned: BTreeMap<String, String>,
    used: BTreeMap<String, u32>,
}

impl NamePalette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a palette from a persisted name → color map.
    ///
    /// Use counts are recomputed from the map instead of trusted from storage.
    pub fn from_assignments(assigned: BTreeMap<String, String>) -> Self {
        let mut used = BTreeMap::new();
        for color in assigned.values() {
            *used.entry(color.clone()).or_insert(0) += 1;
        }
        Self { assigned, used }
    }

    pub fn color_of(&self, name: &str) -> Option<&str> {
        self.assigned.get(name).map(String::as_str)
    }

    pub fn assignments(&self) -> &BTreeMap<String, String> {
        &self.assigned
    }

    pub fn use_counts(&self) -> &BTreeMap<String, u32> {
        &self.used
    }

    /// Assigns a color to `name` unless it already has one; returns the color.
    pub fn assign(&mut self, name: &str) -> String {
        if let Some(existing) = self.assigned.get(name) {
            return existing.clone();
        }

        let color = self.pick_color().to_string();
        *self.used.entry(color.clone()).or_insert(0) += 1;
        self.assigned.insert(name.to_string(), color.clone());
        color
    }

    /// Drops the color of a deleted name so it can be reused.
    pub fn release(&mut self, name: &str) {
        let Some(color) = self.assigned.remove(name) else {
            return;
        };
        if let Some(count) = self.used.get_mut(&color) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.used.remove(&color);
            }
        }
    }

    /// Forgets colors of names for which `keep` returns false.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        let stale = self
            .assigned
            .keys()
            .filter(|name| !keep(name))
            .cloned()
            .collect::<Vec<_>>();
        for name in stale {
            self.release(&name);
        }
    }

    fn pick_color(&self) -> &'static str {
        let count_of = |color: &str| self.used.get(color).copied().unwrap_or(0);
        if let Some(unused) = NAME_COLORS
            .iter()
            .copied()
            .find(|color| count_of(color) == 0)
        {
            return unused;
        }
        // min_by_key keeps the first minimum, so ties resolve in palette order.
        NAME_COLORS
            .iter()
            .copied()
            .min_by_key(|color| count_of(color))
            .unwrap_or(NAME_COLORS[0])
    }
}

/// Readable text color for a `#RRGGBB` background.
///
/// Uses perceived brightness `(299r + 587g + 114b) / 1000`; values above 128 get
/// black text. Unparseable input falls back to black.
pub fn text_color_for(background: &str) -> &'static str {
    let hex = background.trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|value| u32::from_str_radix(value, 16).ok())
    };
    let (Some(r), Some(g), Some(b)) = (channel(0..2), channel(2..4), channel(4..6)) else {
        return "#000000";
    };
    let brightness = (r * 299 + g * 587 + b * 114) / 1000;
    if brightness > 128 {
        "#000000"
    } else {
        "#FFFFFF"
    }
}

#[cfg(test)]
mod tests {
    use super::{text_color_for, NamePalette, NAME_COLORS};

    #[test]
    fn assign_uses_unused_colors_before_reusing() {
        let mut palette = NamePalette::new();
        let colors = (0..NAME_COLORS.len())
            .map(|index| palette.assign(&format!("name-{index}")))
            .collect::<std::collections::BTreeSet<_>>();
        assert_eq!(colors.len(), NAME_COLORS.len());

        let reused = palette.assign("overflow");
        assert_eq!(reused, NAME_COLORS[0]);
        assert_eq!(palette.use_counts().get(NAME_COLORS[0]), Some(&2));
    }

    #[test]
    fn assign_is_stable_for_known_names() {
        let mut palette = NamePalette::new();
        let first = palette.assign("Alice");
        assert_eq!(palette.assign("Alice"), first);
        assert_eq!(palette.use_counts().get(&first), Some(&1));
    }

    #[test]
    fn release_frees_color_for_next_name() {
        let mut palette = NamePalette::new();
        let alice = palette.assign("Alice");
        palette.assign("Bob");
        palette.release("Alice");
        assert_eq!(palette.color_of("Alice"), None);
        assert_eq!(palette.assign("Carol"), alice);
    }

    #[test]
    fn text_color_contrasts_with_background() {
        assert_eq!(text_color_for("#FFFFB3"), "#000000");
        assert_eq!(text_color_for("#202020"), "#FFFFFF");
        assert_eq!(text_color_for("nonsense"), "#000000");
    }
}
