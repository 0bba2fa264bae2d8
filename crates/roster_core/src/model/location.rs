//! Typed drop locations and panel identity.
//!
//! # Responsibility
//! - Name every place a roster name can live: pool, panel category, grid slot.
//! - Convert between typed locations and the container ids used by UI shells.
//!
//! # Invariants
//! - `PanelId` values lie in `1..=MAX_PANEL_ID` and are never reused for another panel.
//! - `Location::parse(loc.container_id()) == Ok(loc)` for every location.
//! - Container id parsing is anchored; partial matches are malformed.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Container id used by UI shells for the unassigned pool.
pub const POOL_CONTAINER_ID: &str = "names";
/// Container id used by UI shells for the trash drop zone.
pub const TRASH_CONTAINER_ID: &str = "trash";
/// Highest panel id; the counter one past it still fits in `u32`.
pub const MAX_PANEL_ID: u32 = u32::MAX - 1;

static PANEL_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^panel-([0-9]+)$").expect("valid panel key regex"));
static SLOT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^panel-([0-9]+)-([0-9]+)$").expect("valid slot id regex"));

/// Stable panel identifier, allocated from a monotonically increasing counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PanelId(u32);

impl PanelId {
    /// Wraps a raw counter value.
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw counter value.
    pub fn get(self) -> u32 {
        self.0
    }

    /// Storage/container key, e.g. `panel-3`.
    pub fn storage_key(self) -> String {
        format!("panel-{}", self.0)
    }

    /// Parses a `panel-<n>` storage key. Returns `None` for anything else.
    pub fn parse_storage_key(key: &str) -> Option<Self> {
        let captures = PANEL_KEY_RE.captures(key)?;
        let raw = captures.get(1)?.as_str().parse::<u32>().ok()?;
        is_valid_panel_id(raw).then_some(Self(raw))
    }
}

fn is_valid_panel_id(raw: u32) -> bool {
    (1..=MAX_PANEL_ID).contains(&raw)
}

impl Display for PanelId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "panel-{}", self.0)
    }
}

/// Where a name currently lives, or where a drop sends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    /// The unassigned pool.
    Pool,
    /// A panel's untimed assignment list.
    Category(PanelId),
    /// One cell of a panel's time grid.
    Slot { panel: PanelId, index: usize },
    /// Deletion target. Never a valid drop source.
    Trash,
}

impl Location {
    /// Shorthand for `Location::Slot { panel, index }`.
    pub fn slot(panel: PanelId, index: usize) -> Self {
        Self::Slot { panel, index }
    }

    /// Returns the panel this location belongs to, if any.
    pub fn panel(&self) -> Option<PanelId> {
        match self {
            Self::Category(panel) | Self::Slot { panel, .. } => Some(*panel),
            Self::Pool | Self::Trash => None,
        }
    }

    /// Renders the UI container id for this location.
    pub fn container_id(&self) -> String {
        match self {
            Self::Pool => POOL_CONTAINER_ID.to_string(),
            Self::Trash => TRASH_CONTAINER_ID.to_string(),
            Self::Category(panel) => panel.storage_key(),
            Self::Slot { panel, index } => format!("{}-{index}", panel.storage_key()),
        }
    }

    /// Parses a UI container id.
    ///
    /// Accepted shapes: `names`, `trash`, `panel-<n>`, `panel-<n>-<slot>`.
    ///
    /// # Errors
    /// - Returns `LocationParseError` for empty or unrecognized ids.
    pub fn parse(text: &str) -> Result<Self, LocationParseError> {
        match text {
            POOL_CONTAINER_ID => return Ok(Self::Pool),
            TRASH_CONTAINER_ID => return Ok(Self::Trash),
            _ => {}
        }

        if let Some(panel) = PanelId::parse_storage_key(text) {
            return Ok(Self::Category(panel));
        }

        let malformed = || LocationParseError(text.to_string());
        let captures = SLOT_ID_RE.captures(text).ok_or_else(malformed)?;
        let panel = captures
            .get(1)
            .and_then(|value| value.as_str().parse::<u32>().ok())
            .filter(|raw| is_valid_panel_id(*raw))
            .map(PanelId::new)
            .ok_or_else(malformed)?;
        let index = captures
            .get(2)
            .and_then(|value| value.as_str().parse::<usize>().ok())
            .ok_or_else(malformed)?;
        Ok(Self::Slot { panel, index })
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.container_id())
    }
}

impl FromStr for Location {
    type Err = LocationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Container id that does not name any location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationParseError(pub String);

impl Display for LocationParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed location id `{}`", self.0)
    }
}

impl Error for LocationParseError {}

#[cfg(test)]
mod tests {
    use super::{Location, PanelId};

    #[test]
    fn parse_accepts_all_container_shapes() {
        assert_eq!(Location::parse("names").unwrap(), Location::Pool);
        assert_eq!(Location::parse("trash").unwrap(), Location::Trash);
        assert_eq!(
            Location::parse("panel-4").unwrap(),
            Location::Category(PanelId::new(4))
        );
        assert_eq!(
            Location::parse("panel-12-23").unwrap(),
            Location::slot(PanelId::new(12), 23)
        );
    }

    #[test]
    fn parse_rejects_malformed_ids() {
        for text in ["", "panel", "panel-", "panel-0", "panel-x-3", "panel-1-", "duty", " names"] {
            assert!(Location::parse(text).is_err(), "`{text}` should be rejected");
        }
    }

    #[test]
    fn container_id_round_trips_through_parse() {
        let locations = [
            Location::Pool,
            Location::Trash,
            Location::Category(PanelId::new(1)),
            Location::slot(PanelId::new(7), 143),
        ];
        for location in locations {
            assert_eq!(Location::parse(&location.container_id()).unwrap(), location);
        }
    }

    #[test]
    fn storage_key_parsing_requires_positive_ids() {
        assert_eq!(PanelId::parse_storage_key("panel-9"), Some(PanelId::new(9)));
        assert_eq!(PanelId::parse_storage_key("panel-0"), None);
        assert_eq!(PanelId::parse_storage_key("panel-9-1"), None);
        assert_eq!(PanelId::parse_storage_key("panel-99999999999"), None);
        assert_eq!(PanelId::parse_storage_key("panel-4294967295"), None);
        assert_eq!(
            PanelId::parse_storage_key("panel-4294967294"),
            Some(PanelId::new(super::MAX_PANEL_ID))
        );
        assert!(Location::parse("panel-4294967295-0").is_err());
    }
}
