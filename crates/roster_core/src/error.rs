//! Board-level error taxonomy.
//!
//! # Invariants
//! - Every variant is raised before any store mutation happens.
//! - Interval range violations are not errors; they are clamped and reported
//!   through `IntervalNotice`.

use crate::model::location::{LocationParseError, PanelId};
use crate::repo::state_store::StorageError;
use crate::store::time_grid::GridError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by board services.
pub type BoardResult<T> = Result<T, BoardError>;

/// Errors from board operations.
#[derive(Debug)]
pub enum BoardError {
    /// Name is blank after trim.
    InvalidName,
    /// Name already exists somewhere on the board.
    DuplicateName(String),
    /// Another live panel already uses this display name (case-insensitive).
    NameTaken(String),
    /// Panel display name is blank after trim.
    EmptyPanelName,
    /// Location references a panel that does not exist.
    PanelNotFound(PanelId),
    /// Location references a slot past the end of the panel's grid.
    SlotOutOfRange {
        panel: PanelId,
        index: usize,
        slot_count: usize,
    },
    /// The panel counter has reached its ceiling.
    PanelIdsExhausted,
    /// Container id or location combination that cannot be interpreted.
    MalformedLocation(String),
    /// Persistence failure.
    Storage(StorageError),
}

impl Display for BoardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "name must not be blank"),
            Self::DuplicateName(name) => write!(f, "name already exists: {name}"),
            Self::NameTaken(name) => write!(f, "a panel named `{name}` already exists"),
            Self::EmptyPanelName => write!(f, "panel name must not be blank"),
            Self::PanelNotFound(id) => write!(f, "panel not found: {id}"),
            Self::SlotOutOfRange {
                panel,
                index,
                slot_count,
            } => write!(
                f,
                "slot {index} is out of range for {panel} ({slot_count} slots)"
            ),
            Self::PanelIdsExhausted => write!(f, "no panel ids left to allocate"),
            Self::MalformedLocation(message) => write!(f, "malformed location: {message}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BoardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StorageError> for BoardError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<LocationParseError> for BoardError {
    fn from(value: LocationParseError) -> Self {
        Self::MalformedLocation(format!("unrecognized container id `{}`", value.0))
    }
}

impl From<GridError> for BoardError {
    fn from(value: GridError) -> Self {
        match value {
            GridError::MissingPanel(panel) => Self::PanelNotFound(panel),
            GridError::IndexOutOfRange {
                panel,
                index,
                slot_count,
            } => Self::SlotOutOfRange {
                panel,
                index,
                slot_count,
            },
        }
    }
}
