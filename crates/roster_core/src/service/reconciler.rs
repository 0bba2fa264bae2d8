//! Drop reconciler: moves or deletes one name across stores.
//!
//! # Responsibility
//! - Apply a `(name, source, target)` drop as one all-or-nothing update.
//! - Relocate displaced slot occupants to the pool instead of overwriting them.
//!
//! # Invariants
//! - Both locations are validated before any store is touched.
//! - After a successful move the name is at `target` and nowhere else.
//! - Self-drops, repeated drops and stale drops never mutate state.
//! - Persistence and rendering happen in the caller, after this returns.

use crate::error::{BoardError, BoardResult};
use crate::logging::sanitize_message;
use crate::model::location::Location;
use crate::store::state::SchedulingState;
use log::{debug, error, info, warn};

const MAX_LOGGED_NAME_CHARS: usize = 40;

/// Why a drop left the board unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Source and target are the same location.
    SameLocation,
    /// Target slot already holds this name.
    AlreadyInSlot,
    /// Name is no longer at the source, e.g. a repeated gesture event.
    NotAtSource,
}

impl IgnoreReason {
    fn as_str(self) -> &'static str {
        match self {
            Self::SameLocation => "same_location",
            Self::AlreadyInSlot => "already_in_slot",
            Self::NotAtSource => "not_at_source",
        }
    }
}

/// Result of one drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// Name moved; `displaced` is the previous slot occupant, now in the pool.
    Moved { displaced: Option<String> },
    /// Name was dropped on trash and no longer exists.
    Deleted,
    /// Nothing changed.
    Ignored(IgnoreReason),
}

impl DropOutcome {
    /// Whether the board changed and must be persisted and re-rendered.
    pub fn changed_state(&self) -> bool {
        !matches!(self, Self::Ignored(_))
    }
}

/// Sole writer of name placement for drag-and-drop gestures.
pub struct DropReconciler<'a> {
    state: &'a mut SchedulingState,
}

impl<'a> DropReconciler<'a> {
    pub fn new(state: &'a mut SchedulingState) -> Self {
        Self { state }
    }

    /// Applies a drop given UI container ids.
    ///
    /// Both ids are parsed before anything else happens.
    ///
    /// # Errors
    /// - `MalformedLocation` when either id does not parse.
    /// - Every error of [`DropReconciler::apply`].
    pub fn apply_container_ids(
        &mut self,
        name: &str,
        source_id: &str,
        target_id: &str,
    ) -> BoardResult<DropOutcome> {
        let parsed = Location::parse(source_id).and_then(|source| {
            Location::parse(target_id).map(|target| (source, target))
        });
        let (source, target) = match parsed {
            Ok(pair) => pair,
            Err(err) => {
                error!(
                    "event=drop module=reconciler status=error error_code=malformed_location source={} target={}",
                    sanitize_message(source_id, MAX_LOGGED_NAME_CHARS),
                    sanitize_message(target_id, MAX_LOGGED_NAME_CHARS)
                );
                return Err(err.into());
            }
        };
        self.apply(name, &source, &target)
    }

    /// Moves `name` from `source` to `target`, or deletes it when `target` is trash.
    ///
    /// # Errors
    /// - `MalformedLocation` when `source` is trash.
    /// - `PanelNotFound` / `SlotOutOfRange` when a location does not exist.
    pub fn apply(
        &mut self,
        name: &str,
        source: &Location,
        target: &Location,
    ) -> BoardResult<DropOutcome> {
        if source == target {
            return Ok(self.ignore(name, source, target, IgnoreReason::SameLocation));
        }

        if *source == Location::Trash {
            error!(
                "event=drop module=reconciler status=error error_code=malformed_location source=trash target={}",
                target
            );
            return Err(BoardError::MalformedLocation(
                "trash cannot be a drop source".to_string(),
            ));
        }
        self.state.validate_location(source)?;
        self.state.validate_location(target)?;

        if let Location::Slot { panel, index } = target {
            if self.state.grid.get(*panel, *index) == Some(name) {
                return Ok(self.ignore(name, source, target, IgnoreReason::AlreadyInSlot));
            }
        }

        if !self.state.is_at(name, source) {
            return Ok(self.ignore(name, source, target, IgnoreReason::NotAtSource));
        }

        if *target == Location::Trash {
            self.state.take_from(name, source)?;
            self.state.palette.release(name);
            info!(
                "event=drop module=reconciler status=ok action=delete source={}",
                source
            );
            return Ok(DropOutcome::Deleted);
        }

        self.state.take_from(name, source)?;
        let displaced = match target {
            Location::Pool => {
                self.state.pool.push(name);
                None
            }
            Location::Category(panel) => {
                self.state.categories.add_to(*panel, name);
                None
            }
            Location::Slot { panel, index } => {
                let displaced = self.state.grid.clear(*panel, *index)?;
                if let Some(previous) = &displaced {
                    self.state.pool.push(previous.clone());
                }
                self.state.grid.set(*panel, *index, name)?;
                displaced
            }
            Location::Trash => None,
        };

        info!(
            "event=drop module=reconciler status=ok action=move source={} target={} displaced={}",
            source,
            target,
            displaced.is_some()
        );
        Ok(DropOutcome::Moved { displaced })
    }

    fn ignore(
        &self,
        name: &str,
        source: &Location,
        target: &Location,
        reason: IgnoreReason,
    ) -> DropOutcome {
        match reason {
            IgnoreReason::NotAtSource => warn!(
                "event=drop module=reconciler status=skip reason={} name={} source={} target={}",
                reason.as_str(),
                sanitize_message(name, MAX_LOGGED_NAME_CHARS),
                source,
                target
            ),
            _ => debug!(
                "event=drop module=reconciler status=skip reason={} source={} target={}",
                reason.as_str(),
                source,
                target
            ),
        }
        DropOutcome::Ignored(reason)
    }
}
