//! Rendering collaborator contract and read-only board snapshots.
//!
//! # Invariants
//! - Renderers only receive owned snapshots; they cannot mutate the board.
//! - `rebind_drop_targets` is called explicitly after the panel set changes.

use crate::model::location::{Location, PanelId};
use crate::model::palette::text_color_for;
use crate::store::state::SchedulingState;
use std::collections::BTreeMap;

/// One name as a renderer should draw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameChip {
    pub name: String,
    /// Container id the chip is dragged from.
    pub container_id: String,
    pub background: Option<String>,
    pub text_color: Option<&'static str>,
}

/// One grid row of a panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotView {
    pub index: usize,
    /// `HH:MM` start time.
    pub label: String,
    /// Drop target id for this slot.
    pub container_id: String,
    pub occupant: Option<NameChip>,
}

/// Panel as a renderer should draw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    pub id: PanelId,
    pub container_id: String,
    pub display_name: String,
    pub interval_minutes: u32,
    pub slots: Vec<SlotView>,
    pub category: Vec<NameChip>,
}

/// Owned copy of everything a renderer needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    pub pool: Vec<NameChip>,
    pub panels: Vec<PanelView>,
    pub global_interval_minutes: u32,
}

impl BoardSnapshot {
    /// Builds a snapshot of the current state.
    pub fn capture(state: &SchedulingState) -> Self {
        let colors = state.palette().assignments();
        let pool = state
            .pool()
            .list()
            .iter()
            .map(|name| chip(name, Location::Pool, colors))
            .collect();

        let panels = state
            .panels()
            .map(|panel| {
                let row = state.grid().row(panel.id).unwrap_or(&[]);
                let slots = (0..panel.slot_count())
                    .map(|index| {
                        let location = Location::slot(panel.id, index);
                        SlotView {
                            index,
                            label: panel.slot_label(index),
                            container_id: location.container_id(),
                            occupant: row
                                .get(index)
                                .and_then(|slot| slot.as_deref())
                                .map(|name| chip(name, location, colors)),
                        }
                    })
                    .collect();
                let category = state
                    .categories()
                    .list_in(panel.id)
                    .iter()
                    .map(|name| chip(name, Location::Category(panel.id), colors))
                    .collect();
                PanelView {
                    id: panel.id,
                    container_id: panel.id.storage_key(),
                    display_name: panel.display_name.clone(),
                    interval_minutes: panel.interval_minutes,
                    slots,
                    category,
                }
            })
            .collect();

        Self {
            pool,
            panels,
            global_interval_minutes: state.global_interval_minutes(),
        }
    }

    /// True when no panel exists; shells show an empty-board message.
    pub fn has_no_panels(&self) -> bool {
        self.panels.is_empty()
    }
}

fn chip(name: &str, location: Location, colors: &BTreeMap<String, String>) -> NameChip {
    let background = colors.get(name).cloned();
    let text_color = background.as_deref().map(text_color_for);
    NameChip {
        name: name.to_string(),
        container_id: location.container_id(),
        background,
        text_color,
    }
}

/// Consumer of board snapshots. Never initiates mutation.
pub trait RenderSink {
    /// Redraws from a fresh snapshot.
    fn render(&mut self, snapshot: &BoardSnapshot);
    /// Re-registers drop targets after panels were added, removed or resized.
    fn rebind_drop_targets(&mut self, panels: &[PanelView]);
}

/// Renderer that ignores every call; for headless use.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRenderSink;

impl RenderSink for NoopRenderSink {
    fn render(&mut self, _snapshot: &BoardSnapshot) {}

    fn rebind_drop_targets(&mut self, _panels: &[PanelView]) {}
}
