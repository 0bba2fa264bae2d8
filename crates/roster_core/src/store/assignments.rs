//! Per-panel category lists (assignments without a time axis).
//!
//! # Invariants
//! - Categories are keyed by `PanelId`; the lifecycle manager creates and
//!   deletes them together with the panel.
//! - List order is insertion order.

use crate::model::location::PanelId;
use std::collections::BTreeMap;

/// Category-keyed ordered name lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentStore {
    lists: BTreeMap<PanelId, Vec<String>>,
}

impl AssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty category. Existing categories are left untouched.
    pub fn create_category(&mut self, id: PanelId) {
        self.lists.entry(id).or_default();
    }

    /// Removes a category and returns the names it held, in order.
    pub fn delete_category(&mut self, id: PanelId) -> Vec<String> {
        self.lists.remove(&id).unwrap_or_default()
    }

    pub fn has_category(&self, id: PanelId) -> bool {
        self.lists.contains_key(&id)
    }

    /// Appends `name` to a category, creating the category if needed.
    pub fn add_to(&mut self, id: PanelId, name: impl Into<String>) {
        self.lists.entry(id).or_default().push(name.into());
    }

    /// Removes every occurrence of `name` from one category.
    pub fn remove_from(&mut self, id: PanelId, name: &str) -> bool {
        let Some(list) = self.lists.get_mut(&id) else {
            return false;
        };
        let before = list.len();
        list.retain(|current| current != name);
        list.len() != before
    }

    /// Names in one category; empty for unknown categories.
    pub fn list_in(&self, id: PanelId) -> &[String] {
        self.lists.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, id: PanelId, name: &str) -> bool {
        self.list_in(id).iter().any(|current| current == name)
    }

    /// First category holding `name`, if any.
    pub fn find(&self, name: &str) -> Option<PanelId> {
        self.lists
            .iter()
            .find(|(_, list)| list.iter().any(|current| current == name))
            .map(|(id, _)| *id)
    }

    pub fn category_ids(&self) -> Vec<PanelId> {
        self.lists.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PanelId, &[String])> {
        self.lists.iter().map(|(id, list)| (*id, list.as_slice()))
    }

    /// Replaces a category list wholesale; used when restoring persisted state.
    pub(crate) fn restore_list(&mut self, id: PanelId, names: Vec<String>) {
        self.lists.insert(id, names);
    }

    pub(crate) fn retain_names(&mut self, mut keep: impl FnMut(PanelId, &String) -> bool) {
        for (id, list) in self.lists.iter_mut() {
            list.retain(|name| keep(*id, name));
        }
    }
}
