//! Unassigned name pool.

/// Ordered list of names not placed in any panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityPool {
    names: Vec<String>,
}

impl EntityPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a pool from persisted names, keeping their order.
    pub fn from_names(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Appends a name. Global uniqueness is checked by the caller.
    pub fn push(&mut self, name: impl Into<String>) {
        self.names.push(name.into());
    }

    /// Removes every occurrence of `name`; returns whether anything was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.names.len();
        self.names.retain(|current| current != name);
        self.names.len() != before
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|current| current == name)
    }

    /// Names in insertion order.
    pub fn list(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub(crate) fn retain(&mut self, keep: impl FnMut(&String) -> bool) {
        self.names.retain(keep);
    }
}

#[cfg(test)]
mod tests {
    use super::EntityPool;

    #[test]
    fn push_keeps_insertion_order() {
        let mut pool = EntityPool::new();
        pool.push("Bob");
        pool.push("Alice");
        assert_eq!(pool.list(), ["Bob".to_string(), "Alice".to_string()]);
    }

    #[test]
    fn remove_is_noop_for_absent_names() {
        let mut pool = EntityPool::from_names(vec!["Alice".to_string()]);
        assert!(!pool.remove("Bob"));
        assert!(pool.remove("Alice"));
        assert!(pool.is_empty());
    }

    #[test]
    fn names_are_case_sensitive() {
        let pool = EntityPool::from_names(vec!["alice".to_string()]);
        assert!(!pool.contains("Alice"));
    }
}
