//! Selection set for batch actions and its derived none/some/all state.

use std::collections::HashSet;

use serde::Serialize;

use crate::models::record::Record;

/// Derived selection state across the loaded list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionState {
    None,
    Some,
    All,
}

/// Ids marked for batch action. Never persisted.
///
/// The controller keeps this a subset of the loaded ids: it only toggles ids
/// that are loaded and calls [`Selection::remove`] for every record it drops.
#[derive(Debug, Default, Clone)]
pub struct Selection {
    ids: HashSet<String>,
}

impl Selection {
    /// Flips one id. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    /// Deselects everything when every loaded record is selected,
    /// otherwise selects every loaded record.
    pub fn toggle_all(&mut self, loaded: &[Record]) {
        if self.ids.len() == loaded.len() {
            self.ids.clear();
        } else {
            self.ids = loaded.iter().map(|r| r.id.clone()).collect();
        }
    }

    pub fn state(&self, loaded_len: usize) -> SelectionState {
        match self.ids.len() {
            0 => SelectionState::None,
            n if n == loaded_len => SelectionState::All,
            _ => SelectionState::Some,
        }
    }

    #[cfg(test)]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn remove(&mut self, id: &str) {
        self.ids.remove(id);
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids in loaded-list order.
    pub fn ordered_ids(&self, loaded: &[Record]) -> Vec<String> {
        loaded
            .iter()
            .filter(|r| self.ids.contains(&r.id))
            .map(|r| r.id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn records(ids: &[&str]) -> Vec<Record> {
        ids.iter()
            .map(|id| Record {
                id: id.to_string(),
                company_name: None,
                job_title: None,
                image_path: None,
                resume_path: None,
                feedback: Value::Null,
            })
            .collect()
    }

    #[test]
    fn test_toggle_flips_membership() {
        let mut s = Selection::default();
        assert!(s.toggle("a"));
        assert!(s.contains("a"));
        assert!(!s.toggle("a"));
        assert!(s.is_empty());
    }

    #[test]
    fn test_derived_state() {
        let loaded = records(&["a", "b"]);
        let mut s = Selection::default();
        assert_eq!(s.state(loaded.len()), SelectionState::None);
        s.toggle("a");
        assert_eq!(s.state(loaded.len()), SelectionState::Some);
        s.toggle("b");
        assert_eq!(s.state(loaded.len()), SelectionState::All);
    }

    #[test]
    fn test_toggle_all_selects_then_deselects() {
        let loaded = records(&["a", "b", "c"]);
        let mut s = Selection::default();
        s.toggle("b");
        s.toggle_all(&loaded);
        assert_eq!(s.len(), 3);
        s.toggle_all(&loaded);
        assert!(s.is_empty());
    }

    #[test]
    fn test_toggle_all_on_empty_list_stays_empty() {
        let mut s = Selection::default();
        s.toggle_all(&[]);
        assert!(s.is_empty());
        assert_eq!(s.state(0), SelectionState::None);
    }

    #[test]
    fn test_ordered_ids_follow_loaded_order() {
        let loaded = records(&["c", "a", "b"]);
        let mut s = Selection::default();
        s.toggle("b");
        s.toggle("c");
        assert_eq!(s.ordered_ids(&loaded), vec!["c", "b"]);
    }
}
