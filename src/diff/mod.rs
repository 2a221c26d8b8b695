//! Snapshot diffing.
//!
//! Pure set arithmetic over two key/value snapshots. Callers decide how to
//! commit and announce the result.

use std::collections::HashMap;

/// Complete key/value state of one namespace
pub type Snapshot = HashMap<String, String>;

/// Keys that differ between two snapshots, each list sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    /// `keys(new) - keys(old)`
    pub added: Vec<String>,
    /// `keys(old) - keys(new)`
    pub deleted: Vec<String>,
    /// Keys present in both with a different value
    pub changed: Vec<String>,
}

impl Diff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty() && self.changed.is_empty()
    }

    /// Number of per-key events this diff produces
    pub fn len(&self) -> usize {
        self.added.len() + self.deleted.len() + self.changed.len()
    }
}

pub fn diff(
    old: &Snapshot,
    new: &Snapshot,
) -> Diff {
    let mut result = Diff::default();

    for (key, new_value) in new {
        match old.get(key) {
            None => result.added.push(key.clone()),
            Some(old_value) if old_value != new_value => result.changed.push(key.clone()),
            Some(_) => {}
        }
    }

    result.deleted = old.keys().filter(|k| !new.contains_key(*k)).cloned().collect();

    result.added.sort_unstable();
    result.deleted.sort_unstable();
    result.changed.sort_unstable();
    result
}
