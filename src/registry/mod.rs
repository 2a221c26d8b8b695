//! Memoizing factories.
//!
//! Listeners attach to the objects handed out here, so repeated navigation
//! must yield the very same `Arc` or events would silently go missing.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::Result;

pub struct Registry<V> {
    children: DashMap<String, Arc<V>>,
}

impl<V> Registry<V> {
    pub fn new() -> Self {
        Self {
            children: DashMap::new(),
        }
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<Arc<V>> {
        self.children.get(key).map(|v| v.value().clone())
    }

    /// Returns the child cached under `key`, building it with `init` first if
    /// needed. `init` runs at most once per key and must not touch this
    /// registry.
    pub fn get_or_try_insert_with<F>(
        &self,
        key: &str,
        init: F,
    ) -> Result<Arc<V>>
    where
        F: FnOnce() -> Result<V>,
    {
        if let Some(child) = self.get(key) {
            return Ok(child);
        }

        match self.children.entry(key.to_string()) {
            Entry::Occupied(e) => Ok(e.get().clone()),
            Entry::Vacant(e) => {
                let child = Arc::new(init()?);
                e.insert(child.clone());
                Ok(child)
            }
        }
    }

    pub fn values(&self) -> Vec<Arc<V>> {
        self.children.iter().map(|e| e.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl<V> Default for Registry<V> {
    fn default() -> Self {
        Self::new()
    }
}
