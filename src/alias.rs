//! Old handle to current handle lookup table.
//!
//! Links, bookmarks and stale denormalized copies may still carry a handle
//! that was renamed. The [`AliasMap`] keeps them resolvable. It is written
//! only when a rename is committed and read by every handle lookup.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::handle::{Rename, normalize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct AliasEntry {
    current: String,
    recorded: u64,
}

/// Append-mostly alias table keyed by normalized old handle.
///
/// Chains are flattened when recorded, so `a -> b` followed by `b -> c`
/// leaves `a -> c` and `b -> c`, and every lookup is a single hop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasMap {
    entries: HashMap<String, AliasEntry>,
    sequence: u64,
    #[serde(skip)]
    capacity: Option<usize>,
}

impl AliasMap {
    /// Create an unbounded [`AliasMap`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the bound, evicting the oldest entries if needed.
    pub fn set_capacity(&mut self, capacity: Option<usize>) {
        self.capacity = capacity;
        self.evict();
    }

    /// Record a committed rename.
    pub fn record_rename(&mut self, rename: &Rename) {
        let old_key = rename.old_key();
        if old_key.is_empty() {
            return;
        }

        let current = rename.new_handle().to_string();
        self.sequence += 1;

        for entry in self.entries.values_mut() {
            if normalize(&entry.current) == old_key {
                entry.current.clone_from(&current);
                entry.recorded = self.sequence;
            }
        }

        // the new handle is owned by a live identity from now on.
        self.entries.remove(&normalize(&current));

        self.entries.insert(
            old_key.to_string(),
            AliasEntry {
                current,
                recorded: self.sequence,
            },
        );

        self.evict();
    }

    /// Handle to use for identity lookups.
    ///
    /// Returns the current handle if `handle` was renamed, its trimmed form
    /// otherwise.
    pub fn resolve(&self, handle: &str) -> String {
        let trimmed = handle.trim();
        match self.entries.get(&normalize(trimmed)) {
            Some(entry) => entry.current.clone(),
            None => trimmed.to_string(),
        }
    }

    /// Drop entries whose target is not a live handle, and entries shadowing
    /// a live handle. Returns the number of removed entries.
    pub fn compact<'a, I>(&mut self, live_handles: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let live: HashSet<String> = live_handles.into_iter().map(normalize).collect();
        let before = self.entries.len();

        self.entries.retain(|key, entry| {
            let target = normalize(&entry.current);
            live.contains(&target) && (!live.contains(key) || *key == target)
        });

        before - self.entries.len()
    }

    /// Number of recorded aliases.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(normalized old handle, current handle)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, entry)| (key.as_str(), entry.current.as_str()))
    }

    fn evict(&mut self) {
        let Some(capacity) = self.capacity else {
            return;
        };

        while self.entries.len() > capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.recorded)
                .map(|(key, _)| key.clone());

            match oldest {
                Some(key) => {
                    tracing::debug!(alias = %key, "alias evicted");
                    self.entries.remove(&key);
                },
                None => break,
            }
        }
    }
}
