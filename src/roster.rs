//! Roster store
//!
//! Holds the usernames currently connected, as last reported by the server.

use std::collections::BTreeSet;

/// Set of connected usernames, excluding the local user
///
/// Each snapshot from the server replaces the whole set.
#[derive(Debug, Default)]
pub struct Roster {
    names: BTreeSet<String>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace contents with a fresh snapshot
    ///
    /// `local` is dropped even if the snapshot still contains it.
    pub fn replace<I>(&mut self, names: I, local: &str)
    where
        I: IntoIterator<Item = String>,
    {
        self.names = names
            .into_iter()
            .filter(|name| !name.is_empty() && name != local)
            .collect();
    }

    /// Sorted snapshot for display
    pub fn names(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }
}
