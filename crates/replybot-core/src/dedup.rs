//! Dedup sets.
//!
//! [`HandledSet`] is the sole authority for the at-most-once reply
//! guarantee. [`SeenSet`] only feeds the run summary.

use std::collections::HashSet;

use replybot_models::ItemId;

/// Identifiers that already received a reply.
///
/// Seeded from the account's history, then grown only by successful reply
/// submissions. There is no removal API.
#[derive(Debug, Clone, Default)]
pub struct HandledSet {
    ids: HashSet<ItemId>,
}

impl HandledSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `id` has been handled.
    pub fn contains(&self, id: &ItemId) -> bool {
        self.ids.contains(id)
    }

    /// Records `id` as handled.
    ///
    /// Returns false if it was already present.
    pub fn insert(&mut self, id: ItemId) -> bool {
        self.ids.insert(id)
    }

    /// Number of handled identifiers.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if nothing has been handled.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterates over handled identifiers in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &ItemId> {
        self.ids.iter()
    }
}

impl FromIterator<ItemId> for HandledSet {
    fn from_iter<I: IntoIterator<Item = ItemId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// Identifiers observed during the current run.
#[derive(Debug, Clone, Default)]
pub struct SeenSet {
    ids: HashSet<ItemId>,
}

impl SeenSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an observed identifier.
    pub fn record(&mut self, id: &ItemId) {
        if !self.ids.contains(id) {
            self.ids.insert(id.clone());
        }
    }

    /// Returns true if `id` was observed.
    pub fn contains(&self, id: &ItemId) -> bool {
        self.ids.contains(id)
    }

    /// Number of distinct identifiers observed.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if nothing was observed.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Forgets everything observed so far.
    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
