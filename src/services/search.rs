// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recent search queries.

use crate::store::{ClientStore, StoreKey};

pub const MAX_RECENT_SEARCHES: usize = 5;

#[derive(Clone)]
pub struct SearchHistory {
    store: ClientStore,
}

impl SearchHistory {
    pub fn new(store: ClientStore) -> Self {
        Self { store }
    }

    /// Newest first.
    pub fn list(&self) -> Vec<String> {
        self.store
            .get_json::<Vec<String>>(StoreKey::RecentSearches)
            .unwrap_or_default()
    }

    /// Push `query` to the front. Blank queries are ignored; a repeat
    /// (ignoring case) moves to the front instead of being duplicated.
    pub fn record(&self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }

        let lowered = query.to_lowercase();
        let mut recent = self.list();
        recent.retain(|q| q.to_lowercase() != lowered);
        recent.insert(0, query.to_string());
        recent.truncate(MAX_RECENT_SEARCHES);
        self.store.set_json(StoreKey::RecentSearches, &recent);
    }

    pub fn clear(&self) {
        self.store.remove(StoreKey::RecentSearches);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first_and_bounded() {
        let history = SearchHistory::new(ClientStore::in_memory());
        for q in ["a", "b", "c", "d", "e", "f"] {
            history.record(q);
        }
        assert_eq!(history.list(), vec!["f", "e", "d", "c", "b"]);
    }

    #[test]
    fn test_dedupe_ignores_case() {
        let history = SearchHistory::new(ClientStore::in_memory());
        history.record("Sushi");
        history.record("pasta");
        history.record("  SUSHI ");
        assert_eq!(history.list(), vec!["SUSHI", "pasta"]);
    }

    #[test]
    fn test_blank_is_ignored_and_clear() {
        let history = SearchHistory::new(ClientStore::in_memory());
        history.record("   ");
        assert!(history.list().is_empty());
        history.record("bar");
        history.clear();
        assert!(history.list().is_empty());
    }
}
