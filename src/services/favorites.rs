// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Favorite establishments, persisted in the client store.
//!
//! The set is stored as a JSON array of ids. Every change is broadcast so all
//! views showing a favorite toggle stay in sync.

use crate::store::{ClientStore, StoreKey};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::RwLock;
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 64;

/// Broadcast on every favorite change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteChange {
    pub id: String,
    pub is_favorite: bool,
}

pub struct Favorites {
    store: ClientStore,
    set: RwLock<BTreeSet<String>>,
    events: broadcast::Sender<FavoriteChange>,
}

impl Favorites {
    pub fn new(store: ClientStore) -> Self {
        let set = read_set(&store);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            set: RwLock::new(set),
            events,
        }
    }

    /// Re-read the set from the store (after an external change).
    pub fn reload(&self) {
        let fresh = read_set(&self.store);
        if let Ok(mut set) = self.set.write() {
            *set = fresh;
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.set.read().map(|s| s.contains(id)).unwrap_or(false)
    }

    pub fn list(&self) -> BTreeSet<String> {
        self.set.read().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FavoriteChange> {
        self.events.subscribe()
    }

    /// Flip the favorite state of `id`. Returns the new state.
    pub fn toggle(&self, id: &str) -> bool {
        self.apply(id, |current| !current).unwrap_or(false)
    }

    /// Set the favorite state of `id`. No-op (and no event) if unchanged.
    pub fn set_favorite(&self, id: &str, favorite: bool) {
        self.apply(id, |_| favorite);
    }

    /// Decide, persist and announce under one write lock so concurrent
    /// changes reach the store in the order they hit the set.
    fn apply(&self, id: &str, next: impl FnOnce(bool) -> bool) -> Option<bool> {
        let Ok(mut set) = self.set.write() else {
            tracing::warn!(id, "Favorites lock poisoned");
            return None;
        };
        let current = set.contains(id);
        let favorite = next(current);
        if favorite == current {
            return Some(favorite);
        }
        if favorite {
            set.insert(id.to_string());
        } else {
            set.remove(id);
        }

        self.store.set_json(StoreKey::Favorites, &*set);
        tracing::debug!(id, favorite, "Favorite changed");
        let _ = self.events.send(FavoriteChange {
            id: id.to_string(),
            is_favorite: favorite,
        });
        Some(favorite)
    }
}

/// Stored ids may be numbers or strings; both normalize to text.
fn read_set(store: &ClientStore) -> BTreeSet<String> {
    store
        .get_json::<Vec<Value>>(StoreKey::Favorites)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_twice_restores_state() {
        let store = ClientStore::in_memory();
        let favorites = Favorites::new(store.clone());
        let mut rx = favorites.subscribe();

        assert!(favorites.toggle("42"));
        assert!(favorites.contains("42"));
        assert_eq!(store.get(StoreKey::Favorites).as_deref(), Some(r#"["42"]"#));

        assert!(!favorites.toggle("42"));
        assert!(!favorites.contains("42"));
        assert_eq!(store.get(StoreKey::Favorites).as_deref(), Some("[]"));

        assert_eq!(
            rx.try_recv().unwrap(),
            FavoriteChange { id: "42".into(), is_favorite: true }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            FavoriteChange { id: "42".into(), is_favorite: false }
        );
    }

    #[test]
    fn test_set_favorite_is_idempotent() {
        let favorites = Favorites::new(ClientStore::in_memory());
        let mut rx = favorites.subscribe();
        favorites.set_favorite("1", true);
        favorites.set_favorite("1", true);
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_concurrent_toggles_match_stored_set() {
        let store = ClientStore::in_memory();
        let favorites = std::sync::Arc::new(Favorites::new(store.clone()));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let favorites = favorites.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        favorites.toggle(&((t * 50 + i) % 20).to_string());
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let stored: BTreeSet<String> = store
            .get_json::<Vec<String>>(StoreKey::Favorites)
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(stored, favorites.list());
        assert_eq!(Favorites::new(store).list(), favorites.list());
    }

    #[test]
    fn test_restores_numeric_ids() {
        let store = ClientStore::in_memory();
        store.set(StoreKey::Favorites, r#"[3, "7", null]"#);
        let favorites = Favorites::new(store);
        let ids: Vec<String> = favorites.list().into_iter().collect();
        assert_eq!(ids, vec!["3".to_string(), "7".to_string()]);
    }

    #[test]
    fn test_corrupt_value_is_empty() {
        let store = ClientStore::in_memory();
        store.set(StoreKey::Favorites, "undefined");
        let favorites = Favorites::new(store);
        assert!(favorites.list().is_empty());
    }
}
