// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Persistent client store.
//!
//! Durable key-value state that survives restarts (the equivalent of the
//! browser's local storage). It is not a security boundary: tokens are kept
//! in clear, exactly as the web client kept them.
//!
//! Every mutation is broadcast as a [`StorageEvent`] so that the session
//! manager can re-sync when another process changes the same slots.

pub mod backend;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Capacity of the storage event channel. Slow subscribers lag, they never block writers.
const EVENT_CAPACITY: usize = 64;

/// Logical store slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    /// Canonical auth token
    Token,
    /// Historical alias of the auth token
    LegacyToken,
    /// User profile JSON
    User,
    /// Numeric user id
    UserId,
    /// Display name
    UserName,
    /// Favorite establishment ids (JSON array)
    Favorites,
    /// Recent search terms (JSON array)
    RecentSearches,
    /// Theme preference
    Theme,
}

impl StoreKey {
    /// Keys removed on logout or on an authentication failure.
    pub const AUTH: [StoreKey; 5] = [
        StoreKey::Token,
        StoreKey::LegacyToken,
        StoreKey::User,
        StoreKey::UserId,
        StoreKey::UserName,
    ];

    /// Literal key name in the backend.
    pub fn as_str(self) -> &'static str {
        match self {
            StoreKey::Token => "token",
            StoreKey::LegacyToken => "authToken",
            StoreKey::User => "user",
            StoreKey::UserId => "userId",
            StoreKey::UserName => "userName",
            StoreKey::Favorites => "favorites",
            StoreKey::RecentSearches => "recentSearches",
            StoreKey::Theme => "theme",
        }
    }

    pub fn is_auth(self) -> bool {
        Self::AUTH.contains(&self)
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change to one store slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: StoreKey,
    /// New value, `None` when the key was removed
    pub value: Option<String>,
    /// True when the write happened outside this process
    pub external: bool,
}

/// Outcome of reconciling the two historical token slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenMigration {
    /// Both or neither slot was set
    Unchanged,
    /// Only the legacy slot was set; copied into the canonical slot
    CanonicalBackfilled,
    /// Only the canonical slot was set; copied into the legacy slot
    LegacyBackfilled,
}

/// Theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

/// Handle to the persistent client store. Cheap to clone.
#[derive(Clone)]
pub struct ClientStore {
    backend: Arc<dyn StorageBackend>,
    events: broadcast::Sender<StorageEvent>,
}

impl ClientStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { backend, events }
    }

    /// In-memory store (tests, ephemeral sessions).
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::default()))
    }

    /// Store persisted to a JSON file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Ok(Self::new(Arc::new(FileBackend::open(path)?)))
    }

    pub fn get(&self, key: StoreKey) -> Option<String> {
        self.backend.get(key.as_str())
    }

    pub fn set(&self, key: StoreKey, value: &str) {
        if let Err(e) = self.backend.set(key.as_str(), value) {
            tracing::warn!(key = %key, error = %e, "Failed to persist store entry");
        }
        self.publish(key, Some(value.to_string()), false);
    }

    pub fn remove(&self, key: StoreKey) {
        if self.backend.get(key.as_str()).is_none() {
            return;
        }
        if let Err(e) = self.backend.remove(key.as_str()) {
            tracing::warn!(key = %key, error = %e, "Failed to persist store removal");
        }
        self.publish(key, None, false);
    }

    /// Parse a JSON slot. A value that does not parse is removed.
    pub fn get_json<T: DeserializeOwned>(&self, key: StoreKey) -> Option<T> {
        let raw = self.get(key)?;

        if raw == "undefined" || raw == "null" {
            tracing::warn!(key = %key, "Discarding placeholder value in store");
            self.remove(key);
            return None;
        }

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding corrupted store entry");
                self.remove(key);
                None
            }
        }
    }

    pub fn set_json<T: Serialize + ?Sized>(&self, key: StoreKey, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => self.set(key, &json),
            Err(e) => tracing::error!(key = %key, error = %e, "Failed to serialize store entry"),
        }
    }

    // ─── Auth slots ──────────────────────────────────────────────

    /// Current auth token from the canonical slot, falling back to the alias.
    pub fn token(&self) -> Option<String> {
        self.get(StoreKey::Token)
            .or_else(|| self.get(StoreKey::LegacyToken))
            .filter(|t| !t.is_empty())
    }

    /// Persist a token in both slots so older readers keep working.
    pub fn set_token(&self, token: &str) {
        self.set(StoreKey::Token, token);
        self.set(StoreKey::LegacyToken, token);
    }

    /// Backfill whichever token slot is missing. Run once per session start.
    pub fn migrate_token_alias(&self) -> TokenMigration {
        let canonical = self.get(StoreKey::Token);
        let legacy = self.get(StoreKey::LegacyToken);

        match (canonical, legacy) {
            (None, Some(token)) => {
                self.set(StoreKey::Token, &token);
                tracing::info!("Migrated legacy auth token to canonical slot");
                TokenMigration::CanonicalBackfilled
            }
            (Some(token), None) => {
                self.set(StoreKey::LegacyToken, &token);
                TokenMigration::LegacyBackfilled
            }
            _ => TokenMigration::Unchanged,
        }
    }

    /// Numeric user id slot. Non-numeric values are ignored.
    pub fn user_id(&self) -> Option<u64> {
        self.get(StoreKey::UserId)?.trim().parse().ok()
    }

    /// Remove every auth-related slot.
    pub fn clear_auth(&self) {
        for key in StoreKey::AUTH {
            self.remove(key);
        }
    }

    // ─── Preferences ─────────────────────────────────────────────

    pub fn theme(&self) -> Theme {
        match self.get(StoreKey::Theme).as_deref() {
            Some("dark") => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn set_theme(&self, theme: Theme) {
        self.set(StoreKey::Theme, theme.as_str());
    }

    // ─── Change events ───────────────────────────────────────────

    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }

    /// Apply a write made by another process and notify subscribers.
    pub fn notify_external(&self, key: StoreKey, value: Option<&str>) {
        let result = match value {
            Some(v) => self.backend.set(key.as_str(), v),
            None => self.backend.remove(key.as_str()),
        };
        if let Err(e) = result {
            tracing::warn!(key = %key, error = %e, "Failed to apply external store change");
        }
        self.publish(key, value.map(str::to_string), true);
    }

    fn publish(&self, key: StoreKey, value: Option<String>, external: bool) {
        // No receivers is fine.
        let _ = self.events.send(StorageEvent {
            key,
            value,
            external,
        });
    }
}

/// Store backend errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(String),

    #[error("Store serialization error: {0}")]
    Serialize(String),
}
