// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client state persisted to disk across app restarts.

use etab_client::services::{Favorites, SearchHistory, SessionState};
use etab_client::store::{ClientStore, StoreKey, Theme};

mod common;
use common::{app_with, sign_in, MockApi};

#[tokio::test]
async fn test_session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let api = MockApi::start().await;

    {
        let (app, _) = app_with(api.config(), ClientStore::open(&path).unwrap());
        app.session.restore();
        sign_in(&api, &app, "admin").await;
        app.favorites.toggle("42");
        app.search.record("sushi");
        app.store.set_theme(Theme::Dark);
    }

    let (app, _) = app_with(api.config(), ClientStore::open(&path).unwrap());
    let state = app.session.restore();

    let SessionState::Authenticated(session) = state else {
        panic!("expected a restored session, got {:?}", state);
    };
    assert_eq!(session.token, "t1");
    assert_eq!(session.user_id, Some(7));
    assert!(app.session.is_admin());
    assert!(app.favorites.contains("42"));
    assert_eq!(app.search.list(), vec!["sushi"]);
    assert_eq!(app.store.theme(), Theme::Dark);
}

#[test]
fn test_external_favorites_change_is_reloaded() {
    let store = ClientStore::in_memory();
    let favorites = Favorites::new(store.clone());
    favorites.toggle("1");

    store.notify_external(StoreKey::Favorites, Some(r#"["2","3"]"#));
    favorites.reload();

    assert!(!favorites.contains("1"));
    assert!(favorites.contains("2"));
    assert!(favorites.contains("3"));
}

#[test]
fn test_corrupted_recent_searches_are_dropped() {
    let store = ClientStore::in_memory();
    store.set(StoreKey::RecentSearches, "{not json");
    let history = SearchHistory::new(store.clone());

    assert!(history.list().is_empty());
    assert!(store.get(StoreKey::RecentSearches).is_none());
}
