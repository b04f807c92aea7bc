// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! etab-client: browse, review and administer a directory of establishments
//!
//! Headless client core for the establishments REST API: session handling,
//! directory synchronization with demo-data fallback, favorites and reviews.
//! Any front end (the bundled CLI, a TUI, a web view) drives it through [`App`].

pub mod config;
pub mod error;
pub mod models;
pub mod navigation;
pub mod random;
pub mod scope;
pub mod services;
pub mod store;
pub mod time_utils;

use config::Config;
use error::ApiError;
use navigation::Navigator;
use services::{ApiClient, Directory, Favorites, ReviewService, SearchHistory, SessionManager};
use std::sync::Arc;
use store::ClientStore;

/// Shared application state.
pub struct App {
    pub config: Config,
    pub store: ClientStore,
    pub api: ApiClient,
    pub session: Arc<SessionManager>,
    pub directory: Directory,
    pub favorites: Favorites,
    pub reviews: ReviewService,
    pub search: SearchHistory,
}

impl App {
    /// Wire every service around one store and one navigator.
    ///
    /// The session is not restored yet; call [`SessionManager::restore`].
    pub fn new(
        config: Config,
        store: ClientStore,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config, store.clone(), navigator)?;
        let session = Arc::new(SessionManager::new(api.clone(), &config));

        Ok(Self {
            directory: Directory::new(api.clone(), Arc::clone(&session)),
            favorites: Favorites::new(store.clone()),
            reviews: ReviewService::new(api.clone(), Arc::clone(&session)),
            search: SearchHistory::new(store.clone()),
            session,
            api,
            store,
            config,
        })
    }
}
