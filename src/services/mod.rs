// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth;
pub mod directory;
pub mod fallback;
pub mod favorites;
pub mod http;
pub mod normalize;
pub mod reviews;
pub mod search;

pub use auth::{AuthError, RegisterRequest, SessionManager, SessionState};
pub use directory::{
    filter, Directory, DirectoryState, FetchError, Filter, MutationError, MutationOutcome,
};
pub use favorites::{FavoriteChange, Favorites};
pub use http::ApiClient;
pub use reviews::{ReviewError, ReviewService};
pub use search::SearchHistory;
