// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication session manager.
//!
//! Owns the in-memory session, derived from the client store at startup and
//! published through a `watch` channel so any number of views can follow it:
//!
//! ```text
//! Uninitialized -> Restoring -> { Authenticated, Anonymous }
//! ```

use crate::config::Config;
use crate::error::{validation_from, ApiError};
use crate::models::{admin_signal, Role, Session, UserProfile};
use crate::navigation::redirect_to_login;
use crate::services::http::ApiClient;
use crate::store::{ClientStore, StoreKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use validator::Validate;

/// Session lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Uninitialized,
    Restoring,
    Authenticated(Session),
    Anonymous,
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(s) => Some(s),
            _ => None,
        }
    }
}

/// Login failures, as shown to the user.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("Login endpoint not found, check the API configuration")]
    EndpointNotFound,

    #[error("Server error, please try again later")]
    Server,

    #[error("{0}")]
    InvalidCredentials(String),

    #[error("No response from server: {0}")]
    Network(String),

    #[error("{0}")]
    Validation(ApiError),

    #[error("Unexpected login response: {0}")]
    Malformed(String),
}

impl AuthError {
    fn from_api(err: ApiError) -> Self {
        match err {
            ApiError::NotFound(_) => AuthError::EndpointNotFound,
            ApiError::Server { .. } => AuthError::Server,
            ApiError::Network(msg) => AuthError::Network(msg),
            ApiError::Malformed(msg) => AuthError::Malformed(msg),
            other => AuthError::InvalidCredentials(
                other
                    .server_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| "Incorrect email or password".to_string()),
            ),
        }
    }
}

#[derive(Debug, Serialize, Validate)]
struct LoginRequest {
    #[validate(email(message = "Email address is invalid"))]
    email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    password: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(alias = "access_token")]
    token: Option<String>,
    #[serde(default)]
    user: Option<Value>,
    #[serde(default)]
    id: Option<Value>,
}

/// Account creation form.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Email address is invalid"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub password_confirmation: String,
}

/// Session manager. Share it behind an `Arc`.
pub struct SessionManager {
    api: ApiClient,
    store: ClientStore,
    state: Arc<watch::Sender<SessionState>>,
    admin_display_name: Option<String>,
    logout_delay: Duration,
}

impl SessionManager {
    pub fn new(api: ApiClient, config: &Config) -> Self {
        let (state, _) = watch::channel(SessionState::Uninitialized);
        let state = Arc::new(state);

        // A 401 anywhere has already wiped the stored credentials.
        let on_401 = state.clone();
        api.on_unauthorized(Arc::new(move || {
            if on_401.send_replace(SessionState::Anonymous).session().is_some() {
                tracing::info!("Session ended by the server");
            }
        }));

        Self {
            store: api.store().clone(),
            api,
            state,
            admin_display_name: config.admin_display_name.clone(),
            logout_delay: config.logout_redirect_delay,
        }
    }

    /// Follow session changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.state.borrow().session().cloned()
    }

    // ─── Restore ─────────────────────────────────────────────────

    /// Derive the session from the store. Run once at startup.
    pub fn restore(&self) -> SessionState {
        self.state.send_replace(SessionState::Restoring);
        self.store.migrate_token_alias();

        let next = self.derive_state();
        match &next {
            SessionState::Authenticated(s) => {
                tracing::info!(user_id = ?s.user_id, role = s.role.as_str(), "Session restored");
            }
            _ => tracing::info!("No session to restore"),
        }
        self.state.send_replace(next.clone());
        next
    }

    /// Re-read the store, e.g. after another process changed it.
    pub fn resync(&self) -> SessionState {
        let next = self.derive_state();
        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next.clone();
                true
            }
        });
        next
    }

    fn derive_state(&self) -> SessionState {
        let Some(token) = self.store.token() else {
            self.api.clear_default_token();
            return SessionState::Anonymous;
        };
        self.api.set_default_token(&token);

        let had_profile = self.store.get(StoreKey::User).is_some();
        match self.store.get_json::<UserProfile>(StoreKey::User) {
            Some(profile) => SessionState::Authenticated(Session::from_profile(
                token,
                profile,
                self.store.user_id(),
                self.admin_display_name.as_deref(),
            )),
            // Corrupted profile: the entry is gone, the token stays.
            None if had_profile => SessionState::Anonymous,
            None => SessionState::Authenticated(Session::profile_less(
                token,
                self.store.user_id(),
                self.store.get(StoreKey::UserName),
            )),
        }
    }

    /// Re-sync whenever another process touches an auth slot.
    pub fn watch_store(self: &Arc<Self>) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        let mut events = self.store.subscribe();

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) if event.external && event.key.is_auth() => {
                        tracing::debug!(key = %event.key, "Auth slot changed externally");
                        manager.resync();
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Storage events lagged, resyncing");
                        manager.resync();
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    // ─── Login / register / logout ───────────────────────────────

    /// Exchange credentials for a session. The store is untouched on failure.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = email.trim();
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        request
            .validate()
            .map_err(|e| AuthError::Validation(validation_from(e)))?;

        tracing::info!("Login attempt");
        let body = self
            .api
            .post_json("/auth/login", &request)
            .await
            .map_err(|e| {
                tracing::warn!(status = ?e.status(), error = %e, "Login failed");
                AuthError::from_api(e)
            })?;

        let response: LoginResponse =
            serde_json::from_value(body).map_err(|e| AuthError::Malformed(e.to_string()))?;
        let token = response
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::Malformed("missing token".to_string()))?;

        let profile = match response.user.filter(|u| u.is_object()) {
            Some(user) => serde_json::from_value::<UserProfile>(user)
                .map_err(|e| AuthError::Malformed(e.to_string()))?,
            None => {
                let id = response
                    .id
                    .as_ref()
                    .and_then(value_as_u64)
                    .unwrap_or_else(|| chrono::Utc::now().timestamp_millis() as u64);
                tracing::info!("Login response had no user, using a minimal profile");
                UserProfile::minimal(email, id)
            }
        };

        self.store.set_token(&token);
        self.store.set_json(StoreKey::User, &profile);
        if let Some(id) = profile.resolved_id() {
            self.store.set(StoreKey::UserId, &id.to_string());
        }
        if let Some(name) = profile.display_name() {
            self.store.set(StoreKey::UserName, name);
        }
        self.api.set_default_token(&token);

        let session = Session::from_profile(
            token,
            profile,
            None,
            self.admin_display_name.as_deref(),
        );
        self.state
            .send_replace(SessionState::Authenticated(session.clone()));

        tracing::info!(user_id = ?session.user_id, role = session.role.as_str(), "Login completed");
        Ok(session)
    }

    /// Create an account. Does not sign in.
    pub async fn register(&self, request: &RegisterRequest) -> Result<(), AuthError> {
        request
            .validate()
            .map_err(|e| AuthError::Validation(validation_from(e)))?;

        match self.api.post_json("/auth/register", request).await {
            Ok(_) => {
                tracing::info!("Account created");
                Ok(())
            }
            Err(e @ ApiError::Validation { .. }) => Err(AuthError::Validation(e)),
            Err(e) => Err(AuthError::from_api(e)),
        }
    }

    /// Drop the session and go to the login screen after a short delay.
    ///
    /// The redirect runs on the current Tokio runtime; outside a runtime it
    /// happens immediately and `None` is returned.
    pub fn logout(&self) -> Option<JoinHandle<()>> {
        self.store.clear_auth();
        self.api.clear_default_token();
        self.state.send_replace(SessionState::Anonymous);
        tracing::info!("Logged out");

        let navigator = Arc::clone(self.api.navigator());
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let delay = self.logout_delay;
                Some(handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    redirect_to_login(navigator.as_ref());
                }))
            }
            Err(_) => {
                redirect_to_login(navigator.as_ref());
                None
            }
        }
    }

    // ─── Queries ─────────────────────────────────────────────────

    /// Token presence only; a profile-less session still counts.
    pub fn is_authenticated(&self) -> bool {
        self.api.resolve_token().is_some()
    }

    /// Admin role, from the stored profile first, then the in-memory session.
    pub fn is_admin(&self) -> bool {
        let Some(session) = self.session() else {
            return false;
        };
        match self.store.get_json::<UserProfile>(StoreKey::User) {
            Some(profile) => admin_signal(&profile, self.admin_display_name.as_deref()).is_some(),
            None => session.is_admin(),
        }
    }

    pub fn role(&self) -> Role {
        if self.is_admin() {
            Role::Admin
        } else {
            Role::User
        }
    }

    /// Session user id, falling back to the stored numeric id.
    pub fn current_user_id(&self) -> Option<u64> {
        self.session()
            .and_then(|s| s.user_id)
            .or_else(|| self.store.user_id())
    }

    /// Name to attribute user content to.
    pub fn display_name(&self) -> String {
        self.session()
            .map(|s| s.display_name)
            .or_else(|| self.store.get(StoreKey::UserName))
            .unwrap_or_else(|| "User".to_string())
    }
}

fn value_as_u64(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
