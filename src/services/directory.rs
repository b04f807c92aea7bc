// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Establishment directory.
//!
//! Canonical in-memory collection of establishments, synchronized with the
//! API and degraded to demo data when the API is unreachable:
//! - Collection fetch and normalization
//! - Lazy cover images (cached per id, fetched at most once per session)
//! - Client-side filtering by category and search text
//! - Admin mutations applied to the collection once the server confirms them

use crate::error::{validation_from, ApiError};
use crate::models::{Establishment, EstablishmentId, EstablishmentPayload, ImageUpload, Role};
use crate::services::auth::SessionManager;
use crate::services::fallback::{demo_establishments, random_stock_image};
use crate::services::http::{segment, ApiClient};
use crate::services::normalize::{
    api_origin, created_id, first_image_url, normalize_collection, normalize_establishment,
    single_record,
};
use dashmap::DashMap;
use futures_util::{stream, StreamExt};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use validator::Validate;

/// Cover image lookups running at once.
const MAX_CONCURRENT_COVER_FETCHES: usize = 6;

/// Snapshot of the directory.
#[derive(Debug, Clone, Default)]
pub struct DirectoryState {
    pub establishments: Vec<Establishment>,
    /// The collection is the built-in demo dataset, nothing is persisted
    pub is_demo_data: bool,
    /// Non-blocking banner text (e.g. API unavailable)
    pub warning: Option<String>,
    pub loaded: bool,
}

/// Client-side filter. Empty fields pass everything through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    /// Case-insensitive exact match on the type
    pub category: Option<String>,
    /// Case-insensitive substring match on the name
    pub search_text: Option<String>,
}

impl Filter {
    pub fn matches(&self, e: &Establishment) -> bool {
        let category = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        let search = self.search_text.as_deref().filter(|s| !s.is_empty());

        let type_ok = category.map_or(true, |c| e.kind.trim().to_lowercase() == c.to_lowercase());
        let name_ok = search.map_or(true, |s| e.name.to_lowercase().contains(&s.to_lowercase()));
        type_ok && name_ok
    }
}

/// Filter a collection, preserving order.
pub fn filter(all: &[Establishment], f: &Filter) -> Vec<Establishment> {
    all.iter().filter(|e| f.matches(e)).cloned().collect()
}

/// Result of a successful mutation.
#[derive(Debug, Clone)]
pub struct MutationOutcome {
    /// Record after the change (`None` after a delete)
    pub establishment: Option<Establishment>,
    /// False when the change only exists in memory
    pub persisted: bool,
    pub message: String,
}

/// Fetch failures that are not absorbed by the demo fallback.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("Session expired, please sign in again")]
    SessionExpired,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Admin mutation failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MutationError {
    #[error("{0}")]
    Validation(ApiError),

    #[error(
        "Permission denied: {message}. Possible causes: non-admin account, expired token or missing permissions. Role: {}. Token: {}. Sign in again to retry.",
        role_label(.role),
        token_label(.token_present)
    )]
    Forbidden {
        role: Role,
        token_present: bool,
        message: String,
    },

    #[error("Session expired, please sign in again")]
    SessionExpired,

    #[error("Establishment not found: {0}")]
    NotFound(String),

    #[error("No response from server: {0}")]
    Network(String),

    #[error(transparent)]
    Api(ApiError),
}

fn role_label(role: &Role) -> &'static str {
    match role {
        Role::Admin => "admin",
        Role::User => "non-admin",
    }
}

fn token_label(present: &bool) -> &'static str {
    if *present {
        "present"
    } else {
        "absent"
    }
}

impl MutationError {
    /// Whether the user should be offered to sign in again.
    pub fn suggests_reconnect(&self) -> bool {
        matches!(
            self,
            MutationError::Forbidden { .. } | MutationError::SessionExpired
        )
    }
}

/// The establishment directory.
pub struct Directory {
    api: ApiClient,
    session: Arc<SessionManager>,
    state: RwLock<DirectoryState>,
    /// Resolved cover per establishment id, never invalidated
    cover_cache: DashMap<String, String>,
    /// Per-id lock so concurrent renders fetch a cover only once
    cover_locks: DashMap<String, Arc<Mutex<()>>>,
    origin: String,
}

impl Directory {
    pub fn new(api: ApiClient, session: Arc<SessionManager>) -> Self {
        let origin = api_origin(api.base_url());
        Self {
            api,
            session,
            state: RwLock::new(DirectoryState::default()),
            cover_cache: DashMap::new(),
            cover_locks: DashMap::new(),
            origin,
        }
    }

    pub fn state(&self) -> DirectoryState {
        self.state.read().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn establishments(&self) -> Vec<Establishment> {
        self.state
            .read()
            .map(|s| s.establishments.clone())
            .unwrap_or_default()
    }

    pub fn is_demo_data(&self) -> bool {
        self.state.read().map(|s| s.is_demo_data).unwrap_or(false)
    }

    /// Current collection narrowed by `f`.
    pub fn filtered(&self, f: &Filter) -> Vec<Establishment> {
        self.state
            .read()
            .map(|s| filter(&s.establishments, f))
            .unwrap_or_default()
    }

    pub fn find(&self, id: &EstablishmentId) -> Option<Establishment> {
        self.state
            .read()
            .ok()?
            .establishments
            .iter()
            .find(|e| &e.id == id)
            .cloned()
    }

    fn replace_state(&self, next: DirectoryState) {
        if let Ok(mut s) = self.state.write() {
            *s = next;
        }
    }

    fn update_state<R>(&self, f: impl FnOnce(&mut DirectoryState) -> R) -> Option<R> {
        self.state.write().ok().map(|mut s| f(&mut s))
    }

    // ─── Loading ─────────────────────────────────────────────────

    /// Fetch the whole collection.
    ///
    /// Any failure other than an expired session falls back to the demo
    /// dataset and sets a warning; a body of unexpected shape is an empty list.
    pub async fn load_all(&self) -> Result<Vec<Establishment>, FetchError> {
        tracing::info!("Loading establishments");

        let list = match self.api.get_value("/etablissements").await {
            Ok(body) => normalize_collection(&body),
            Err(ApiError::Malformed(msg)) => {
                tracing::warn!(error = %msg, "Malformed establishments response, treating as empty");
                Vec::new()
            }
            Err(ApiError::Unauthorized) => return Err(FetchError::SessionExpired),
            Err(e) => {
                tracing::warn!(error = %e, "API unavailable, showing demo data");
                let demo = demo_establishments();
                self.replace_state(DirectoryState {
                    establishments: demo.clone(),
                    is_demo_data: true,
                    warning: Some(format!(
                        "The API is not available ({}). Showing demo data.",
                        e
                    )),
                    loaded: true,
                });
                return Ok(demo);
            }
        };

        let list: Vec<Establishment> = list
            .into_iter()
            .map(|mut e| {
                if e.cover_image.is_none() {
                    e.cover_image = self.cover_cache.get(e.id.as_str()).map(|c| c.clone());
                }
                e
            })
            .collect();

        tracing::info!(count = list.len(), "Establishments loaded");
        self.replace_state(DirectoryState {
            establishments: list.clone(),
            is_demo_data: false,
            warning: None,
            loaded: true,
        });
        Ok(list)
    }

    /// Fetch one establishment.
    pub async fn get(&self, id: &EstablishmentId) -> Result<Establishment, FetchError> {
        if !id.is_remote() || self.is_demo_data() {
            return self
                .find(id)
                .ok_or_else(|| FetchError::Api(ApiError::NotFound(id.to_string())));
        }

        let body = self
            .api
            .get_value(&format!("/etablissements/{}", segment(id.as_str())))
            .await
            .map_err(|e| match e {
                ApiError::Unauthorized => FetchError::SessionExpired,
                other => FetchError::Api(other),
            })?;

        let mut record = single_record(&body)
            .and_then(normalize_establishment)
            .ok_or_else(|| FetchError::Api(ApiError::Malformed("expected an object".to_string())))?;
        // Keep the id we asked for if the payload had none.
        if !record.id.is_remote() {
            record.id = id.clone();
        }
        if record.cover_image.is_none() {
            record.cover_image = self.cover_cache.get(id.as_str()).map(|c| c.clone());
        }
        Ok(record)
    }

    /// Resolve the cover image of one establishment.
    ///
    /// Uses the first image from the API, or a random stock photo on any
    /// failure. Each id is looked up at most once per session.
    pub async fn load_cover_image(&self, id: &EstablishmentId) -> String {
        let key = id.as_str().to_string();
        if let Some(url) = self.cover_cache.get(&key) {
            return url.clone();
        }

        let lock = self
            .cover_locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Another task may have resolved it while we waited.
        if let Some(url) = self.cover_cache.get(&key) {
            return url.clone();
        }

        let fetched = if id.is_remote() && !self.is_demo_data() {
            let path = format!("/etablissements/{}/images", segment(&key));
            match self.api.get_value(&path).await {
                Ok(body) => first_image_url(&body, &self.origin),
                Err(e) => {
                    tracing::debug!(id = %key, error = %e, "No cover image from API");
                    None
                }
            }
        } else {
            None
        };

        let url = fetched.unwrap_or_else(random_stock_image);
        self.cover_cache.insert(key, url.clone());
        self.update_state(|s| {
            if let Some(e) = s.establishments.iter_mut().find(|e| &e.id == id) {
                if e.cover_image.is_none() {
                    e.cover_image = Some(url.clone());
                }
            }
        });
        url
    }

    /// Resolve covers for every loaded record that has none. Returns how many were resolved.
    pub async fn load_cover_images(&self) -> usize {
        let pending: Vec<EstablishmentId> = self
            .establishments()
            .into_iter()
            .filter(|e| e.cover_image.is_none())
            .map(|e| e.id)
            .collect();

        let resolved = stream::iter(pending.iter())
            .map(|id| self.load_cover_image(id))
            .buffer_unordered(MAX_CONCURRENT_COVER_FETCHES)
            .count()
            .await;

        tracing::debug!(resolved, "Cover images resolved");
        resolved
    }

    // ─── Admin mutations ─────────────────────────────────────────

    /// Create an establishment, then upload `image` if given (best-effort).
    pub async fn create(
        &self,
        payload: EstablishmentPayload,
        image: Option<ImageUpload>,
    ) -> Result<MutationOutcome, MutationError> {
        let payload = validated(payload)?;

        if self.is_demo_data() {
            let mut record = blank_record(EstablishmentId::Generated(crate::random::base36_token(9)));
            record.apply(&payload);
            record.cover_image = Some(random_stock_image());
            self.update_state(|s| s.establishments.push(record.clone()));
            return Ok(MutationOutcome {
                establishment: Some(record),
                persisted: false,
                message: "Establishment created (demo mode, not saved to the server)".to_string(),
            });
        }

        let body = self
            .api
            .post_json("/admin/etablissements", &payload)
            .await
            .map_err(|e| self.mutation_error(e))?;

        let id = created_id(&body)
            .map(EstablishmentId::Remote)
            .unwrap_or_else(|| EstablishmentId::Generated(crate::random::base36_token(9)));
        let mut record = blank_record(id.clone());
        record.apply(&payload);
        tracing::info!(id = %id, "Establishment created");

        if let Some(image) = image {
            if id.is_remote() {
                if let Some(url) = self.upload_image(&id, image).await {
                    self.cover_cache.insert(id.as_str().to_string(), url.clone());
                    record.cover_image = Some(url);
                }
            } else {
                tracing::warn!("Create response had no id, skipping image upload");
            }
        }

        self.update_state(|s| s.establishments.push(record.clone()));
        Ok(MutationOutcome {
            establishment: Some(record),
            persisted: true,
            message: "Establishment created".to_string(),
        })
    }

    /// Upload an image for `id`. Failures are logged, never returned.
    async fn upload_image(&self, id: &EstablishmentId, image: ImageUpload) -> Option<String> {
        let part = match reqwest::multipart::Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.mime_type)
        {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid image mime type, skipping upload");
                return None;
            }
        };
        let form = reqwest::multipart::Form::new().part("image", part);

        let path = format!("/etablissements/{}/images", segment(id.as_str()));
        match self.api.post_multipart(&path, form).await {
            Ok(body) => {
                tracing::info!(id = %id, "Image uploaded");
                let uploaded = single_record(&body).map(|r| serde_json::Value::Array(vec![r.clone()]));
                uploaded.and_then(|list| first_image_url(&list, &self.origin))
            }
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "Image upload failed, establishment kept");
                None
            }
        }
    }

    /// Replace the scalar fields of an establishment.
    pub async fn update(
        &self,
        id: &EstablishmentId,
        payload: EstablishmentPayload,
    ) -> Result<MutationOutcome, MutationError> {
        let mut payload = validated(payload)?;
        let current = self
            .find(id)
            .ok_or_else(|| MutationError::NotFound(id.to_string()))?;
        if payload.rating.is_none() {
            payload.rating = Some(current.rating);
        }

        let persisted = self.can_persist(id);
        if persisted {
            self.api
                .put_json(
                    &format!("/admin/etablissements/{}", segment(id.as_str())),
                    &payload,
                )
                .await
                .map_err(|e| self.mutation_error(e))?;
            tracing::info!(id = %id, "Establishment updated");
        }

        let updated = self
            .update_state(|s| {
                s.establishments.iter_mut().find(|e| &e.id == id).map(|e| {
                    e.apply(&payload);
                    e.clone()
                })
            })
            .flatten();

        Ok(MutationOutcome {
            establishment: updated,
            persisted,
            message: if persisted {
                "Establishment updated".to_string()
            } else {
                "Establishment updated (demo mode, not saved to the server)".to_string()
            },
        })
    }

    /// Delete an establishment and, best-effort, its images.
    pub async fn delete(&self, id: &EstablishmentId) -> Result<MutationOutcome, MutationError> {
        if self.find(id).is_none() {
            return Err(MutationError::NotFound(id.to_string()));
        }

        let persisted = self.can_persist(id);
        if persisted {
            let key = segment(id.as_str());
            if let Err(e) = self.api.delete(&format!("/images/{}", key)).await {
                tracing::warn!(id = %id, error = %e, "Could not delete establishment images");
            }
            self.api
                .delete(&format!("/admin/etablissements/{}", key))
                .await
                .map_err(|e| self.mutation_error(e))?;
            tracing::info!(id = %id, "Establishment deleted");
        }

        self.update_state(|s| s.establishments.retain(|e| &e.id != id));
        Ok(MutationOutcome {
            establishment: None,
            persisted,
            message: if persisted {
                "Establishment deleted".to_string()
            } else {
                "Establishment deleted (demo mode, not saved to the server)".to_string()
            },
        })
    }

    /// Only server ids outside demo mode reach the API.
    fn can_persist(&self, id: &EstablishmentId) -> bool {
        id.is_remote() && !self.is_demo_data()
    }

    fn mutation_error(&self, err: ApiError) -> MutationError {
        match err {
            ApiError::Forbidden(message) => {
                let role = self.session.role();
                let token_present = self.session.is_authenticated();
                tracing::warn!(role = role.as_str(), token_present, "Mutation forbidden");
                MutationError::Forbidden {
                    role,
                    token_present,
                    message,
                }
            }
            ApiError::Unauthorized => MutationError::SessionExpired,
            ApiError::NotFound(msg) => MutationError::NotFound(msg),
            ApiError::Network(msg) => MutationError::Network(msg),
            e @ ApiError::Validation { .. } => MutationError::Validation(e),
            other => MutationError::Api(other),
        }
    }
}

fn validated(payload: EstablishmentPayload) -> Result<EstablishmentPayload, MutationError> {
    let payload = payload.normalized();
    payload
        .validate()
        .map_err(|e| MutationError::Validation(validation_from(e)))?;
    Ok(payload)
}

fn blank_record(id: EstablishmentId) -> Establishment {
    Establishment {
        id,
        name: String::new(),
        kind: String::new(),
        address: String::new(),
        phone_number: None,
        email: None,
        website: None,
        description: String::new(),
        rating: crate::models::DEFAULT_RATING,
        cover_image: None,
    }
}
