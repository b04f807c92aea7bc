// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP client for the establishments API.
//!
//! Handles:
//! - Bearer token attachment (from the default credential or the store)
//! - Request/response logging
//! - The global 401 interceptor (clear auth state, go to the login screen)
//! - Mapping responses onto [`ApiError`]

use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::navigation::{redirect_to_login, Navigator};
use crate::store::ClientStore;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, RwLock};

/// Called after the 401 interceptor has cleared the credentials.
pub type UnauthorizedHook = Arc<dyn Fn() + Send + Sync>;

/// API client shared by every service. Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: ClientStore,
    navigator: Arc<dyn Navigator>,
    /// Credential set at login; takes precedence over the store
    default_token: Arc<RwLock<Option<String>>>,
    on_unauthorized: Arc<RwLock<Option<UnauthorizedHook>>>,
}

impl ApiClient {
    /// Build the client. The base address is fixed for the client's lifetime.
    pub fn new(config: &Config, store: ClientStore, navigator: Arc<dyn Navigator>) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.api_root(),
            store,
            navigator,
            default_token: Arc::new(RwLock::new(None)),
            on_unauthorized: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &ClientStore {
        &self.store
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// Absolute URL for an endpoint path such as `/etablissements`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn set_default_token(&self, token: &str) {
        if let Ok(mut t) = self.default_token.write() {
            *t = Some(token.to_string());
        }
    }

    pub fn clear_default_token(&self) {
        if let Ok(mut t) = self.default_token.write() {
            *t = None;
        }
    }

    /// Install the hook run by the 401 interceptor. Shared by every clone;
    /// a later call replaces the previous hook.
    pub fn on_unauthorized(&self, hook: UnauthorizedHook) {
        if let Ok(mut h) = self.on_unauthorized.write() {
            *h = Some(hook);
        }
    }

    /// Token attached to the next request, if any.
    pub fn resolve_token(&self) -> Option<String> {
        self.default_token
            .read()
            .ok()
            .and_then(|t| t.clone())
            .or_else(|| self.store.token())
    }

    // ─── Verbs ───────────────────────────────────────────────────

    pub async fn get_value(&self, path: &str) -> Result<Value> {
        self.execute(Method::GET, path, |r| r).await
    }

    /// GET and deserialize the body into `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self.get_value(path).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Malformed(e.to_string()))
    }

    pub async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        self.execute(Method::POST, path, |r| r.json(body)).await
    }

    pub async fn put_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        self.execute(Method::PUT, path, |r| r.json(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value> {
        self.execute(Method::DELETE, path, |r| r).await
    }

    /// POST a multipart form (image upload).
    pub async fn post_multipart(&self, path: &str, form: reqwest::multipart::Form) -> Result<Value> {
        self.execute(Method::POST, path, |r| r.multipart(form)).await
    }

    // ─── Dispatch ────────────────────────────────────────────────

    async fn execute<F>(&self, method: Method, path: &str, build: F) -> Result<Value>
    where
        F: FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    {
        let token = self.resolve_token();
        let mut request = build(self.http.request(method.clone(), self.url(path)));
        if let Some(t) = &token {
            request = request.bearer_auth(t);
        }

        tracing::debug!(method = %method, path, authenticated = token.is_some(), "API request");

        let response = request.send().await.map_err(|e| {
            tracing::warn!(method = %method, path, error = %e, "API request failed without response");
            ApiError::Network(e.to_string())
        })?;

        self.check_response(response, &method, path).await
    }

    /// Check response status and parse the JSON body.
    async fn check_response(
        &self,
        response: reqwest::Response,
        method: &Method,
        path: &str,
    ) -> Result<Value> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("Failed to read response body: {}", e)))?;

        if status.is_success() {
            tracing::debug!(method = %method, path, status = status.as_u16(), "API response");
            if body.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&body).map_err(|e| {
                tracing::warn!(path, error = %e, "Response body is not JSON");
                ApiError::Malformed(format!("JSON parse error: {}", e))
            });
        }

        if status.as_u16() == 401 {
            tracing::info!(path, "Session expired, signing out");
            self.handle_unauthorized();
            return Err(ApiError::Unauthorized);
        }

        let err = ApiError::from_status(status.as_u16(), &body);
        tracing::warn!(method = %method, path, status = status.as_u16(), error = %err, "API error");
        Err(err)
    }

    /// Global 401 handling: drop every credential and show the login screen.
    fn handle_unauthorized(&self) {
        self.store.clear_auth();
        self.clear_default_token();
        let hook = self.on_unauthorized.read().ok().and_then(|h| h.clone());
        if let Some(hook) = hook {
            hook();
        }
        redirect_to_login(self.navigator.as_ref());
    }
}

/// Percent-encode one path segment.
pub fn segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}
