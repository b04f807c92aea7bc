// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Bytes;
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use dashmap::DashMap;
use etab_client::config::Config;
use etab_client::navigation::HistoryNavigator;
use etab_client::store::ClientStore;
use etab_client::App;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

/// Path prefix the client puts in front of every endpoint.
const PREFIX: &str = "/api/groupe-8";

/// A request the mock API received.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub body: String,
}

/// One part of a multipart upload the mock API received.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct UploadedPart {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
enum Canned {
    Json(u16, Value),
    Raw(u16, String),
}

#[derive(Default)]
struct MockState {
    routes: DashMap<String, Canned>,
    requests: Mutex<Vec<Recorded>>,
    uploads: Mutex<Vec<UploadedPart>>,
}

/// In-process stand-in for the establishments REST API.
///
/// Responses are keyed by `"METHOD /path"` with the group prefix stripped.
/// Unknown routes answer 404, except image uploads, which are parsed as
/// multipart and answer with the stored file's URL unless a response is set.
pub struct MockApi {
    addr: SocketAddr,
    state: Arc<MockState>,
}

#[allow(dead_code)]
impl MockApi {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let router = Router::new()
            .route(
                &format!("{}/etablissements/{{id}}/images", PREFIX),
                post(handle_upload),
            )
            .fallback(handle)
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock API");
        let addr = listener.local_addr().expect("No local address");
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        Self { addr, state }
    }

    /// Answer `method path` with `status` and a JSON body.
    pub fn on(&self, method: &str, path: &str, status: u16, body: Value) -> &Self {
        self.state
            .routes
            .insert(route_key(method, path), Canned::Json(status, body));
        self
    }

    /// Answer `method path` with a non-JSON body.
    pub fn on_raw(&self, method: &str, path: &str, status: u16, body: &str) -> &Self {
        self.state
            .routes
            .insert(route_key(method, path), Canned::Raw(status, body.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Parts of every multipart upload, in arrival order.
    pub fn uploads(&self) -> Vec<UploadedPart> {
        self.state.uploads.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method.as_str() == method && r.path == path)
            .count()
    }

    pub fn last(&self, method: &str, path: &str) -> Option<Recorded> {
        self.requests()
            .into_iter()
            .rev()
            .find(|r| r.method.as_str() == method && r.path == path)
    }

    pub fn config(&self) -> Config {
        Config {
            api_base_url: format!("http://{}/api", self.addr),
            ..Config::test_default()
        }
    }
}

fn route_key(method: &str, path: &str) -> String {
    format!("{} {}", method.to_uppercase(), path)
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path()
        .strip_prefix(PREFIX)
        .unwrap_or(uri.path())
        .to_string();

    state.requests.lock().unwrap().push(Recorded {
        method: method.clone(),
        path: path.clone(),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    respond(&state, method.as_str(), &path)
        .unwrap_or_else(|| not_found(&path))
}

async fn handle_upload(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let path = format!("/etablissements/{}/images", id);
    let mut parts = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        parts.push(UploadedPart {
            field: name,
            file_name,
            content_type,
            bytes,
        });
    }

    state.requests.lock().unwrap().push(Recorded {
        method: Method::POST,
        path: path.clone(),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: parts.iter().map(|p| p.field.as_str()).collect::<Vec<_>>().join(","),
    });

    let stored = parts
        .iter()
        .find_map(|p| p.file_name.clone())
        .unwrap_or_else(|| "upload.bin".to_string());
    state.uploads.lock().unwrap().extend(parts);

    respond(&state, "POST", &path).unwrap_or_else(|| {
        (
            StatusCode::CREATED,
            axum::Json(json!({"data": {"id": 1, "url": format!("/storage/images/{}", stored)}})),
        )
            .into_response()
    })
}

fn respond(state: &MockState, method: &str, path: &str) -> Option<Response> {
    let canned = state.routes.get(&route_key(method, path)).map(|c| c.clone())?;
    Some(match canned {
        Canned::Json(status, value) => {
            (StatusCode::from_u16(status).unwrap(), axum::Json(value)).into_response()
        }
        Canned::Raw(status, text) => (StatusCode::from_u16(status).unwrap(), text).into_response(),
    })
}

fn not_found(path: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        axum::Json(json!({"message": format!("No route for {}", path)})),
    )
        .into_response()
}

/// App wired to `config` with an in-memory store.
#[allow(dead_code)]
pub fn app_with(config: Config, store: ClientStore) -> (App, Arc<HistoryNavigator>) {
    let navigator = Arc::new(HistoryNavigator::new("/etablissements"));
    let app = App::new(config, store, navigator.clone()).expect("Failed to build app");
    (app, navigator)
}

/// App talking to `api`, restored from an empty store.
#[allow(dead_code)]
pub fn test_app(api: &MockApi) -> (App, Arc<HistoryNavigator>) {
    let (app, nav) = app_with(api.config(), ClientStore::in_memory());
    app.session.restore();
    (app, nav)
}

/// App whose API is unreachable.
#[allow(dead_code)]
pub fn offline_app() -> (App, Arc<HistoryNavigator>) {
    let (app, nav) = app_with(Config::test_default(), ClientStore::in_memory());
    app.session.restore();
    (app, nav)
}

/// A raw establishment as the API sends it.
#[allow(dead_code)]
pub fn raw_establishment(id: u64, name: &str, kind: &str) -> Value {
    json!({
        "id": id,
        "nom": name,
        "type": kind,
        "adresse": "1 rue de la Gare, Paris",
        "description": "Une adresse du quartier.",
        "note": 4
    })
}

/// Sign `app` in as user 7 ("Ana") with `role`.
#[allow(dead_code)]
pub async fn sign_in(api: &MockApi, app: &App, role: &str) {
    api.on(
        "POST",
        "/auth/login",
        200,
        json!({"token": "t1", "user": {"id": 7, "name": "Ana", "email": "ana@example.com", "role": role}}),
    );
    app.session
        .login("ana@example.com", "secret1")
        .await
        .expect("login failed");
}
