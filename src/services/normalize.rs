// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Coercion of heterogeneous API payloads into canonical records.
//!
//! The backend has answered with several shapes over time. Field lookups use
//! first-available fallback chains where empty strings and zero count as
//! absent, the same way the web client read them.

use crate::models::establishment::clamp_rating;
use crate::models::{Establishment, EstablishmentId, Review, DEFAULT_RATING};
use crate::random;
use crate::time_utils::now_rfc3339;
use serde_json::{Map, Value};

/// Length of client-generated ids.
const GENERATED_ID_LEN: usize = 9;

/// Locate the record list in a collection response.
///
/// Tried in order: bare array, `data`, `etablissements`.
pub fn extract_records(body: &Value) -> Option<&Vec<Value>> {
    if let Value::Array(items) = body {
        return Some(items);
    }
    ["data", "etablissements"]
        .into_iter()
        .find_map(|key| body.get(key).and_then(Value::as_array))
}

/// Normalize a collection response. Unknown shapes yield an empty list.
pub fn normalize_collection(body: &Value) -> Vec<Establishment> {
    let Some(records) = extract_records(body) else {
        tracing::warn!("Unexpected establishments payload shape, treating as empty");
        return Vec::new();
    };

    let list: Vec<Establishment> = records.iter().filter_map(normalize_establishment).collect();
    if list.len() < records.len() {
        tracing::warn!(
            skipped = records.len() - list.len(),
            "Skipped establishment entries that are not objects"
        );
    }
    list
}

/// Normalize one raw record. Returns `None` for non-objects.
pub fn normalize_establishment(raw: &Value) -> Option<Establishment> {
    let obj = raw.as_object()?;

    let id = first_text(obj, &["id", "_id"])
        .map(EstablishmentId::Remote)
        .unwrap_or_else(|| EstablishmentId::Generated(random::base36_token(GENERATED_ID_LEN)));

    Some(Establishment {
        id,
        name: first_text(obj, &["nom", "name"]).unwrap_or_else(|| "Unnamed establishment".to_string()),
        kind: first_text(obj, &["type", "categorie"]).unwrap_or_else(|| "Unspecified".to_string()),
        address: first_text(obj, &["adresse", "address", "location"]).unwrap_or_default(),
        phone_number: first_text(obj, &["telephone", "phone", "phone_number"]),
        email: first_text(obj, &["email"]),
        website: first_text(obj, &["site_web", "website"]),
        description: first_text(obj, &["description", "desc"])
            .unwrap_or_else(|| "No description available.".to_string()),
        rating: first_number(obj, &["note", "moyenne", "rating", "avis"])
            .map(clamp_rating)
            .unwrap_or(DEFAULT_RATING),
        cover_image: first_text(obj, &["image", "image_url", "imageUrl", "cover_image"]),
    })
}

/// Unwrap a single-record response (`{...}` or `{"data": {...}}`).
pub fn single_record(body: &Value) -> Option<&Value> {
    match body.get("data") {
        Some(inner) if inner.is_object() => Some(inner),
        _ if body.is_object() => Some(body),
        _ => None,
    }
}

/// Id of a freshly created resource (`id` or `data.id`).
pub fn created_id(body: &Value) -> Option<String> {
    let obj = body.as_object()?;
    first_text(obj, &["id"]).or_else(|| {
        body.get("data")
            .and_then(Value::as_object)
            .and_then(|d| first_text(d, &["id"]))
    })
}

/// URL of the first image in an image-list response.
///
/// Relative paths are resolved against `origin` (the API host without `/api`).
pub fn first_image_url(body: &Value, origin: &str) -> Option<String> {
    let first = match body {
        Value::Array(items) => items.first(),
        _ => body.get("data").and_then(Value::as_array).and_then(|a| a.first()),
    }?;

    let url = match first {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Object(obj) => first_text(obj, &["url", "imageUrl", "path"])?,
        _ => return None,
    };
    Some(resolve_url(&url, origin))
}

fn resolve_url(url: &str, origin: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") || url.starts_with("data:") {
        url.to_string()
    } else {
        format!(
            "{}/{}",
            origin.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }
}

/// Host part of an API root such as `https://host/api/groupe-8`.
pub fn api_origin(api_root: &str) -> String {
    match api_root.find("/api") {
        Some(idx) => api_root[..idx].to_string(),
        None => api_root.trim_end_matches('/').to_string(),
    }
}

// ─── Reviews ─────────────────────────────────────────────────

/// Normalize a review list response (array or `data`).
pub fn normalize_reviews(body: &Value) -> Vec<Review> {
    let records = match body {
        Value::Array(items) => items,
        _ => match body.get("data").and_then(Value::as_array) {
            Some(items) => items,
            None => return Vec::new(),
        },
    };
    records.iter().filter_map(normalize_review).collect()
}

/// Normalize one review. Records without an id are dropped.
pub fn normalize_review(raw: &Value) -> Option<Review> {
    let obj = raw.as_object()?;
    let id = first_text(obj, &["id"])?.parse().ok()?;
    let user = obj.get("user").and_then(Value::as_object);

    let author_id = first_text(obj, &["user_id"])
        .or_else(|| user.and_then(|u| first_text(u, &["id"])))
        .and_then(|s| s.parse().ok());
    let author_name = user
        .and_then(|u| first_text(u, &["name", "username", "email"]))
        .or_else(|| first_text(obj, &["user_name", "author"]))
        .unwrap_or_else(|| "Anonymous".to_string());
    let rating = first_number(obj, &["note", "rating"])
        .map(|r| r.round().clamp(1.0, 5.0) as u8)
        .unwrap_or(1);

    Some(Review {
        id,
        author_id,
        author_name,
        body: first_text(obj, &["commentaire", "comment", "body", "contenu"]).unwrap_or_default(),
        rating,
        created_at: first_text(obj, &["created_at", "createdAt"])
            .unwrap_or_else(now_rfc3339),
    })
}

// ─── Field helpers ───────────────────────────────────────────

/// First non-empty string (or non-zero number, as text) among `keys`.
fn first_text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match obj.get(*k)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    })
}

/// First non-zero number (or numeric string) among `keys`.
fn first_number(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| {
        let n = match obj.get(*k)? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        (n != 0.0 && n.is_finite()).then_some(n)
    })
}
