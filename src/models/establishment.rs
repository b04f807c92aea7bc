// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Establishment model (hotels, restaurants, bars...).

use serde::{Serialize, Serializer};
use std::fmt;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Rating used when the source record carries none.
pub const DEFAULT_RATING: f64 = 3.5;

/// Establishment identifier.
///
/// Server ids and client-generated ids are kept apart: only a `Remote` id may
/// be sent back to the API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EstablishmentId {
    /// Assigned by the server (`id` or `_id`)
    Remote(String),
    /// Generated locally because the payload had no usable id
    Generated(String),
}

impl EstablishmentId {
    pub fn as_str(&self) -> &str {
        match self {
            EstablishmentId::Remote(s) | EstablishmentId::Generated(s) => s,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, EstablishmentId::Remote(_))
    }
}

impl fmt::Display for EstablishmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl Serialize for EstablishmentId {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

/// Canonical establishment record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "bindings/")
)]
pub struct Establishment {
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub id: EstablishmentId,
    pub name: String,
    /// Category, e.g. "Restaurant" or "Hôtel"
    #[serde(rename = "type")]
    pub kind: String,
    pub address: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub description: String,
    /// 0.0 ..= 5.0
    pub rating: f64,
    pub cover_image: Option<String>,
}

impl Establishment {
    /// Replace the editable fields with `payload`. Absent optional fields are
    /// cleared; an absent rating keeps the current one.
    pub fn apply(&mut self, payload: &EstablishmentPayload) {
        self.name = payload.name.clone();
        self.kind = payload.kind.clone();
        self.address = payload.address.clone();
        self.description = payload.description.clone().unwrap_or_default();
        if let Some(r) = payload.rating {
            self.rating = clamp_rating(r);
        }
        self.phone_number = payload.phone_number.clone();
        self.email = payload.email.clone();
        self.website = payload.website.clone();
    }
}

/// Fields sent when creating or updating an establishment. Absent optional
/// fields go out as `null` so an edit can clear them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Validate)]
pub struct EstablishmentPayload {
    #[serde(rename = "nom")]
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "Type is required"))]
    pub kind: String,
    #[serde(rename = "adresse")]
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    #[serde(rename = "telephone")]
    pub phone_number: Option<String>,
    #[validate(email(message = "Email address is invalid"))]
    pub email: Option<String>,
    #[serde(rename = "site_web")]
    #[validate(url(message = "Website must be a valid URL"))]
    pub website: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "note", skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 5.0, message = "Rating must be between 0 and 5"))]
    pub rating: Option<f64>,
}

impl EstablishmentPayload {
    /// Trim every field; blank optional fields become `None`.
    pub fn normalized(mut self) -> Self {
        fn opt(v: Option<String>) -> Option<String> {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        }
        self.name = self.name.trim().to_string();
        self.kind = self.kind.trim().to_string();
        self.address = self.address.trim().to_string();
        self.phone_number = opt(self.phone_number);
        self.email = opt(self.email);
        self.website = opt(self.website);
        self.description = opt(self.description);
        self
    }

    /// Payload pre-filled from an existing record (edit form).
    pub fn from_establishment(e: &Establishment) -> Self {
        Self {
            name: e.name.clone(),
            kind: e.kind.clone(),
            address: e.address.clone(),
            phone_number: e.phone_number.clone(),
            email: e.email.clone(),
            website: e.website.clone(),
            description: Some(e.description.clone()),
            rating: Some(e.rating),
        }
    }
}

/// Image attached to an establishment at creation time.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

pub fn clamp_rating(r: f64) -> f64 {
    if r.is_nan() {
        DEFAULT_RATING
    } else {
        r.clamp(0.0, 5.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_validation() {
        let ok = EstablishmentPayload {
            name: " Chez Nous ".into(),
            kind: "Restaurant".into(),
            address: "1 rue X".into(),
            email: Some("  ".into()),
            ..Default::default()
        }
        .normalized();
        assert_eq!(ok.name, "Chez Nous");
        assert!(ok.email.is_none());
        assert!(ok.validate().is_ok());

        let bad = EstablishmentPayload {
            rating: Some(7.0),
            email: Some("nope".into()),
            ..Default::default()
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("rating"));
    }

    #[test]
    fn test_payload_uses_api_field_names() {
        let p = EstablishmentPayload {
            name: "A".into(),
            kind: "Bar".into(),
            address: "B".into(),
            rating: Some(4.0),
            ..Default::default()
        };
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["nom"], "A");
        assert_eq!(v["adresse"], "B");
        assert_eq!(v["note"], 4.0);
        assert!(v["telephone"].is_null());
        assert!(v["email"].is_null());
    }

    #[test]
    fn test_apply_clears_removed_fields() {
        let mut e = Establishment {
            id: EstablishmentId::Remote("3".into()),
            name: "Chez Nous".into(),
            kind: "Bistrot".into(),
            address: "1 rue X".into(),
            phone_number: Some("0102030405".into()),
            email: Some("contact@cheznous.fr".into()),
            website: Some("https://cheznous.fr".into()),
            description: "Cuisine maison".into(),
            rating: 4.5,
            cover_image: Some("/img/1.jpg".into()),
        };
        let mut edit = EstablishmentPayload::from_establishment(&e);
        edit.email = Some("   ".into());
        edit.website = None;
        edit.rating = None;
        let edit = edit.normalized();

        e.apply(&edit);

        assert_eq!(e.email, None);
        assert_eq!(e.website, None);
        assert_eq!(e.phone_number.as_deref(), Some("0102030405"));
        assert_eq!(e.description, "Cuisine maison");
        assert_eq!(e.rating, 4.5);
        assert_eq!(e.cover_image.as_deref(), Some("/img/1.jpg"));
    }
}
