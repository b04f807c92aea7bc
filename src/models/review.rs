// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Review model.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// A user review of one establishment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "bindings/")
)]
pub struct Review {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub author_id: Option<u64>,
    pub author_name: String,
    pub body: String,
    /// 1 ..= 5
    pub rating: u8,
    /// ISO 8601
    pub created_at: String,
}

/// Body of a create/update review request.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct ReviewPayload {
    #[serde(rename = "commentaire")]
    #[validate(length(min = 1, message = "Please write a review"))]
    pub body: String,
    #[serde(rename = "note")]
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: u8,
}
