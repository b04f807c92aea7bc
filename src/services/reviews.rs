// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User reviews of establishments.

use crate::error::{validation_from, ApiError};
use crate::models::{EstablishmentId, Review, ReviewPayload};
use crate::services::auth::SessionManager;
use crate::services::http::{segment, ApiClient};
use crate::services::normalize::{created_id, normalize_reviews};
use crate::time_utils::now_rfc3339;
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ReviewError {
    #[error("Please sign in to review establishments")]
    NotSignedIn,

    #[error("Could not determine your user id, please sign in again")]
    UnknownUser,

    #[error("You have already reviewed this establishment")]
    AlreadyReviewed,

    #[error("Only the author can change this review")]
    NotAuthor,

    #[error("{0}")]
    Validation(ApiError),

    #[error("Session expired, please sign in again")]
    SessionExpired,

    #[error("You do not have permission to do this: {0}")]
    Forbidden(String),

    #[error("No response from server: {0}")]
    Network(String),

    #[error("Demo establishments cannot be reviewed")]
    NotPersisted,

    #[error(transparent)]
    Api(ApiError),
}

impl From<ApiError> for ReviewError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized => ReviewError::SessionExpired,
            ApiError::Forbidden(msg) => ReviewError::Forbidden(msg),
            ApiError::Network(msg) => ReviewError::Network(msg),
            e @ ApiError::Validation { .. } => ReviewError::Validation(e),
            other => ReviewError::Api(other),
        }
    }
}

#[derive(Serialize)]
struct CreateReview<'a> {
    #[serde(flatten)]
    review: &'a ReviewPayload,
    etablissement_id: &'a str,
    user_id: u64,
}

/// Update goes through POST with a method override.
#[derive(Serialize)]
struct UpdateReview<'a> {
    #[serde(flatten)]
    review: &'a ReviewPayload,
    #[serde(rename = "_method")]
    method: &'static str,
}

/// Mean rating of `reviews`, `None` when there are none.
pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let sum: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    Some(f64::from(sum) / reviews.len() as f64)
}

pub struct ReviewService {
    api: ApiClient,
    session: Arc<SessionManager>,
}

impl ReviewService {
    pub fn new(api: ApiClient, session: Arc<SessionManager>) -> Self {
        Self { api, session }
    }

    /// Reviews of one establishment. Demo records have none.
    pub async fn list(&self, establishment: &EstablishmentId) -> Result<Vec<Review>, ReviewError> {
        if !establishment.is_remote() {
            return Ok(Vec::new());
        }
        let path = format!("/etablissements/{}/avis", segment(establishment.as_str()));
        let body = self.api.get_value(&path).await?;
        let reviews = normalize_reviews(&body);
        tracing::debug!(establishment = %establishment, count = reviews.len(), "Reviews loaded");
        Ok(reviews)
    }

    /// Whether the signed-in user already reviewed this establishment.
    pub fn has_reviewed(&self, reviews: &[Review]) -> bool {
        let Some(user_id) = self.session.current_user_id() else {
            return false;
        };
        reviews.iter().any(|r| r.author_id == Some(user_id))
    }

    /// Post a review. One review per user and establishment.
    pub async fn create(
        &self,
        establishment: &EstablishmentId,
        body: &str,
        rating: u8,
    ) -> Result<Review, ReviewError> {
        let user_id = self.author_id()?;
        let payload = validated(body, rating)?;
        if !establishment.is_remote() {
            return Err(ReviewError::NotPersisted);
        }

        let existing = self.list(establishment).await?;
        if self.has_reviewed(&existing) {
            return Err(ReviewError::AlreadyReviewed);
        }

        let path = format!("/etablissements/{}/avis", segment(establishment.as_str()));
        let request = CreateReview {
            review: &payload,
            etablissement_id: establishment.as_str(),
            user_id,
        };
        let response = self.api.post_json(&path, &request).await?;

        let id = created_id(&response)
            .and_then(|id| id.parse().ok())
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis().unsigned_abs());
        tracing::info!(establishment = %establishment, review_id = id, "Review created");

        Ok(Review {
            id,
            author_id: Some(user_id),
            author_name: self.session.display_name(),
            body: payload.body,
            rating: payload.rating,
            created_at: now_rfc3339(),
        })
    }

    /// Change the text and rating of one's own review.
    pub async fn update(&self, review: &Review, body: &str, rating: u8) -> Result<Review, ReviewError> {
        self.ensure_author(review)?;
        let payload = validated(body, rating)?;

        let request = UpdateReview {
            review: &payload,
            method: "PUT",
        };
        self.api
            .post_json(&format!("/avis/{}", review.id), &request)
            .await?;
        tracing::info!(review_id = review.id, "Review updated");

        Ok(Review {
            body: payload.body,
            rating: payload.rating,
            ..review.clone()
        })
    }

    /// Delete one's own review.
    pub async fn delete(&self, review: &Review) -> Result<(), ReviewError> {
        self.ensure_author(review)?;
        self.api.delete(&format!("/avis/{}", review.id)).await?;
        tracing::info!(review_id = review.id, "Review deleted");
        Ok(())
    }

    fn author_id(&self) -> Result<u64, ReviewError> {
        if !self.session.is_authenticated() {
            return Err(ReviewError::NotSignedIn);
        }
        self.session.current_user_id().ok_or(ReviewError::UnknownUser)
    }

    fn ensure_author(&self, review: &Review) -> Result<(), ReviewError> {
        let user_id = self.author_id()?;
        if review.author_id != Some(user_id) {
            return Err(ReviewError::NotAuthor);
        }
        Ok(())
    }
}

fn validated(body: &str, rating: u8) -> Result<ReviewPayload, ReviewError> {
    let payload = ReviewPayload {
        body: body.trim().to_string(),
        rating,
    };
    payload
        .validate()
        .map_err(|e| ReviewError::Validation(validation_from(e)))?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: u8) -> Review {
        Review {
            id: 1,
            author_id: Some(7),
            author_name: "Ana".into(),
            body: "ok".into(),
            rating,
            created_at: "2026-01-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn test_average_rating() {
        assert_eq!(average_rating(&[]), None);
        assert_eq!(average_rating(&[review(4), review(5)]), Some(4.5));
    }

    #[test]
    fn test_validation_rejects_blank_and_out_of_range() {
        assert!(matches!(validated("   ", 3), Err(ReviewError::Validation(_))));
        assert!(matches!(validated("Nice", 0), Err(ReviewError::Validation(_))));
        assert!(matches!(validated("Nice", 6), Err(ReviewError::Validation(_))));
        assert_eq!(validated(" Nice ", 5).unwrap().body, "Nice");
    }

    #[test]
    fn test_update_body_uses_method_override() {
        let payload = validated("Good", 4).unwrap();
        let json = serde_json::to_value(UpdateReview {
            review: &payload,
            method: "PUT",
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"commentaire": "Good", "note": 4, "_method": "PUT"})
        );
    }
}
