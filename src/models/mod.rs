// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the client.

pub mod establishment;
pub mod review;
pub mod user;

pub use establishment::{
    Establishment, EstablishmentId, EstablishmentPayload, ImageUpload, DEFAULT_RATING,
};
pub use review::{Review, ReviewPayload};
pub use user::{admin_signal, AdminSignal, Role, Session, UserProfile};
