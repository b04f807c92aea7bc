// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API error taxonomy shared by every service that talks to the backend.

use serde_json::Value;
use std::collections::BTreeMap;

/// Error returned by the HTTP client for any request to the establishments API.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// No response reached the client (offline, DNS, timeout).
    #[error("No response from server: {0}")]
    Network(String),

    /// 401: session invalid or expired. Already handled by the interceptor.
    #[error("Session expired, please sign in again")]
    Unauthorized,

    /// 403: authenticated but not allowed.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// 422: field-level feedback from the server.
    #[error("{}", validation_summary(.message, .fields))]
    Validation {
        message: String,
        fields: BTreeMap<String, Vec<String>>,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Any other status >= 400.
    #[error("Request failed ({status}): {message}")]
    Status { status: u16, message: String },

    /// 2xx with a body of unexpected shape.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl ApiError {
    /// Build the error for a non-success status from the raw response body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let json: Option<Value> = serde_json::from_str(body).ok();
        let message = json
            .as_ref()
            .and_then(|v| v.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    format!("HTTP {}", status)
                } else {
                    body.trim().to_string()
                }
            });

        match status {
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden(message),
            404 => ApiError::NotFound(message),
            422 => ApiError::Validation {
                fields: json
                    .as_ref()
                    .and_then(|v| v.get("errors"))
                    .map(field_errors)
                    .unwrap_or_default(),
                message,
            },
            500..=599 => ApiError::Server { status, message },
            _ => ApiError::Status { status, message },
        }
    }

    /// HTTP status carried by this error, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Network(_) | ApiError::Malformed(_) => None,
            ApiError::Unauthorized => Some(401),
            ApiError::Forbidden(_) => Some(403),
            ApiError::Validation { .. } => Some(422),
            ApiError::NotFound(_) => Some(404),
            ApiError::Server { status, .. } | ApiError::Status { status, .. } => Some(*status),
        }
    }

    /// Server-provided message, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Forbidden(m) | ApiError::NotFound(m) => Some(m),
            ApiError::Validation { message, .. }
            | ApiError::Server { message, .. }
            | ApiError::Status { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }
}

/// Flatten a Laravel-style `errors` object (`{"field": ["msg", ...]}`).
fn field_errors(errors: &Value) -> BTreeMap<String, Vec<String>> {
    let Some(obj) = errors.as_object() else {
        return BTreeMap::new();
    };

    obj.iter()
        .map(|(field, msgs)| {
            let list = match msgs {
                Value::Array(items) => items
                    .iter()
                    .filter_map(|m| m.as_str().map(str::to_string))
                    .collect(),
                Value::String(s) => vec![s.clone()],
                _ => Vec::new(),
            };
            (field.clone(), list)
        })
        .collect()
}

fn validation_summary(message: &str, fields: &BTreeMap<String, Vec<String>>) -> String {
    let all: Vec<&str> = fields.values().flatten().map(String::as_str).collect();
    if all.is_empty() {
        format!("Validation failed: {}", message)
    } else {
        format!("Validation failed:\n{}", all.join("\n"))
    }
}

/// Convert `validator` failures into the same shape the server uses for 422s.
pub fn validation_from(errors: validator::ValidationErrors) -> ApiError {
    let fields = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let msgs = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
                .collect();
            (field.to_string(), msgs)
        })
        .collect();

    ApiError::Validation {
        message: "Invalid input".to_string(),
        fields,
    }
}

/// Result type alias for API calls.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_uses_server_message() {
        let err = ApiError::from_status(500, r#"{"message":"boom"}"#);
        assert!(matches!(err, ApiError::Server { status: 500, ref message } if message == "boom"));
    }

    #[test]
    fn test_validation_lists_every_field_message() {
        let body = r#"{"message":"invalid","errors":{"email":["taken"],"password":["too short","needs a digit"]}}"#;
        let err = ApiError::from_status(422, body);
        let text = err.to_string();
        assert!(text.contains("taken"));
        assert!(text.contains("too short"));
        assert!(text.contains("needs a digit"));
    }

    #[test]
    fn test_empty_body_falls_back_to_status() {
        let err = ApiError::from_status(418, "");
        assert_eq!(err.server_message(), Some("HTTP 418"));
        assert_eq!(err.status(), Some(418));
    }
}
