// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API error types and handling.
//!
//! Every error renders as `{"error": "<message>"}`. Server faults render a
//! generic message; the detail only goes to the log.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bulwark_core::{PasswordError, StoreError, UniqueField};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::SignerError;

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Message for duplicate emails.
pub const EMAIL_TAKEN: &str = "Email already taken";
/// Message for duplicate usernames.
pub const USERNAME_TAKEN: &str = "Username already taken";

// =============================================================================
// ApiError
// =============================================================================

/// API error type with HTTP status code mapping.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404).
    #[error("Not found: {message}")]
    NotFound {
        /// Error message.
        message: String,
    },

    /// Bad request (400).
    #[error("Bad request: {message}")]
    BadRequest {
        /// Error message.
        message: String,
    },

    /// Unauthenticated (401).
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Error message, shown to the client as is.
        message: String,
    },

    /// Authenticated but not allowed (403).
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Detail for the log; the client only sees `Forbidden`.
        message: String,
    },

    /// Validation error (422).
    #[error("Validation error: {message}")]
    Validation {
        /// Error message.
        message: String,
        /// Field-specific errors.
        #[source]
        errors: Option<ValidationErrors>,
    },

    /// Conflict (409).
    #[error("Conflict: {message}")]
    Conflict {
        /// Error message.
        message: String,
    },

    /// Internal server error (500).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message (for logging, not user-facing).
        message: String,
    },

    /// Storage error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Creates an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            errors: None,
        }
    }

    /// Creates a validation error with field errors.
    pub fn validation_with_errors(message: impl Into<String>, errors: ValidationErrors) -> Self {
        Self::Validation {
            message: message.into(),
            errors: Some(errors),
        }
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Store(e) => match e {
                StoreError::UniqueViolation { .. } => StatusCode::CONFLICT,
                StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Returns the error code for categorization in logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::BadRequest { .. } => "BAD_REQUEST",
            ApiError::Unauthorized { .. } => "UNAUTHORIZED",
            ApiError::Forbidden { .. } => "FORBIDDEN",
            ApiError::Validation { .. } => "VALIDATION_ERROR",
            ApiError::Conflict { .. } => "CONFLICT",
            ApiError::Internal { .. } => "INTERNAL_ERROR",
            ApiError::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns the message shown to the client.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::NotFound { message }
            | ApiError::BadRequest { message }
            | ApiError::Unauthorized { message }
            | ApiError::Validation { message, .. }
            | ApiError::Conflict { message } => message.clone(),
            ApiError::Forbidden { .. } => "Forbidden".to_string(),
            ApiError::Internal { .. } => "Internal server error".to_string(),
            ApiError::Store(e) => match e {
                StoreError::UniqueViolation { field } => conflict_message(field).to_string(),
                StoreError::NotFound { .. } => "Not found".to_string(),
                _ => "Internal server error".to_string(),
            },
        }
    }

    /// Returns `true` if this error should be logged at error level.
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    fn error_details(&self) -> Option<serde_json::Value> {
        match self {
            ApiError::Validation {
                errors: Some(errors),
                ..
            } => serde_json::to_value(errors).ok(),
            _ => None,
        }
    }
}

/// Client message for a collided column.
pub fn conflict_message(field: &UniqueField) -> &'static str {
    match field {
        UniqueField::Email => EMAIL_TAKEN,
        UniqueField::Username => USERNAME_TAKEN,
        _ => "Conflict",
    }
}

// =============================================================================
// IntoResponse Implementation
// =============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        if self.is_server_error() {
            tracing::error!(
                error = %self,
                error_code = error_code,
                status = %status,
                "Server error occurred"
            );
        } else {
            tracing::debug!(
                error = %self,
                error_code = error_code,
                status = %status,
                "Client error occurred"
            );
        }

        let body = ErrorResponseBody {
            error: self.user_message(),
            details: self.error_details(),
        };

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Error Response Body
// =============================================================================

/// Error response body structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseBody {
    /// Human-readable error message.
    pub error: String,
    /// Field errors for validation failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Collection of field validation errors.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ValidationErrors {
    /// Field-specific errors.
    pub fields: Vec<FieldError>,
}

impl ValidationErrors {
    /// Creates a new validation errors collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field error.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Returns `true` if there are no errors.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Converts to an ApiError if there are errors.
    ///
    /// The top-level message is the first field message.
    pub fn into_result<T>(self, success: T) -> ApiResult<T> {
        match self.fields.first() {
            None => Ok(success),
            Some(first) => {
                let message = first.message.clone();
                Err(ApiError::validation_with_errors(message, self))
            }
        }
    }
}

impl std::error::Error for ValidationErrors {}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} validation errors", self.fields.len())
    }
}

/// A single field validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name.
    pub field: String,
    /// Error message.
    pub message: String,
}

// =============================================================================
// From Implementations
// =============================================================================

impl From<SignerError> for ApiError {
    fn from(err: SignerError) -> Self {
        ApiError::internal(err.to_string())
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::internal(format!("Blocking task failed: {}", err))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(ApiError::not_found("user").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::bad_request("invalid").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::unauthorized("no token").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden("no access").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::validation("invalid field").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(ApiError::conflict("taken").status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::internal("crash").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_error_mapping() {
        let email = ApiError::from(StoreError::unique(UniqueField::Email));
        assert_eq!(email.status_code(), StatusCode::CONFLICT);
        assert_eq!(email.user_message(), EMAIL_TAKEN);

        let username = ApiError::from(StoreError::unique(UniqueField::Username));
        assert_eq!(username.user_message(), USERNAME_TAKEN);

        let down = ApiError::from(StoreError::connection("pool timed out"));
        assert!(down.is_server_error());
        assert_eq!(down.user_message(), "Internal server error");
    }

    #[tokio::test]
    async fn test_body_shape() {
        let (status, body) = body_json(ApiError::unauthorized("Invalid credentials")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, serde_json::json!({ "error": "Invalid credentials" }));
    }

    #[tokio::test]
    async fn test_forbidden_is_generic() {
        let (_, body) = body_json(ApiError::forbidden("Admin, ResourceOwner:userId denied")).await;
        assert_eq!(body, serde_json::json!({ "error": "Forbidden" }));
    }

    #[tokio::test]
    async fn test_internal_hides_detail() {
        let (status, body) = body_json(ApiError::internal("disk on fire")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }

    #[test]
    fn test_validation_errors() {
        let mut errors = ValidationErrors::new();
        assert!(errors.is_empty());

        errors.add("email", "Invalid email address");
        errors.add("password", "Password must be at least 8 characters");

        let err = errors.into_result(()).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.user_message(), "Invalid email address");
    }
}
