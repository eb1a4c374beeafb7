// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;

use crate::error::{ApiResult, ValidationErrors};
use crate::extractors::{Validate, ValidatedJson};
use crate::response::SuccessResponse;
use crate::service::AuthService;

/// Minimum password length in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

// =============================================================================
// Sign-up
// =============================================================================

/// Sign-up request body.
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    /// Email, compared case-insensitively.
    pub email: String,
    /// Password, at least 8 characters.
    pub password: String,
    /// Username, at least 1 character.
    pub username: String,
}

impl Validate for SignUpRequest {
    fn validate(&self) -> ApiResult<()> {
        let mut errors = ValidationErrors::new();
        if !is_email(&self.email) {
            errors.add("email", "Invalid email address");
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.add(
                "password",
                format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
            );
        }
        if self.username.is_empty() {
            errors.add("username", "Username must not be empty");
        }
        errors.into_result(())
    }
}

/// POST /auth/sign-up
///
/// Creates an account and returns `201` with a token pair.
pub async fn sign_up(
    State(auth): State<AuthService>,
    ValidatedJson(request): ValidatedJson<SignUpRequest>,
) -> ApiResult<impl IntoResponse> {
    let session = auth
        .sign_up(&request.email, &request.password, &request.username)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

// =============================================================================
// Sign-in
// =============================================================================

/// Sign-in request body.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    /// Email.
    pub email: String,
    /// Password.
    pub password: String,
}

impl Validate for SignInRequest {
    fn validate(&self) -> ApiResult<()> {
        let mut errors = ValidationErrors::new();
        if self.email.is_empty() {
            errors.add("email", "Email is required");
        }
        if self.password.is_empty() {
            errors.add("password", "Password is required");
        }
        errors.into_result(())
    }
}

/// POST /auth/sign-in
pub async fn sign_in(
    State(auth): State<AuthService>,
    ValidatedJson(request): ValidatedJson<SignInRequest>,
) -> ApiResult<impl IntoResponse> {
    let session = auth.sign_in(&request.email, &request.password).await?;
    Ok(Json(session))
}

// =============================================================================
// Sign-out and Refresh
// =============================================================================

/// Body carrying a refresh token.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    /// Raw refresh token.
    pub refresh_token: String,
}

impl Validate for RefreshTokenRequest {
    fn validate(&self) -> ApiResult<()> {
        Ok(())
    }
}

/// POST /auth/sign-out
///
/// Always `200 {"success": true}`.
pub async fn sign_out(
    State(auth): State<AuthService>,
    ValidatedJson(request): ValidatedJson<RefreshTokenRequest>,
) -> impl IntoResponse {
    auth.sign_out(&request.refresh_token).await;
    Json(SuccessResponse::ok())
}

/// POST /auth/refresh
pub async fn refresh(
    State(auth): State<AuthService>,
    ValidatedJson(request): ValidatedJson<RefreshTokenRequest>,
) -> ApiResult<impl IntoResponse> {
    let pair = auth.refresh(&request.refresh_token).await?;
    Ok(Json(pair))
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Accepts `local@domain.tld` with no whitespace.
fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((name, tld)) => !name.is_empty() && !tld.is_empty() && !name.ends_with('.'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_email() {
        assert!(is_email("a@x.com"));
        assert!(is_email("first.last@mail.example.org"));

        assert!(!is_email(""));
        assert!(!is_email("a@x"));
        assert!(!is_email("@x.com"));
        assert!(!is_email("a@.com"));
        assert!(!is_email("a@x."));
        assert!(!is_email("a@b@x.com"));
        assert!(!is_email("a b@x.com"));
    }

    #[test]
    fn test_sign_up_validation() {
        let ok = SignUpRequest {
            email: "a@x.com".into(),
            password: "password123".into(),
            username: "alice".into(),
        };
        assert!(ok.validate().is_ok());

        let short = SignUpRequest {
            password: "short".into(),
            ..ok
        };
        let err = short.validate().unwrap_err();
        assert_eq!(err.user_message(), "Password must be at least 8 characters");

        let empty = SignUpRequest {
            email: "a@x.com".into(),
            password: "password123".into(),
            username: String::new(),
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_refresh_request_is_camel_case() {
        let request: RefreshTokenRequest =
            serde_json::from_str(r#"{"refreshToken":"abc"}"#).unwrap();
        assert_eq!(request.refresh_token, "abc");
    }
}
