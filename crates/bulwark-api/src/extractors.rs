// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Custom extractors for API handlers.

use std::convert::Infallible;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use crate::auth::{AuthContext, Caller, RouteParams};
use crate::error::{ApiError, ApiResult};

// =============================================================================
// Auth Extractor
// =============================================================================

/// Extractor for authenticated requests.
///
/// Reads the [`Caller`] left by the guard. Returns 401 if no identity was
/// resolved.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(Auth(ctx): Auth) -> impl IntoResponse {
///     format!("Hello, {}", ctx.username)
/// }
/// ```
pub struct Auth(pub AuthContext);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .and_then(|caller| caller.identity().cloned())
            .map(Auth)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

// =============================================================================
// Optional Auth Extractor
// =============================================================================

/// Extractor for optionally authenticated requests.
pub struct OptionalAuth(pub Option<AuthContext>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = parts
            .extensions
            .get::<Caller>()
            .and_then(|caller| caller.identity().cloned());
        Ok(OptionalAuth(ctx))
    }
}

// =============================================================================
// Route Params Extractor
// =============================================================================

/// Route parameters after `me` resolution.
///
/// Handlers behind [`MeResolverLayer`](crate::middleware::MeResolverLayer)
/// must read their ids from here rather than from `Path`.
pub struct Params(pub RouteParams);

impl Params {
    /// Returns a required parameter or a `400`.
    pub fn require(&self, name: &str) -> ApiResult<&str> {
        self.0
            .get(name)
            .ok_or_else(|| ApiError::bad_request(format!("Missing route parameter '{}'", name)))
    }
}

impl<S> FromRequestParts<S> for Params
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RouteParams>()
            .cloned()
            .map(Params)
            .ok_or_else(|| ApiError::internal("Route parameters were not resolved"))
    }
}

// =============================================================================
// Validated JSON Extractor
// =============================================================================

/// Request bodies that check their own fields.
pub trait Validate {
    /// Returns a `422` describing the first invalid field.
    fn validate(&self) -> ApiResult<()>;
}

/// Extractor for validated JSON payloads.
///
/// Malformed JSON is a `400`; well-formed JSON with missing or mistyped
/// fields, or that fails [`Validate`], is a `422`.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(
        req: axum::http::Request<axum::body::Body>,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;

        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    match rejection {
        JsonRejection::JsonDataError(e) => ApiError::validation(e.body_text()),
        other => ApiError::bad_request(other.body_text()),
    }
}

// =============================================================================
// Tests
// =============================================================================
