// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! User profile handlers.
//!
//! Mounted behind the `me` resolver, so ids come from [`Params`].

use axum::{extract::State, Json};
use bulwark_core::UserId;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult, ValidationErrors};
use crate::extractors::{Params, Validate, ValidatedJson};
use crate::service::{UserProfile, UserService, USER_NOT_FOUND};

/// Route parameter naming the target user.
pub const USER_ID_PARAM: &str = "userId";

/// Profile update body.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    /// New username.
    #[serde(default)]
    pub username: Option<String>,
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> ApiResult<()> {
        let mut errors = ValidationErrors::new();
        if self.username.as_deref() == Some("") {
            errors.add("username", "Username must not be empty");
        }
        errors.into_result(())
    }
}

/// GET /users/{userId}
pub async fn get_user(
    State(users): State<UserService>,
    params: Params,
) -> ApiResult<Json<UserProfile>> {
    let user_id = target(&params)?;
    Ok(Json(users.get_profile(&user_id).await?))
}

/// PATCH /users/{userId}
pub async fn update_user(
    State(users): State<UserService>,
    params: Params,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<Json<UserProfile>> {
    let user_id = target(&params)?;
    Ok(Json(users.update_profile(&user_id, request.username).await?))
}

/// An id that does not parse names no user.
fn target(params: &Params) -> ApiResult<UserId> {
    let raw = params.require(USER_ID_PARAM)?;
    UserId::parse(raw).ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))
}
