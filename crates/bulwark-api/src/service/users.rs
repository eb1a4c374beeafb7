// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! User profile service.

use std::sync::Arc;

use bulwark_core::{Identity, IdentityUpdate, StoreError, UserId, UserRepository};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, ApiResult, USERNAME_TAKEN};

/// Message for unknown and deleted users.
pub const USER_NOT_FOUND: &str = "User not found";

/// Public profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// User id.
    pub user_id: UserId,
    /// Username.
    pub username: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<Identity> for UserProfile {
    fn from(identity: Identity) -> Self {
        Self {
            user_id: identity.user_id,
            username: identity.username,
            created_at: identity.created_at,
        }
    }
}

/// Reads and edits profiles of live identities.
#[derive(Debug, Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    /// Creates a new service.
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Returns the profile of a live identity.
    pub async fn get_profile(&self, user_id: &UserId) -> ApiResult<UserProfile> {
        self.live(user_id).await.map(UserProfile::from)
    }

    /// Changes the username of a live identity.
    pub async fn update_profile(
        &self,
        user_id: &UserId,
        username: Option<String>,
    ) -> ApiResult<UserProfile> {
        let current = self.live(user_id).await?;

        let Some(username) = username.filter(|u| *u != current.username) else {
            return Ok(current.into());
        };

        if let Some(other) = self.users.find_by_username(&username).await? {
            if other.user_id != *user_id {
                return Err(ApiError::conflict(USERNAME_TAKEN));
            }
        }

        let updated = self
            .users
            .update_identity(user_id, IdentityUpdate::new().with_username(username))
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => ApiError::not_found(USER_NOT_FOUND),
                other => ApiError::from(other),
            })?;

        info!(user_id = %user_id, "Profile updated");
        Ok(updated.into())
    }

    async fn live(&self, user_id: &UserId) -> ApiResult<Identity> {
        self.users
            .find_by_id(user_id)
            .await?
            .filter(Identity::is_live)
            .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;
    use crate::testing::fixture;

    #[tokio::test]
    async fn test_get_profile() {
        let fx = fixture().await;
        let session = fx.auth.sign_up("a@x.com", "password123", "alice").await.unwrap();

        let profile = fx.users.get_profile(&session.user.user_id).await.unwrap();
        assert_eq!(profile.username, "alice");

        let err = fx.users.get_profile(&UserId::new()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.user_message(), USER_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_deleted_profile_not_found() {
        let fx = fixture().await;
        let session = fx.auth.sign_up("a@x.com", "password123", "alice").await.unwrap();
        fx.store
            .update_identity(
                &session.user.user_id,
                IdentityUpdate::new().with_deleted_at(Utc::now()),
            )
            .await
            .unwrap();

        let err = fx.users.get_profile(&session.user.user_id).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_username() {
        let fx = fixture().await;
        let session = fx.auth.sign_up("a@x.com", "password123", "alice").await.unwrap();

        let profile = fx
            .users
            .update_profile(&session.user.user_id, Some("alicia".to_string()))
            .await
            .unwrap();
        assert_eq!(profile.username, "alicia");

        let unchanged = fx
            .users
            .update_profile(&session.user.user_id, None)
            .await
            .unwrap();
        assert_eq!(unchanged.username, "alicia");
    }

    #[tokio::test]
    async fn test_update_username_taken() {
        let fx = fixture().await;
        fx.auth.sign_up("b@x.com", "password123", "bob").await.unwrap();
        let session = fx.auth.sign_up("a@x.com", "password123", "alice").await.unwrap();

        let err = fx
            .users
            .update_profile(&session.user.user_id, Some("bob".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.user_message(), USERNAME_TAKEN);
    }
}
