// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication service.
//!
//! Sign-up, sign-in, sign-out and refresh on top of the signer, the
//! refresh-token store and the user/role repositories.
//!
//! Every token issuance looks the caller's roles up again, so an access
//! token always carries the memberships current at the time it was minted.
//!
//! Refresh tokens are tracked by the SHA-256 of the raw string. A refresh
//! keeps the presented token while its session has at least the renew
//! threshold left; below that the session is replaced by a new one with a
//! full lifetime. Two concurrent refreshes of the same token may both
//! rotate; each gets its own replacement.

use std::sync::Arc;
use std::time::Duration;

use bulwark_config::AuthConfig;
use bulwark_core::{
    normalize_email, Identity, NewAccount, PasswordHasher, RefreshTokenStore, RoleRepository,
    UserId, UserRepository,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::{hash_token, Claims, TokenSigner, TokenType};
use crate::error::{ApiError, ApiResult};

/// Message for every failed sign-in.
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
/// Message for every failed refresh.
pub const INVALID_REFRESH_TOKEN: &str = "Invalid or expired refresh token";

// =============================================================================
// Settings
// =============================================================================

/// Token lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSettings {
    /// Access token lifetime.
    pub auth_ttl: Duration,
    /// Refresh token lifetime.
    pub refresh_ttl: Duration,
    /// Sessions with less than this left are rotated on refresh.
    pub renew_threshold: Duration,
}

impl From<&AuthConfig> for TokenSettings {
    fn from(config: &AuthConfig) -> Self {
        Self {
            auth_ttl: Duration::from_secs(config.auth_token_ttl_secs),
            refresh_ttl: Duration::from_secs(config.refresh_token_ttl_secs),
            renew_threshold: Duration::from_secs(config.refresh_renew_threshold_secs),
        }
    }
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self::from(&AuthConfig::default())
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Public part of an identity returned with a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    /// User id.
    pub user_id: UserId,
    /// Username.
    pub username: String,
}

impl From<&Identity> for UserSummary {
    fn from(identity: &Identity) -> Self {
        Self {
            user_id: identity.user_id,
            username: identity.username.clone(),
        }
    }
}

/// Result of sign-up and sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    /// Access token.
    pub auth_token: String,
    /// Refresh token.
    pub refresh_token: String,
    /// The signed-in user.
    pub user: UserSummary,
}

/// Result of a refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// New access token.
    pub auth_token: String,
    /// Refresh token to use next time, possibly the one presented.
    pub refresh_token: String,
}

// =============================================================================
// AuthService
// =============================================================================

/// Orchestrates the session lifecycle.
#[derive(Debug, Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    roles: Arc<dyn RoleRepository>,
    sessions: Arc<dyn RefreshTokenStore>,
    hasher: Arc<dyn PasswordHasher>,
    signer: Arc<TokenSigner>,
    settings: TokenSettings,
}

impl AuthService {
    /// Creates a service with default token lifetimes.
    pub fn new(
        users: Arc<dyn UserRepository>,
        roles: Arc<dyn RoleRepository>,
        sessions: Arc<dyn RefreshTokenStore>,
        hasher: Arc<dyn PasswordHasher>,
        signer: Arc<TokenSigner>,
    ) -> Self {
        Self {
            users,
            roles,
            sessions,
            hasher,
            signer,
            settings: TokenSettings::default(),
        }
    }

    /// Sets the token lifetimes.
    pub fn with_settings(mut self, settings: TokenSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Returns the token lifetimes.
    pub fn settings(&self) -> &TokenSettings {
        &self.settings
    }

    /// Returns the signer.
    pub fn signer(&self) -> &Arc<TokenSigner> {
        &self.signer
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Creates an account and opens a session.
    ///
    /// Email and username uniqueness are checked in that order inside the
    /// store's transaction. A collision, whether caught by the pre-check or
    /// by the unique constraint, is a `409` naming the column.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> ApiResult<AuthSession> {
        let password_hash = self.hash_password(password).await?;
        let account = NewAccount::new(username, email, password_hash);

        let identity = self.users.create_account(account).await.map_err(|e| {
            if let Some(field) = e.unique_field() {
                debug!(field = %field, "Sign-up rejected");
            }
            ApiError::from(e)
        })?;

        info!(user_id = %identity.user_id, "Account created");
        self.open_session(&identity).await
    }

    /// Opens a session for existing credentials.
    ///
    /// Unknown email, soft-deleted identity and wrong password all produce
    /// the same `401`.
    pub async fn sign_in(&self, email: &str, password: &str) -> ApiResult<AuthSession> {
        let email = normalize_email(email);

        let account = match self.users.find_by_email(&email).await? {
            Some(account) if account.identity.is_live() => account,
            _ => {
                debug!("Sign-in for unknown or deleted account");
                return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
            }
        };

        if !self
            .verify_password(password, &account.credential.password_hash)
            .await?
        {
            debug!(user_id = %account.identity.user_id, "Sign-in with wrong password");
            return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
        }

        info!(user_id = %account.identity.user_id, "Signed in");
        self.open_session(&account.identity).await
    }

    /// Revokes a refresh token.
    ///
    /// Never fails: an unknown token or a store error is logged and
    /// otherwise ignored.
    pub async fn sign_out(&self, refresh_token: &str) {
        let token_hash = hash_token(refresh_token);

        match self.sessions.delete_by_hash(&token_hash).await {
            Ok(true) => info!("Refresh token revoked"),
            Ok(false) => debug!("Sign-out with unknown refresh token"),
            Err(e) => warn!(error = %e, "Failed to revoke refresh token"),
        }
    }

    /// Exchanges a refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> ApiResult<TokenPair> {
        let now = Utc::now();

        let claims = match self.signer.verify_at(refresh_token, now.timestamp()) {
            Ok(claims) if claims.is_type(TokenType::Refresh) => claims,
            Ok(claims) => {
                debug!(token_type = %claims.tt, "Refresh with wrong token type");
                return Err(invalid_refresh());
            }
            Err(reason) => {
                debug!(reason = %reason, "Refresh token rejected");
                return Err(invalid_refresh());
            }
        };

        let token_hash = hash_token(refresh_token);
        let Some(session) = self.sessions.find_by_hash(&token_hash).await? else {
            debug!("Refresh token has no session");
            return Err(invalid_refresh());
        };

        if session.is_expired(now) {
            self.sessions.delete_by_id(&session.id).await?;
            debug!(user_id = %session.user_id, "Expired session removed");
            return Err(invalid_refresh());
        }

        if claims.user_id() != Some(session.user_id) {
            warn!(user_id = %session.user_id, "Refresh token subject does not match its session");
            return Err(invalid_refresh());
        }

        let identity = match self.users.find_by_id(&session.user_id).await? {
            Some(identity) if identity.is_live() => identity,
            _ => {
                debug!(user_id = %session.user_id, "Refresh for unknown or deleted account");
                return Err(invalid_refresh());
            }
        };

        let auth_token = self.issue_auth_token(&identity).await?;

        let threshold = secs(self.settings.renew_threshold);
        let refresh_token = if session.remaining(now).num_seconds() < threshold {
            self.sessions.delete_by_id(&session.id).await?;
            let rotated = self.issue_refresh_token(&identity.user_id).await?;
            info!(user_id = %identity.user_id, "Refresh token rotated");
            rotated
        } else {
            debug!(user_id = %identity.user_id, "Refresh token kept");
            refresh_token.to_string()
        };

        Ok(TokenPair {
            auth_token,
            refresh_token,
        })
    }

    // =========================================================================
    // Issuance
    // =========================================================================

    async fn open_session(&self, identity: &Identity) -> ApiResult<AuthSession> {
        let auth_token = self.issue_auth_token(identity).await?;
        let refresh_token = self.issue_refresh_token(&identity.user_id).await?;

        Ok(AuthSession {
            auth_token,
            refresh_token,
            user: UserSummary::from(identity),
        })
    }

    async fn issue_auth_token(&self, identity: &Identity) -> ApiResult<String> {
        let roles = self.roles.roles_for_user(&identity.user_id).await?;

        let claims = Claims::builder(identity.user_id.to_string(), TokenType::Auth)
            .username(identity.username.clone())
            .roles(roles)
            .jti(Uuid::new_v4().to_string());
        Ok(self.signer.sign(claims, self.settings.auth_ttl)?)
    }

    async fn issue_refresh_token(&self, user_id: &UserId) -> ApiResult<String> {
        let issued_at = Utc::now().timestamp();
        let expires_at = DateTime::<Utc>::from_timestamp(
            issued_at.saturating_add(secs(self.settings.refresh_ttl)),
            0,
        )
        .ok_or_else(|| ApiError::internal("Refresh token expiry out of range"))?;

        let claims = Claims::builder(user_id.to_string(), TokenType::Refresh)
            .jti(Uuid::new_v4().to_string())
            .expires_at(expires_at.timestamp());
        let token = self
            .signer
            .sign_at(claims, self.settings.refresh_ttl, issued_at)?;

        self.sessions
            .insert(&hash_token(&token), user_id, expires_at)
            .await?;
        Ok(token)
    }

    // =========================================================================
    // Passwords
    // =========================================================================

    async fn hash_password(&self, password: &str) -> ApiResult<String> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        Ok(tokio::task::spawn_blocking(move || hasher.hash(&password)).await??)
    }

    async fn verify_password(&self, password: &str, hash: &str) -> ApiResult<bool> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        let hash = hash.to_owned();
        Ok(tokio::task::spawn_blocking(move || hasher.verify(&password, &hash)).await?)
    }
}

fn invalid_refresh() -> ApiError {
    ApiError::unauthorized(INVALID_REFRESH_TOKEN)
}

fn secs(duration: Duration) -> i64 {
    i64::try_from(duration.as_secs()).unwrap_or(i64::MAX)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use bulwark_core::IdentityUpdate;

    use super::*;
    use crate::testing::{fixture, fixture_with, Fixture};

    async fn alice(fx: &Fixture) -> AuthSession {
        fx.auth
            .sign_up("a@x.com", "password123", "alice")
            .await
            .unwrap()
    }

    async fn session_expiry(fx: &Fixture, token: &str) -> DateTime<Utc> {
        fx.store
            .find_by_hash(&hash_token(token))
            .await
            .unwrap()
            .unwrap()
            .expires_at
    }

    #[tokio::test]
    async fn test_sign_up_issues_tokens() {
        let fx = fixture().await;
        let session = alice(&fx).await;

        assert_eq!(session.user.username, "alice");

        let claims = fx.auth.signer().verify(&session.auth_token).unwrap();
        assert_eq!(claims.tt, TokenType::Auth);
        assert_eq!(claims.user_id(), Some(session.user.user_id));
        assert_eq!(claims.username.as_deref(), Some("alice"));
        assert_eq!(claims.roles, Some(vec![]));

        let refresh = fx.auth.signer().verify(&session.refresh_token).unwrap();
        assert_eq!(refresh.tt, TokenType::Refresh);
        assert!(refresh.jti.is_some());
        assert!(refresh.username.is_none());
        assert!(refresh.roles.is_none());
    }

    #[tokio::test]
    async fn test_refresh_session_persisted_by_hash() {
        let fx = fixture().await;
        let session = alice(&fx).await;

        let expires_at = session_expiry(&fx, &session.refresh_token).await;
        let claims = fx.auth.signer().verify(&session.refresh_token).unwrap();
        assert_eq!(expires_at.timestamp(), claims.exp);
    }

    #[tokio::test]
    async fn test_sign_up_duplicate_email_case_insensitive() {
        let fx = fixture().await;
        alice(&fx).await;

        let err = fx
            .auth
            .sign_up("A@X.COM", "password123", "alicia")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.user_message(), "Email already taken");
    }

    #[tokio::test]
    async fn test_sign_up_duplicate_username() {
        let fx = fixture().await;
        alice(&fx).await;

        let err = fx
            .auth
            .sign_up("b@x.com", "password123", "alice")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.user_message(), "Username already taken");
    }

    #[tokio::test]
    async fn test_email_checked_before_username() {
        let fx = fixture().await;
        alice(&fx).await;

        let err = fx
            .auth
            .sign_up("a@x.com", "password123", "alice")
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Email already taken");
    }

    #[tokio::test]
    async fn test_sign_in() {
        let fx = fixture().await;
        let signed_up = alice(&fx).await;

        let err = fx.auth.sign_in("a@x.com", "wrong-password").await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.user_message(), INVALID_CREDENTIALS);

        let err = fx.auth.sign_in("nobody@x.com", "password123").await.unwrap_err();
        assert_eq!(err.user_message(), INVALID_CREDENTIALS);

        let session = fx.auth.sign_in("A@x.com", "password123").await.unwrap();
        assert_eq!(session.user, signed_up.user);
        assert_ne!(session.auth_token, signed_up.auth_token);
        assert_ne!(session.refresh_token, signed_up.refresh_token);
    }

    #[tokio::test]
    async fn test_sign_in_carries_live_roles() {
        let fx = fixture().await;
        let signed_up = alice(&fx).await;
        fx.store
            .grant_role(&signed_up.user.user_id, "admin")
            .await
            .unwrap();

        let session = fx.auth.sign_in("a@x.com", "password123").await.unwrap();
        let claims = fx.auth.signer().verify(&session.auth_token).unwrap();
        assert!(claims.has_role("admin"));
    }

    #[tokio::test]
    async fn test_soft_deleted_locked_out() {
        let fx = fixture().await;
        let session = alice(&fx).await;
        fx.store
            .update_identity(
                &session.user.user_id,
                IdentityUpdate::new().with_deleted_at(Utc::now()),
            )
            .await
            .unwrap();

        let err = fx.auth.sign_in("a@x.com", "password123").await.unwrap_err();
        assert_eq!(err.user_message(), INVALID_CREDENTIALS);

        let err = fx.auth.refresh(&session.refresh_token).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.user_message(), INVALID_REFRESH_TOKEN);
    }

    #[tokio::test]
    async fn test_sign_out_is_idempotent() {
        let fx = fixture().await;
        let session = alice(&fx).await;

        fx.auth.sign_out(&session.refresh_token).await;
        fx.auth.sign_out(&session.refresh_token).await;
        fx.auth.sign_out("never-issued").await;

        let err = fx.auth.refresh(&session.refresh_token).await.unwrap_err();
        assert_eq!(err.user_message(), INVALID_REFRESH_TOKEN);
    }

    #[tokio::test]
    async fn test_refresh_keeps_token_above_threshold() {
        let fx = fixture().await;
        let session = alice(&fx).await;

        let pair = fx.auth.refresh(&session.refresh_token).await.unwrap();
        assert_eq!(pair.refresh_token, session.refresh_token);

        let claims = fx.auth.signer().verify(&pair.auth_token).unwrap();
        assert_eq!(claims.tt, TokenType::Auth);
    }

    #[tokio::test]
    async fn test_refresh_rotates_below_threshold() {
        // A refresh ttl shorter than the threshold makes every session
        // eligible for rotation.
        let fx = fixture_with(TokenSettings {
            auth_ttl: Duration::from_secs(900),
            refresh_ttl: Duration::from_secs(3_600),
            renew_threshold: Duration::from_secs(7_200),
        })
        .await;
        let session = alice(&fx).await;

        let pair = fx.auth.refresh(&session.refresh_token).await.unwrap();
        assert_ne!(pair.refresh_token, session.refresh_token);

        let err = fx.auth.refresh(&session.refresh_token).await.unwrap_err();
        assert_eq!(err.user_message(), INVALID_REFRESH_TOKEN);

        assert!(fx.auth.refresh(&pair.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let fx = fixture().await;
        let session = alice(&fx).await;

        let err = fx.auth.refresh(&session.auth_token).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.user_message(), INVALID_REFRESH_TOKEN);
    }

    #[tokio::test]
    async fn test_refresh_rejects_garbage() {
        let fx = fixture().await;
        let err = fx.auth.refresh("garbage").await.unwrap_err();
        assert_eq!(err.user_message(), INVALID_REFRESH_TOKEN);
    }

    #[tokio::test]
    async fn test_refresh_unknown_user_rejected() {
        let fx = fixture().await;
        let user_id = UserId::new();

        // Signed correctly but never persisted.
        let token = fx
            .auth
            .signer()
            .sign(
                Claims::builder(user_id.to_string(), TokenType::Refresh),
                Duration::from_secs(60),
            )
            .unwrap();

        let err = fx.auth.refresh(&token).await.unwrap_err();
        assert_eq!(err.user_message(), INVALID_REFRESH_TOKEN);
    }

    #[tokio::test]
    async fn test_token_settings_from_config() {
        let settings = TokenSettings::from(&AuthConfig::default());
        assert_eq!(settings.auth_ttl, Duration::from_secs(900));
        assert_eq!(settings.refresh_ttl, Duration::from_secs(7_776_000));
        assert_eq!(settings.renew_threshold, Duration::from_secs(604_800));
    }
}
