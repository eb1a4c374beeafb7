// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Harness
//!
//! An application wired exactly like the binary, over a private in-memory
//! database, plus helpers for driving it with requests.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use bulwark_api::{ApiServer, AppState, TokenSettings, TokenSigner};
use bulwark_core::{IdentityUpdate, RoleRepository, UserId, UserRepository};
use bulwark_store::SqliteStore;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tower::ServiceExt;

use super::fixtures::{cheap_hasher, test_signer, Credentials};

/// Upper bound on response bodies read by tests.
const MAX_BODY_BYTES: usize = 1024 * 1024;

// =============================================================================
// TestApp
// =============================================================================

/// A running application without a socket.
pub struct TestApp {
    /// Backing store, for arranging and inspecting state directly.
    pub store: Arc<SqliteStore>,
    /// Application state the router was built from.
    pub state: AppState,
    router: Router,
}

impl TestApp {
    /// Builds an application with default token lifetimes.
    pub async fn new() -> Self {
        Self::with_settings(TokenSettings::default()).await
    }

    /// Builds an application with the given token lifetimes.
    pub async fn with_settings(settings: TokenSettings) -> Self {
        let store = Arc::new(SqliteStore::in_memory().await.expect("in-memory store"));

        let state = AppState::builder()
            .signer(Arc::new(test_signer()))
            .token_settings(settings)
            .store(store.clone())
            .hasher(Arc::new(cheap_hasher()))
            .build()
            .expect("app state");

        let router = ApiServer::new(state.clone()).router();
        Self {
            store,
            state,
            router,
        }
    }

    /// Returns the signer the application trusts.
    pub fn signer(&self) -> &Arc<TokenSigner> {
        self.state.signer()
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Sends a request and collects the response.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible router");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), MAX_BODY_BYTES)
            .await
            .expect("response body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse { status, body }
    }

    /// Sends a GET request.
    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    /// Sends a POST request with a JSON body.
    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, None, Some(body)).await
    }

    /// Sends a PATCH request with a JSON body.
    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PATCH, uri, token, Some(body)).await
    }

    // =========================================================================
    // Session shortcuts
    // =========================================================================

    /// Signs up and returns the session, panicking on anything but `201`.
    pub async fn sign_up(&self, credentials: &Credentials) -> Session {
        let response = self.post("/auth/sign-up", credentials.sign_up_body()).await;
        response.assert_status(StatusCode::CREATED);
        Session::from_body(&response.body)
    }

    /// Signs in and returns the session, panicking on anything but `200`.
    pub async fn sign_in(&self, credentials: &Credentials) -> Session {
        let response = self.post("/auth/sign-in", credentials.sign_in_body()).await;
        response.assert_status(StatusCode::OK);
        Session::from_body(&response.body)
    }

    /// Exchanges a refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> TestResponse {
        self.post(
            "/auth/refresh",
            serde_json::json!({ "refreshToken": refresh_token }),
        )
        .await
    }

    /// Revokes a refresh token.
    pub async fn sign_out(&self, refresh_token: &str) -> TestResponse {
        self.post(
            "/auth/sign-out",
            serde_json::json!({ "refreshToken": refresh_token }),
        )
        .await
    }

    // =========================================================================
    // Direct store manipulation
    // =========================================================================

    /// Grants a role.
    pub async fn grant_role(&self, user_id: &UserId, role: &str) {
        self.store.grant_role(user_id, role).await.expect("grant role");
    }

    /// Soft-deletes an identity.
    pub async fn soft_delete(&self, user_id: &UserId) {
        self.store
            .update_identity(user_id, IdentityUpdate::new().with_deleted_at(Utc::now()))
            .await
            .expect("soft delete");
    }

    /// Overwrites the stored expiry of the session behind `refresh_token`.
    pub async fn set_session_expiry(&self, refresh_token: &str, expires_at: DateTime<Utc>) {
        let result = sqlx::query("UPDATE refresh_tokens SET expires_at = ? WHERE token_hash = ?")
            .bind(expires_at)
            .bind(bulwark_api::auth::hash_token(refresh_token))
            .execute(self.store.pool())
            .await
            .expect("update session expiry");
        assert_eq!(result.rows_affected(), 1, "no session for token");
    }

    /// Returns the number of stored refresh sessions.
    pub async fn session_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM refresh_tokens")
            .fetch_one(self.store.pool())
            .await
            .expect("count sessions")
    }
}

// =============================================================================
// Session
// =============================================================================

/// Tokens and identity from a sign-up or sign-in response.
#[derive(Debug, Clone)]
pub struct Session {
    /// Identity id.
    pub user_id: UserId,
    /// Username.
    pub username: String,
    /// Access token.
    pub auth_token: String,
    /// Refresh token.
    pub refresh_token: String,
}

impl Session {
    /// Parses an `AuthSession` body.
    pub fn from_body(body: &Value) -> Self {
        let text = |pointer: &str| {
            body.pointer(pointer)
                .and_then(Value::as_str)
                .unwrap_or_else(|| panic!("missing {} in {}", pointer, body))
                .to_string()
        };

        Self {
            user_id: UserId::parse(&text("/user/userId")).expect("user id"),
            username: text("/user/username"),
            auth_token: text("/authToken"),
            refresh_token: text("/refreshToken"),
        }
    }

    /// Path of this user's profile.
    pub fn profile_path(&self) -> String {
        format!("/users/{}", self.user_id)
    }
}

// =============================================================================
// TestResponse
// =============================================================================

/// A collected response.
#[derive(Debug)]
pub struct TestResponse {
    /// Status code.
    pub status: StatusCode,
    /// JSON body, `Null` when empty.
    pub body: Value,
}

impl TestResponse {
    /// Returns a string field of the body.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.body.get(name).and_then(Value::as_str)
    }
}
