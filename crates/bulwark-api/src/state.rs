// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Application state shared across handlers.

use std::sync::Arc;

use bulwark_config::ServerConfig;
use bulwark_core::{PasswordHasher, RefreshTokenStore, RoleRepository, UserRepository};

use crate::auth::TokenSigner;
use crate::error::{ApiError, ApiResult};
use crate::service::{AuthService, TokenSettings, UserService};

// =============================================================================
// AppState
// =============================================================================

/// Application state shared across all handlers.
///
/// Built once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct AppState {
    /// HTTP server settings.
    pub server: Arc<ServerConfig>,
    /// Token signer, shared with the guard.
    pub signer: Arc<TokenSigner>,
    /// Session lifecycle.
    pub auth: AuthService,
    /// User profiles.
    pub users: UserService,
}

impl AppState {
    /// Creates a new app state builder.
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }

    /// Returns the signer.
    pub fn signer(&self) -> &Arc<TokenSigner> {
        &self.signer
    }
}

// =============================================================================
// AppStateBuilder
// =============================================================================

/// Builder for constructing AppState.
#[derive(Default)]
pub struct AppStateBuilder {
    server: Option<ServerConfig>,
    signer: Option<Arc<TokenSigner>>,
    settings: Option<TokenSettings>,
    users: Option<Arc<dyn UserRepository>>,
    roles: Option<Arc<dyn RoleRepository>>,
    sessions: Option<Arc<dyn RefreshTokenStore>>,
    hasher: Option<Arc<dyn PasswordHasher>>,
}

impl AppStateBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server configuration.
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.server = Some(server);
        self
    }

    /// Sets the token signer.
    pub fn signer(mut self, signer: Arc<TokenSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Sets the token lifetimes.
    pub fn token_settings(mut self, settings: TokenSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Sets the user repository.
    pub fn users(mut self, users: Arc<dyn UserRepository>) -> Self {
        self.users = Some(users);
        self
    }

    /// Sets the role repository.
    pub fn roles(mut self, roles: Arc<dyn RoleRepository>) -> Self {
        self.roles = Some(roles);
        self
    }

    /// Sets the refresh-token store.
    pub fn sessions(mut self, sessions: Arc<dyn RefreshTokenStore>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Uses one store for users, roles and refresh tokens.
    pub fn store<S>(self, store: Arc<S>) -> Self
    where
        S: UserRepository + RoleRepository + RefreshTokenStore + 'static,
    {
        self.users(store.clone())
            .roles(store.clone())
            .sessions(store)
    }

    /// Sets the password hasher.
    pub fn hasher(mut self, hasher: Arc<dyn PasswordHasher>) -> Self {
        self.hasher = Some(hasher);
        self
    }

    /// Builds the AppState.
    ///
    /// The signer, the repositories and the hasher are required.
    pub fn build(self) -> ApiResult<AppState> {
        let signer = self.signer.ok_or_else(|| missing("signer"))?;
        let users = self.users.ok_or_else(|| missing("user repository"))?;
        let roles = self.roles.ok_or_else(|| missing("role repository"))?;
        let sessions = self.sessions.ok_or_else(|| missing("refresh token store"))?;
        let hasher = self.hasher.ok_or_else(|| missing("password hasher"))?;

        let auth = AuthService::new(users.clone(), roles, sessions, hasher, signer.clone())
            .with_settings(self.settings.unwrap_or_default());

        Ok(AppState {
            server: Arc::new(self.server.unwrap_or_default()),
            signer,
            auth,
            users: UserService::new(users),
        })
    }
}

fn missing(component: &str) -> ApiError {
    ApiError::internal(format!("AppState is missing a {}", component))
}

// =============================================================================
// FromRef implementations for extracting parts of state
// =============================================================================

impl axum::extract::FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl axum::extract::FromRef<AppState> for UserService {
    fn from_ref(state: &AppState) -> Self {
        state.users.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<TokenSigner> {
    fn from_ref(state: &AppState) -> Self {
        state.signer.clone()
    }
}
