// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Collaborator contracts for the relational store.
//!
//! The authentication service only ever talks to storage through these
//! traits. Every implementation must be safe to share across concurrent
//! requests and must report unique-constraint failures as
//! [`StoreError::UniqueViolation`](crate::StoreError::UniqueViolation) with
//! the collided column.
//!
//! # Example
//!
//! ```rust,ignore
//! use bulwark_core::{RefreshTokenStore, RoleRepository};
//!
//! let roles = store.roles_for_user(&user_id).await?;
//! let session = store.insert(&token_hash, &user_id, expires_at).await?;
//!
//! // Deletes are idempotent.
//! store.delete_by_hash(&token_hash).await?;
//! store.delete_by_hash(&token_hash).await?;
//! ```

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreResult;
use crate::types::{Account, Identity, IdentityUpdate, NewAccount, RefreshSession, UserId};

// =============================================================================
// UserRepository
// =============================================================================

/// Identity and credential persistence.
#[async_trait]
pub trait UserRepository: Send + Sync + Debug {
    /// Looks up a credential by (already lowercased) email, joined to its
    /// identity. Soft-deleted identities are returned; callers decide.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>>;

    /// Looks up an identity by username.
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Identity>>;

    /// Looks up an identity by id.
    async fn find_by_id(&self, user_id: &UserId) -> StoreResult<Option<Identity>>;

    /// Creates an identity and its credential in one atomic transaction.
    ///
    /// Inside the transaction the email is checked first, then the username,
    /// then the identity row and the credential row are inserted. Both a
    /// failed pre-check and a constraint violation raised by the store
    /// itself surface as `StoreError::UniqueViolation` naming the column.
    async fn create_account(&self, account: NewAccount) -> StoreResult<Identity>;

    /// Applies a partial update to an identity and returns the new state.
    ///
    /// Returns `StoreError::NotFound` if the identity does not exist.
    async fn update_identity(
        &self,
        user_id: &UserId,
        update: IdentityUpdate,
    ) -> StoreResult<Identity>;
}

// =============================================================================
// RoleRepository
// =============================================================================

/// Role membership.
#[async_trait]
pub trait RoleRepository: Send + Sync + Debug {
    /// Returns the names of all roles the identity belongs to, sorted and
    /// without duplicates.
    async fn roles_for_user(&self, user_id: &UserId) -> StoreResult<Vec<String>>;

    /// Grants a role, creating the role name on first use. Granting a role
    /// the identity already holds is a no-op.
    async fn grant_role(&self, user_id: &UserId, role: &str) -> StoreResult<()>;
}

// =============================================================================
// RefreshTokenStore
// =============================================================================

/// Persistence of refresh-session records, keyed by token hash.
///
/// The raw refresh token never reaches this trait; only its hex digest does.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync + Debug {
    /// Persists a new session record.
    async fn insert(
        &self,
        token_hash: &str,
        user_id: &UserId,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<RefreshSession>;

    /// Finds a session by token hash.
    async fn find_by_hash(&self, token_hash: &str) -> StoreResult<Option<RefreshSession>>;

    /// Deletes a session by id. Returns `false` if nothing was deleted.
    async fn delete_by_id(&self, id: &Uuid) -> StoreResult<bool>;

    /// Deletes a session by token hash. Returns `false` if nothing was deleted.
    async fn delete_by_hash(&self, token_hash: &str) -> StoreResult<bool>;
}
