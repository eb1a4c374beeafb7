// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core domain types.
//!
//! Identities and credentials are split the same way the relational schema
//! splits them: the public `Identity` row and the private `Credential` row
//! are 1:1 and share the same [`UserId`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// UserId
// =============================================================================

/// Opaque, stable identifier of an identity.
///
/// New ids are time-ordered (UUID v7) so that inserts stay index-friendly.
///
/// # Examples
///
/// ```
/// use bulwark_core::types::UserId;
///
/// let id = UserId::new();
/// let parsed: UserId = id.to_string().parse().unwrap();
/// assert_eq!(id, parsed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Generates a fresh identifier.
    #[inline]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wraps an existing UUID.
    #[inline]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the inner UUID.
    #[inline]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Parses an identifier, returning `None` for anything that is not a UUID.
    pub fn parse(s: &str) -> Option<Self> {
        s.parse().ok()
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

// =============================================================================
// Identity
// =============================================================================

/// The public face of a user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable identifier.
    pub user_id: UserId,
    /// Unique display name.
    pub username: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Soft-delete marker. A deleted identity cannot authenticate.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Identity {
    /// Returns `true` if the identity has been soft-deleted.
    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns `true` if the identity may authenticate.
    #[inline]
    pub fn is_live(&self) -> bool {
        !self.is_deleted()
    }
}

// =============================================================================
// Credential
// =============================================================================

/// Private login material, 1:1 with an [`Identity`].
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Owning identity.
    pub user_id: UserId,
    /// Lowercased email address.
    pub email: String,
    /// Opaque password hash (PHC string).
    pub password_hash: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

/// A credential joined with its identity, as returned by an email lookup.
#[derive(Debug, Clone)]
pub struct Account {
    /// The identity row.
    pub identity: Identity,
    /// The private credential row.
    pub credential: Credential,
}

/// Input for creating an identity together with its credential.
#[derive(Clone)]
pub struct NewAccount {
    /// Pre-generated identifier.
    pub user_id: UserId,
    /// Requested username.
    pub username: String,
    /// Normalized email.
    pub email: String,
    /// Already-hashed password.
    pub password_hash: String,
}

impl NewAccount {
    /// Creates a new account request, normalizing the email.
    pub fn new(
        username: impl Into<String>,
        email: impl AsRef<str>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            user_id: UserId::new(),
            username: username.into(),
            email: normalize_email(email.as_ref()),
            password_hash: password_hash.into(),
        }
    }
}

impl fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewAccount")
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Partial update of an identity. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityUpdate {
    /// New username.
    pub username: Option<String>,
    /// Soft-delete timestamp to set.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl IdentityUpdate {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the username.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Marks the identity as deleted at the given time.
    pub fn with_deleted_at(mut self, at: DateTime<Utc>) -> Self {
        self.deleted_at = Some(at);
        self
    }

    /// Returns `true` if the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.deleted_at.is_none()
    }
}

/// Lowercases an email address for uniqueness comparison and lookup.
#[inline]
pub fn normalize_email(email: &str) -> String {
    email.to_lowercase()
}

// =============================================================================
// RefreshSession
// =============================================================================

/// Persisted record of an outstanding refresh token.
///
/// Only the SHA-256 hex digest of the raw token is stored. A record exists
/// exactly as long as its token has not been revoked or rotated away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSession {
    /// Generated key.
    pub id: Uuid,
    /// Hex-encoded digest of the raw token.
    pub token_hash: String,
    /// Owning identity.
    pub user_id: UserId,
    /// Hard expiry of the session.
    pub expires_at: DateTime<Utc>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl RefreshSession {
    /// Time left until `expires_at`, negative once expired.
    #[inline]
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at - now
    }

    /// Returns `true` if the session has expired at `now`.
    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

// =============================================================================
// Tests
// =============================================================================
