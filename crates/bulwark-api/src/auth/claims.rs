// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! JWT claims structure.

use std::time::Duration;

use bulwark_core::UserId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// TokenType
// =============================================================================

/// Purpose tag carried in the `tt` claim.
///
/// A token is only ever accepted where its tag matches. An access token is
/// useless at `/auth/refresh` and a refresh token never authenticates a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived access token.
    Auth,
    /// Long-lived refresh token.
    Refresh,
    /// One-shot sign-in link.
    MagicLink,
    /// Password reset link.
    PasswordReset,
}

impl TokenType {
    /// Returns the wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Auth => "auth",
            TokenType::Refresh => "refresh",
            TokenType::MagicLink => "magic_link",
            TokenType::PasswordReset => "password_reset",
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Claims
// =============================================================================

/// Claims embedded in every signed token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    // =========================================================================
    // Standard JWT Claims (RFC 7519)
    // =========================================================================
    /// Subject, the user id.
    pub sub: String,

    /// Token type.
    pub tt: TokenType,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Issued at time (Unix timestamp).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Not before time (Unix timestamp).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// JWT ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    // =========================================================================
    // Custom Claims
    // =========================================================================
    /// Username, present on access tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Role names, present on access tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,

    /// Any other claims.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// Starts building claims for a subject.
    pub fn builder(sub: impl Into<String>, tt: TokenType) -> ClaimsBuilder {
        ClaimsBuilder::new(sub, tt)
    }

    /// Returns the roles, empty when the claim is absent.
    pub fn roles_or_empty(&self) -> &[String] {
        self.roles.as_deref().unwrap_or(&[])
    }

    /// Returns `true` if the roles claim contains `role`.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles_or_empty().iter().any(|r| r == role)
    }

    /// Parses the subject as a user id.
    pub fn user_id(&self) -> Option<UserId> {
        UserId::parse(&self.sub)
    }

    /// Returns `true` if the token is of the given type.
    pub fn is_type(&self, tt: TokenType) -> bool {
        self.tt == tt
    }
}

// =============================================================================
// ClaimsBuilder
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum Expiry {
    At(i64),
    In(i64),
}

#[derive(Debug, Clone, Copy)]
enum IssuedAt {
    Now,
    At(i64),
    Omit,
}

/// Builder for [`Claims`].
///
/// `exp` defaults to `now + ttl` and `iat` to `now`; both are fixed at
/// signing time, not when the builder is created.
#[derive(Debug, Clone)]
pub struct ClaimsBuilder {
    sub: String,
    tt: TokenType,
    username: Option<String>,
    roles: Option<Vec<String>>,
    jti: Option<String>,
    nbf: Option<i64>,
    iss: Option<String>,
    expiry: Option<Expiry>,
    issued_at: IssuedAt,
    extra: Map<String, Value>,
}

impl ClaimsBuilder {
    fn new(sub: impl Into<String>, tt: TokenType) -> Self {
        Self {
            sub: sub.into(),
            tt,
            username: None,
            roles: None,
            jti: None,
            nbf: None,
            iss: None,
            expiry: None,
            issued_at: IssuedAt::Now,
            extra: Map::new(),
        }
    }

    /// Sets the username claim.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the roles claim.
    pub fn roles(mut self, roles: Vec<String>) -> Self {
        self.roles = Some(roles);
        self
    }

    /// Sets the token id.
    pub fn jti(mut self, jti: impl Into<String>) -> Self {
        self.jti = Some(jti.into());
        self
    }

    /// Sets the not-before timestamp.
    pub fn not_before(mut self, ts: i64) -> Self {
        self.nbf = Some(ts);
        self
    }

    /// Sets an absolute expiry, ignoring the signing ttl.
    pub fn expires_at(mut self, ts: i64) -> Self {
        self.expiry = Some(Expiry::At(ts));
        self
    }

    /// Sets an expiry relative to signing time, ignoring the signing ttl.
    pub fn expires_in(mut self, duration: Duration) -> Self {
        self.expiry = Some(Expiry::In(secs(duration)));
        self
    }

    /// Sets an explicit issued-at timestamp.
    pub fn issued_at(mut self, ts: i64) -> Self {
        self.issued_at = IssuedAt::At(ts);
        self
    }

    /// Leaves `iat` out of the token.
    pub fn without_issued_at(mut self) -> Self {
        self.issued_at = IssuedAt::Omit;
        self
    }

    /// Sets the issuer.
    pub fn issuer(mut self, iss: impl Into<String>) -> Self {
        self.iss = Some(iss.into());
        self
    }

    /// Adds an arbitrary claim.
    pub fn claim(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub(crate) fn has_issuer(&self) -> bool {
        self.iss.is_some()
    }

    /// Finalizes the claims at `now` (Unix seconds).
    pub fn build(self, now: i64, ttl: Duration) -> Claims {
        let exp = match self.expiry {
            Some(Expiry::At(ts)) => ts,
            Some(Expiry::In(delta)) => now.saturating_add(delta),
            None => now.saturating_add(secs(ttl)),
        };
        let iat = match self.issued_at {
            IssuedAt::Now => Some(now),
            IssuedAt::At(ts) => Some(ts),
            IssuedAt::Omit => None,
        };

        Claims {
            sub: self.sub,
            tt: self.tt,
            exp,
            iat,
            nbf: self.nbf,
            iss: self.iss,
            jti: self.jti,
            username: self.username,
            roles: self.roles,
            extra: self.extra,
        }
    }
}

fn secs(duration: Duration) -> i64 {
    i64::try_from(duration.as_secs()).unwrap_or(i64::MAX)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let claims = Claims::builder("user-1", TokenType::Auth).build(1_000, Duration::from_secs(900));

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.tt, TokenType::Auth);
        assert_eq!(claims.iat, Some(1_000));
        assert_eq!(claims.exp, 1_900);
        assert!(claims.roles.is_none());
    }

    #[test]
    fn test_explicit_expiry_wins() {
        let ttl = Duration::from_secs(900);

        let claims = Claims::builder("u", TokenType::Refresh)
            .expires_at(5_000)
            .build(1_000, ttl);
        assert_eq!(claims.exp, 5_000);

        let claims = Claims::builder("u", TokenType::Refresh)
            .expires_in(Duration::from_secs(60))
            .build(1_000, ttl);
        assert_eq!(claims.exp, 1_060);
    }

    #[test]
    fn test_without_issued_at() {
        let claims = Claims::builder("u", TokenType::MagicLink)
            .without_issued_at()
            .build(1_000, Duration::from_secs(10));
        assert!(claims.iat.is_none());

        let json = serde_json::to_value(&claims).unwrap();
        assert!(json.get("iat").is_none());
        assert_eq!(json["tt"], "magic_link");
    }

    #[test]
    fn test_extra_claims_flatten() {
        let claims = Claims::builder("u", TokenType::PasswordReset)
            .claim("purpose", "reset")
            .build(0, Duration::from_secs(10));

        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["purpose"], "reset");
        assert_eq!(json["tt"], "password_reset");

        let back: Claims = serde_json::from_value(json).unwrap();
        assert_eq!(back, claims);
    }

    #[test]
    fn test_roles_helpers() {
        let claims = Claims::builder("u", TokenType::Auth)
            .roles(vec!["admin".to_string()])
            .build(0, Duration::from_secs(10));
        assert!(claims.has_role("admin"));
        assert!(!claims.has_role("editor"));

        let claims = Claims::builder("u", TokenType::Auth).build(0, Duration::from_secs(10));
        assert!(claims.roles_or_empty().is_empty());
    }

    #[test]
    fn test_user_id_parse() {
        let id = UserId::new();
        let claims = Claims::builder(id.to_string(), TokenType::Auth).build(0, Duration::from_secs(1));
        assert_eq!(claims.user_id(), Some(id));

        let claims = Claims::builder("not-a-uuid", TokenType::Auth).build(0, Duration::from_secs(1));
        assert!(claims.user_id().is_none());
    }
}
