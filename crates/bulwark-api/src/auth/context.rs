// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication context.

use bulwark_core::UserId;
use serde::Serialize;

use super::claims::{Claims, TokenType};
use super::roles::ADMIN_ROLE;

/// Identity resolved from a valid access token.
///
/// Built from the token alone; the store is not consulted on the request
/// path, so roles are as of issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthContext {
    /// Caller id.
    pub user_id: UserId,
    /// Caller username.
    pub username: String,
    /// Role names carried by the token.
    pub roles: Vec<String>,
}

impl AuthContext {
    /// Creates a context.
    pub fn new(user_id: UserId, username: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
            roles,
        }
    }

    /// Builds a context from verified claims.
    ///
    /// Returns `None` unless the token is an access token whose subject is a
    /// valid user id. Missing `username` or `roles` default to empty.
    pub fn from_claims(claims: &Claims) -> Option<Self> {
        if !claims.is_type(TokenType::Auth) {
            return None;
        }
        let user_id = claims.user_id()?;

        Some(Self {
            user_id,
            username: claims.username.clone().unwrap_or_default(),
            roles: claims.roles.clone().unwrap_or_default(),
        })
    }

    /// Returns `true` if the context has the given role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Returns `true` if this context has admin privileges.
    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }
}

/// The guard's verdict for one request, stored in request extensions.
///
/// `Caller(None)` means no usable access token was presented.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller(pub Option<AuthContext>);

impl Caller {
    /// An unauthenticated caller.
    pub fn anonymous() -> Self {
        Self(None)
    }

    /// Returns the resolved identity, if any.
    pub fn identity(&self) -> Option<&AuthContext> {
        self.0.as_ref()
    }

    /// Returns `true` if no identity was resolved.
    pub fn is_anonymous(&self) -> bool {
        self.0.is_none()
    }
}

impl From<AuthContext> for Caller {
    fn from(ctx: AuthContext) -> Self {
        Self(Some(ctx))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_auth_context_from_claims() {
        let id = UserId::new();
        let claims = Claims::builder(id.to_string(), TokenType::Auth)
            .username("alice")
            .roles(vec!["admin".to_string()])
            .build(0, Duration::from_secs(60));

        let ctx = AuthContext::from_claims(&claims).unwrap();
        assert_eq!(ctx.user_id, id);
        assert_eq!(ctx.username, "alice");
        assert!(ctx.is_admin());
    }

    #[test]
    fn test_missing_roles_default_empty() {
        let claims = Claims::builder(UserId::new().to_string(), TokenType::Auth)
            .build(0, Duration::from_secs(60));

        let ctx = AuthContext::from_claims(&claims).unwrap();
        assert!(ctx.roles.is_empty());
        assert_eq!(ctx.username, "");
        assert!(!ctx.is_admin());
    }

    #[test]
    fn test_non_auth_token_rejected() {
        for tt in [TokenType::Refresh, TokenType::MagicLink, TokenType::PasswordReset] {
            let claims = Claims::builder(UserId::new().to_string(), tt).build(0, Duration::from_secs(60));
            assert!(AuthContext::from_claims(&claims).is_none());
        }
    }

    #[test]
    fn test_bad_subject_rejected() {
        let claims = Claims::builder("me", TokenType::Auth).build(0, Duration::from_secs(60));
        assert!(AuthContext::from_claims(&claims).is_none());
    }

    #[test]
    fn test_caller() {
        assert!(Caller::anonymous().is_anonymous());
        assert!(Caller::default().identity().is_none());

        let caller = Caller::from(AuthContext::new(UserId::new(), "bob", vec![]));
        assert_eq!(caller.identity().map(|c| c.username.as_str()), Some("bob"));
    }
}
