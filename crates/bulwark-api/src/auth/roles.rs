// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Role predicates.
//!
//! A role is a named, stateless predicate over the resolved identity and the
//! route parameters. Roles are combined with OR: access is granted by the
//! first role that holds.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use bulwark_core::UserId;

use super::context::AuthContext;

/// Role name granting admin access.
pub const ADMIN_ROLE: &str = "admin";

// =============================================================================
// RouteParams
// =============================================================================

/// Route parameters visible to role predicates.
///
/// Carries the values after `me` has been resolved to the caller id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams(HashMap<String, String>);

impl RouteParams {
    /// Creates empty params.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a parameter value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Sets a parameter value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Iterates over name/value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Adds a parameter, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }
}

impl From<HashMap<String, String>> for RouteParams {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

// =============================================================================
// Role
// =============================================================================

/// Built-in role predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// Always holds.
    Everyone,
    /// Holds when an identity is resolved.
    Authenticated,
    /// Holds when the identity carries the `admin` role.
    Admin,
    /// Holds when the identity's id equals the named route parameter.
    ResourceOwner(Cow<'static, str>),
}

impl Role {
    /// Owner of the resource identified by route parameter `param`.
    pub fn owner(param: impl Into<Cow<'static, str>>) -> Self {
        Role::ResourceOwner(param.into())
    }

    /// Returns the role name.
    pub fn name(&self) -> &'static str {
        match self {
            Role::Everyone => "Everyone",
            Role::Authenticated => "Authenticated",
            Role::Admin => "Admin",
            Role::ResourceOwner(_) => "ResourceOwner",
        }
    }

    /// Evaluates the predicate.
    pub fn allows(&self, identity: Option<&AuthContext>, params: &RouteParams) -> bool {
        match self {
            Role::Everyone => true,
            Role::Authenticated => identity.is_some(),
            Role::Admin => identity.is_some_and(AuthContext::is_admin),
            Role::ResourceOwner(param) => match (identity, params.get(param)) {
                (Some(ctx), Some(target)) => UserId::parse(target) == Some(ctx.user_id),
                _ => false,
            },
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::ResourceOwner(param) => write!(f, "ResourceOwner:{}", param),
            other => f.write_str(other.name()),
        }
    }
}

/// Returns `true` if any role holds, evaluating in order and stopping at the
/// first match.
pub fn allows_any(roles: &[Role], identity: Option<&AuthContext>, params: &RouteParams) -> bool {
    roles.iter().any(|role| role.allows(identity, params))
}

// =============================================================================
// Tests
// =============================================================================
