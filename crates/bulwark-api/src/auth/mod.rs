// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication and authorization module.
//!
//! This module provides:
//! - Token signing and verification
//! - Refresh token hashing
//! - The caller identity attached to each request
//! - Role predicates

mod claims;
mod context;
mod jwt;
mod roles;
mod token_hash;

pub use claims::{Claims, ClaimsBuilder, TokenType};
pub use context::{AuthContext, Caller};
pub use jwt::{InvalidToken, SignerError, TokenSigner};
pub use roles::{allows_any, Role, RouteParams, ADMIN_ROLE};
pub use token_hash::hash_token;
