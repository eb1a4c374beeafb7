// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # bulwark-api
//!
//! The authentication/session core of bulwark and its HTTP surface.
//!
//! - [`auth`]: token signing and verification, refresh token hashing,
//!   caller identity, role predicates
//! - [`service`]: sign-up, sign-in, sign-out, refresh and user profiles
//! - [`middleware`]: the authentication guard, the `me` resolver and the
//!   role layer
//! - [`server`]: the axum router and server
//!
//! ## Request flow
//!
//! ```text
//! Authorization: Bearer <access token>
//!        │
//!   AuthLayer ──► Caller(Some(identity)) | Caller(None)
//!        │
//!   MeResolverLayer ──► RouteParams with `me` replaced (401 if anonymous)
//!        │
//!   RoleLayer ──► any role holds? (403 otherwise)
//!        │
//!     handler
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod auth;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod server;
pub mod service;
pub mod state;

#[cfg(test)]
mod testing;

pub use auth::{AuthContext, Caller, Claims, Role, RouteParams, TokenSigner, TokenType};
pub use error::{ApiError, ApiResult};
pub use server::ApiServer;
pub use service::{AuthService, TokenSettings, UserService};
pub use state::{AppState, AppStateBuilder};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
