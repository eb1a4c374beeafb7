// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Middleware implementations for the API server.
//!
//! Layers run in this order on a protected route:
//!
//! - [`AuthLayer`]: resolves the caller, never rejects
//! - [`MeResolverLayer`]: rewrites `me` route parameters (`401` without a caller)
//! - [`RoleLayer`]: OR over role predicates (`403` on denial)

mod auth;
mod me;
mod roles;

pub use auth::{AuthLayer, AuthMiddleware};
pub use me::{MeResolver, MeResolverLayer, ME};
pub use roles::{RoleLayer, RoleMiddleware};
