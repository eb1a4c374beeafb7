// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API handlers for all endpoints.
//!
//! - [`health`]: liveness
//! - [`auth`]: sign-up, sign-in, sign-out, refresh
//! - [`users`]: profile read and update

mod auth;
mod health;
mod users;

pub use auth::*;
pub use health::*;
pub use users::*;
