// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Application services behind the HTTP handlers.

mod auth;
mod users;

pub use auth::{
    AuthService, AuthSession, TokenPair, TokenSettings, UserSummary, INVALID_CREDENTIALS,
    INVALID_REFRESH_TOKEN,
};
pub use users::{UserProfile, UserService, USER_NOT_FOUND};
