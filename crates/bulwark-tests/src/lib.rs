// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # bulwark Integration Tests
//!
//! End-to-end tests for the bulwark authentication core, driving the real
//! router over a private in-memory SQLite database.
//!
//! ## Module Structure
//!
//! - [`common`]: Shared test utilities
//!   - `fixtures`: Test key pairs, configurations and credentials
//!   - `harness`: An in-memory application plus request helpers
//!   - `assertions`: Response assertion helpers
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all integration tests
//! cargo test -p bulwark-tests
//!
//! # Run specific test suite
//! cargo test -p bulwark-tests --test integration_auth
//! cargo test -p bulwark-tests --test integration_guard
//! cargo test -p bulwark-tests --test integration_users
//! cargo test -p bulwark-tests --test integration_store
//! cargo test -p bulwark-tests --test integration_config
//! ```
//!
//! ## Test Categories
//!
//! ### Auth Tests (`integration_auth.rs`)
//! - Sign-up, sign-in, sign-out and refresh over HTTP
//! - Refresh-token rotation threshold
//! - Concurrent sign-up uniqueness
//!
//! ### Guard Tests (`integration_guard.rs`)
//! - Token round-trip, expiry and type isolation
//! - Role composition on protected routes
//!
//! ### Users Tests (`integration_users.rs`)
//! - Profile reads and updates, `me` resolution, soft deletion
//!
//! ### Store Tests (`integration_store.rs`)
//! - Refresh sessions, role grants and uniqueness on a file database
//!
//! ### Config Tests (`integration_config.rs`)
//! - File formats, environment overrides and key resolution
//!
//! ## Writing New Tests
//!
//! ```rust,ignore
//! use bulwark_tests::prelude::*;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let app = TestApp::new().await;
//!     let alice = app.sign_up(&Credentials::alice()).await;
//!     let response = app.get(&format!("/users/{}", alice.user_id), Some(&alice.auth_token)).await;
//!     response.assert_status(StatusCode::OK);
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod common;

/// Re-export commonly used items for convenience.
pub mod prelude {
    pub use crate::common::assertions::*;
    pub use crate::common::fixtures::*;
    pub use crate::common::harness::*;
    pub use axum::http::StatusCode;
}
