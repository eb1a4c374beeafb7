// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # bulwark-core
//!
//! Shared domain types and collaborator contracts for the bulwark
//! authentication/session core.
//!
//! - **Types**: `UserId`, `Identity`, `Credential`, `RefreshSession`
//! - **Error**: `StoreError` with structured unique-violation detail
//! - **Repository**: `UserRepository`, `RoleRepository`, `RefreshTokenStore`
//! - **Password**: `PasswordHasher` and the Argon2id implementation
//!
//! ## Example
//!
//! ```rust,ignore
//! use bulwark_core::{NewAccount, UserRepository};
//!
//! let identity = users
//!     .create_account(NewAccount::new("alice", "A@X.com", password_hash))
//!     .await?;
//! assert_eq!(identity.username, "alice");
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod password;
pub mod repository;
pub mod types;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{PasswordError, StoreError, StoreResult, UniqueField};
pub use password::{Argon2Hasher, PasswordHasher};
pub use repository::{RefreshTokenStore, RoleRepository, UserRepository};
pub use types::{
    normalize_email, Account, Credential, Identity, IdentityUpdate, NewAccount, RefreshSession,
    UserId,
};
