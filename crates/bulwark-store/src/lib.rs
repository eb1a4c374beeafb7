// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # bulwark-store
//!
//! Relational storage for bulwark on SQLite via `sqlx`.
//!
//! [`SqliteStore`] implements every collaborator trait from `bulwark-core`
//! over a single connection pool:
//!
//! - [`UserRepository`](bulwark_core::UserRepository): identities and credentials
//! - [`RoleRepository`](bulwark_core::RoleRepository): role membership
//! - [`RefreshTokenStore`](bulwark_core::RefreshTokenStore): refresh sessions
//!
//! ## Example
//!
//! ```rust,ignore
//! use bulwark_store::{SqliteStore, StoreOptions};
//!
//! let store = SqliteStore::connect(&StoreOptions::new("sqlite://bulwark.db")).await?;
//! store.migrate().await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod error;
mod rows;
pub mod schema;
pub mod sqlite;

pub use sqlite::{SqliteStore, StoreOptions};
