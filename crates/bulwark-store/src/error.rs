// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Translation of `sqlx` errors into [`StoreError`].

use bulwark_core::{StoreError, UniqueField};

/// Maps a driver error to the store taxonomy.
///
/// Unique violations prefer the structured constraint name and fall back to
/// the backend message, which is all SQLite reports.
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            let field = db
                .constraint()
                .map(UniqueField::classify)
                .unwrap_or_else(|| UniqueField::classify(db.message()));
            StoreError::unique(field)
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::connection(err.to_string())
        }
        _ => StoreError::database(err.to_string()),
    }
}
