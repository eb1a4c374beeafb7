// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Row types read back from SQLite.

use bulwark_core::{Account, Credential, Identity, RefreshSession, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
    pub user_id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<UserRow> for Identity {
    fn from(row: UserRow) -> Self {
        Self {
            user_id: UserId::from_uuid(row.user_id),
            username: row.username,
            created_at: row.created_at,
            deleted_at: row.deleted_at,
        }
    }
}

#[derive(FromRow)]
pub(crate) struct AccountRow {
    pub user_id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub email: String,
    pub password_hash: String,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        let user_id = UserId::from_uuid(row.user_id);
        Self {
            identity: Identity {
                user_id,
                username: row.username,
                created_at: row.created_at,
                deleted_at: row.deleted_at,
            },
            credential: Credential {
                user_id,
                email: row.email,
                password_hash: row.password_hash,
            },
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct RefreshRow {
    pub id: Uuid,
    pub token_hash: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<RefreshRow> for RefreshSession {
    fn from(row: RefreshRow) -> Self {
        Self {
            id: row.id,
            token_hash: row.token_hash,
            user_id: UserId::from_uuid(row.user_id),
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}
