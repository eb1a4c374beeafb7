// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! SQLite-backed store.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use bulwark_core::{
    Account, Identity, IdentityUpdate, NewAccount, RefreshSession, RefreshTokenStore,
    RoleRepository, StoreError, StoreResult, UniqueField, UserId, UserRepository,
};

use crate::error::map_sqlx_error;
use crate::rows::{AccountRow, RefreshRow, UserRow};
use crate::schema::SCHEMA;

// =============================================================================
// StoreOptions
// =============================================================================

/// Connection settings for [`SqliteStore::connect`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Database URL, e.g. `sqlite://bulwark.db`.
    pub url: String,
    /// Maximum pooled connections.
    pub max_connections: u32,
    /// How long a writer waits for the database lock.
    pub busy_timeout: Duration,
}

impl StoreOptions {
    /// Creates options for the given URL with default pool settings.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            busy_timeout: Duration::from_secs(5),
        }
    }

    /// Sets the pool size.
    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the busy timeout.
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }
}

// =============================================================================
// SqliteStore
// =============================================================================

/// Relational store over a shared `sqlx` pool.
///
/// Cloning is cheap; clones share the pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens a pool against a database file, creating it if missing.
    pub async fn connect(options: &StoreOptions) -> StoreResult<Self> {
        let connect = SqliteConnectOptions::from_str(&options.url)
            .map_err(|e| StoreError::connection(format!("invalid database url: {}", e)))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(options.busy_timeout)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(options.max_connections)
            .connect_with(connect)
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;

        info!(
            url = %options.url,
            max_connections = options.max_connections,
            "Database pool opened"
        );

        Ok(Self { pool })
    }

    /// Opens a private in-memory database with the schema applied.
    ///
    /// The pool holds exactly one connection that never expires, since the
    /// database lives only as long as that connection.
    pub async fn in_memory() -> StoreResult<Self> {
        let connect = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StoreError::connection(e.to_string()))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect)
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Wraps an existing pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the schema if it does not exist yet.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::migration(e.to_string()))?;
        debug!("Schema bootstrap complete");
        Ok(())
    }

    /// Round-trips a trivial query.
    pub async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Closes the pool, waiting for checked-out connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

// =============================================================================
// Account creation
// =============================================================================

async fn create_account_locked(
    conn: &mut SqliteConnection,
    account: &NewAccount,
) -> StoreResult<Identity> {
    let email_taken: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM users_private WHERE email = ?")
            .bind(&account.email)
            .fetch_optional(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;
    if email_taken.is_some() {
        return Err(StoreError::unique(UniqueField::Email));
    }

    let username_taken: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE username = ?")
        .bind(&account.username)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;
    if username_taken.is_some() {
        return Err(StoreError::unique(UniqueField::Username));
    }

    let identity = insert_identity(conn, &account.user_id, &account.username).await?;
    insert_credential(conn, account).await?;
    Ok(identity)
}

async fn insert_identity(
    conn: &mut SqliteConnection,
    user_id: &UserId,
    username: &str,
) -> StoreResult<Identity> {
    let row: UserRow = sqlx::query_as(
        "INSERT INTO users (user_id, username, created_at) VALUES (?, ?, ?) \
         RETURNING user_id, username, created_at, deleted_at",
    )
    .bind(user_id.as_uuid())
    .bind(username)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;
    Ok(row.into())
}

async fn insert_credential(conn: &mut SqliteConnection, account: &NewAccount) -> StoreResult<()> {
    sqlx::query("INSERT INTO users_private (user_id, email, password_hash) VALUES (?, ?, ?)")
        .bind(account.user_id.as_uuid())
        .bind(&account.email)
        .bind(&account.password_hash)
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;
    Ok(())
}

// =============================================================================
// UserRepository
// =============================================================================

#[async_trait]
impl UserRepository for SqliteStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let row: Option<AccountRow> = sqlx::query_as(
            "SELECT u.user_id, u.username, u.created_at, u.deleted_at, p.email, p.password_hash \
             FROM users_private p JOIN users u ON u.user_id = p.user_id \
             WHERE p.email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(Account::from))
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Identity>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT user_id, username, created_at, deleted_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(Identity::from))
    }

    async fn find_by_id(&self, user_id: &UserId) -> StoreResult<Option<Identity>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT user_id, username, created_at, deleted_at FROM users WHERE user_id = ?",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(Identity::from))
    }

    async fn create_account(&self, account: NewAccount) -> StoreResult<Identity> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;

        // IMMEDIATE takes the write lock before the pre-checks read, so a
        // concurrent sign-up waits on the busy timeout instead of failing
        // its lock upgrade halfway through.
        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;

        match create_account_locked(&mut conn, &account).await {
            Ok(identity) => {
                sqlx::query("COMMIT")
                    .execute(&mut *conn)
                    .await
                    .map_err(map_sqlx_error)?;
                debug!(user_id = %identity.user_id, "Account created");
                Ok(identity)
            }
            Err(err) => {
                if let Err(rollback) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                    warn!(error = %rollback, "Rollback after failed account creation failed");
                }
                Err(err)
            }
        }
    }

    async fn update_identity(
        &self,
        user_id: &UserId,
        update: IdentityUpdate,
    ) -> StoreResult<Identity> {
        let row: Option<UserRow> = sqlx::query_as(
            "UPDATE users SET \
                username = COALESCE(?, username), \
                deleted_at = COALESCE(?, deleted_at) \
             WHERE user_id = ? \
             RETURNING user_id, username, created_at, deleted_at",
        )
        .bind(update.username)
        .bind(update.deleted_at)
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(Identity::from)
            .ok_or_else(|| StoreError::not_found("user", user_id))
    }
}

// =============================================================================
// RoleRepository
// =============================================================================

#[async_trait]
impl RoleRepository for SqliteStore {
    async fn roles_for_user(&self, user_id: &UserId) -> StoreResult<Vec<String>> {
        sqlx::query_scalar(
            "SELECT r.name FROM roles r \
             JOIN user_roles ur ON ur.role_id = r.role_id \
             WHERE ur.user_id = ? \
             ORDER BY r.name",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn grant_role(&self, user_id: &UserId, role: &str) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE user_id = ?")
            .bind(user_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        if exists.is_none() {
            return Err(StoreError::not_found("user", user_id));
        }

        sqlx::query("INSERT INTO roles (name) VALUES (?) ON CONFLICT (name) DO NOTHING")
            .bind(role)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id) \
             SELECT ?, role_id FROM roles WHERE name = ? \
             ON CONFLICT (user_id, role_id) DO NOTHING",
        )
        .bind(user_id.as_uuid())
        .bind(role)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        info!(user_id = %user_id, role = role, "Role granted");
        Ok(())
    }
}

// =============================================================================
// RefreshTokenStore
// =============================================================================

#[async_trait]
impl RefreshTokenStore for SqliteStore {
    async fn insert(
        &self,
        token_hash: &str,
        user_id: &UserId,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<RefreshSession> {
        let row: RefreshRow = sqlx::query_as(
            "INSERT INTO refresh_tokens (id, token_hash, user_id, expires_at, created_at) \
             VALUES (?, ?, ?, ?, ?) \
             RETURNING id, token_hash, user_id, expires_at, created_at",
        )
        .bind(Uuid::now_v7())
        .bind(token_hash)
        .bind(user_id.as_uuid())
        .bind(expires_at)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn find_by_hash(&self, token_hash: &str) -> StoreResult<Option<RefreshSession>> {
        let row: Option<RefreshRow> = sqlx::query_as(
            "SELECT id, token_hash, user_id, expires_at, created_at \
             FROM refresh_tokens WHERE token_hash = ?",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(RefreshSession::from))
    }

    async fn delete_by_id(&self, id: &Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_hash(&self, token_hash: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = ?")
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Tests
// =============================================================================
