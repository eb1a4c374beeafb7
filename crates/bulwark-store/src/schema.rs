// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Relational schema.
//!
//! Every statement is idempotent so bootstrap can run on each start. Unique
//! constraints are the final arbiters for concurrent sign-ups and must keep
//! their column names; the store reads them back from violation messages.

/// Schema bootstrap script.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    user_id     BLOB PRIMARY KEY NOT NULL,
    username    TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    deleted_at  TEXT,
    CONSTRAINT users_username_key UNIQUE (username)
);

CREATE TABLE IF NOT EXISTS users_private (
    user_id        BLOB PRIMARY KEY NOT NULL REFERENCES users (user_id) ON DELETE CASCADE,
    email          TEXT NOT NULL COLLATE NOCASE,
    password_hash  TEXT NOT NULL,
    CONSTRAINT users_private_email_key UNIQUE (email)
);

CREATE TABLE IF NOT EXISTS roles (
    role_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    name     TEXT NOT NULL,
    CONSTRAINT roles_name_key UNIQUE (name)
);

CREATE TABLE IF NOT EXISTS user_roles (
    user_id  BLOB NOT NULL REFERENCES users (user_id) ON DELETE CASCADE,
    role_id  INTEGER NOT NULL REFERENCES roles (role_id) ON DELETE CASCADE,
    PRIMARY KEY (user_id, role_id)
);

CREATE TABLE IF NOT EXISTS refresh_tokens (
    id          BLOB PRIMARY KEY NOT NULL,
    token_hash  TEXT NOT NULL,
    user_id     BLOB NOT NULL REFERENCES users (user_id) ON DELETE CASCADE,
    expires_at  TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    CONSTRAINT refresh_tokens_token_hash_key UNIQUE (token_hash)
);

CREATE INDEX IF NOT EXISTS refresh_tokens_user_id_idx ON refresh_tokens (user_id);
"#;

/// Tables created by [`SCHEMA`], in dependency order.
pub const TABLES: &[&str] = &[
    "users",
    "users_private",
    "roles",
    "user_roles",
    "refresh_tokens",
];
