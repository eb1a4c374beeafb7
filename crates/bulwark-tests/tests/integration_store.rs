// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Store Integration Tests
//!
//! The SQLite store on a file database with a real connection pool.

use std::sync::Arc;
use std::time::Duration;

use bulwark_core::{
    NewAccount, RefreshTokenStore, RoleRepository, StoreError, UniqueField, UserId,
    UserRepository,
};
use bulwark_store::{schema::TABLES, SqliteStore, StoreOptions};
use bulwark_tests::common::temp_test_dir;
use chrono::{Duration as ChronoDuration, Utc};

async fn file_store(dir: &tempfile::TempDir) -> SqliteStore {
    let url = format!("sqlite://{}", dir.path().join("bulwark.db").display());
    let options = StoreOptions::new(url)
        .with_max_connections(4)
        .with_busy_timeout(Duration::from_secs(5));

    let store = SqliteStore::connect(&options).await.unwrap();
    store.migrate().await.unwrap();
    store
}

#[tokio::test]
async fn test_store_bootstrap_creates_tables() {
    let dir = temp_test_dir("bulwark_store");
    let store = file_store(&dir).await;
    store.migrate().await.unwrap();

    for table in TABLES {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(*table)
        .fetch_one(store.pool())
        .await
        .unwrap();
        assert_eq!(count, 1, "missing table {}", table);
    }
}

#[tokio::test]
async fn test_store_concurrent_uniqueness() {
    let dir = temp_test_dir("bulwark_store");
    let store = Arc::new(file_store(&dir).await);

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .create_account(NewAccount::new(
                        format!("racer{}", i),
                        "race@x.com",
                        "hash",
                    ))
                    .await
            })
        })
        .collect();

    let mut created = 0;
    let mut conflicts = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => created += 1,
            Err(e) => {
                assert_eq!(e.unique_field(), Some(&UniqueField::Email), "{}", e);
                conflicts += 1;
            }
        }
    }

    assert_eq!(created, 1);
    assert_eq!(conflicts, 7);
}

#[tokio::test]
async fn test_store_refresh_sessions() {
    let dir = temp_test_dir("bulwark_store");
    let store = file_store(&dir).await;
    let alice = store
        .create_account(NewAccount::new("alice", "a@x.com", "hash"))
        .await
        .unwrap();

    let expires_at = Utc::now() + ChronoDuration::days(90);
    let inserted = store
        .insert("digest-1", &alice.user_id, expires_at)
        .await
        .unwrap();
    assert_eq!(inserted.user_id, alice.user_id);

    let found = store.find_by_hash("digest-1").await.unwrap().unwrap();
    assert_eq!(found.id, inserted.id);
    assert!(!found.is_expired(Utc::now()));

    let duplicate = store.insert("digest-1", &alice.user_id, expires_at).await;
    assert!(matches!(
        duplicate,
        Err(StoreError::UniqueViolation {
            field: UniqueField::TokenHash
        })
    ));

    assert!(store.delete_by_id(&found.id).await.unwrap());
    assert!(!store.delete_by_id(&found.id).await.unwrap());
    assert!(store.find_by_hash("digest-1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_store_sessions_need_a_user() {
    let dir = temp_test_dir("bulwark_store");
    let store = file_store(&dir).await;

    let result = store
        .insert("digest", &UserId::new(), Utc::now() + ChronoDuration::days(1))
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_store_role_grants() {
    let dir = temp_test_dir("bulwark_store");
    let store = file_store(&dir).await;
    let alice = store
        .create_account(NewAccount::new("alice", "a@x.com", "hash"))
        .await
        .unwrap();
    let bob = store
        .create_account(NewAccount::new("bob", "b@x.com", "hash"))
        .await
        .unwrap();

    store.grant_role(&alice.user_id, "admin").await.unwrap();
    store.grant_role(&alice.user_id, "admin").await.unwrap();
    store.grant_role(&alice.user_id, "editor").await.unwrap();
    store.grant_role(&bob.user_id, "editor").await.unwrap();

    let mut roles = store.roles_for_user(&alice.user_id).await.unwrap();
    roles.sort();
    assert_eq!(roles, vec!["admin", "editor"]);
    assert_eq!(store.roles_for_user(&bob.user_id).await.unwrap(), vec!["editor"]);
    assert!(store.roles_for_user(&UserId::new()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_store_survives_reopen() {
    let dir = temp_test_dir("bulwark_store");
    let user_id = {
        let store = file_store(&dir).await;
        let alice = store
            .create_account(NewAccount::new("alice", "a@x.com", "hash"))
            .await
            .unwrap();
        store.close().await;
        alice.user_id
    };

    let store = file_store(&dir).await;
    let account = store.find_by_email("A@X.COM").await.unwrap().unwrap();
    assert_eq!(account.identity.user_id, user_id);
}
