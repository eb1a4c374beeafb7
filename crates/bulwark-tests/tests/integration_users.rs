// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Users Integration Tests
//!
//! Profile endpoints behind the guard, the `me` resolver and the role check.

use bulwark_api::error::USERNAME_TAKEN;
use bulwark_api::service::USER_NOT_FOUND;
use bulwark_core::UserId;
use bulwark_tests::prelude::*;
use serde_json::json;

// =============================================================================
// Reads
// =============================================================================

#[tokio::test]
async fn test_get_profile() {
    let app = TestApp::new().await;
    let alice = app.sign_up(&Credentials::alice()).await;
    let bob = app.sign_up(&Credentials::bob()).await;

    // Any authenticated caller may read.
    let response = app.get(&alice.profile_path(), Some(&bob.auth_token)).await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.str_field("userId"), Some(alice.user_id.to_string().as_str()));
    assert_eq!(response.str_field("username"), Some("alice"));
    assert!(response.str_field("createdAt").is_some());
    assert!(response.body.get("email").is_none());
}

#[tokio::test]
async fn test_get_unknown_profile() {
    let app = TestApp::new().await;
    let alice = app.sign_up(&Credentials::alice()).await;

    app.get(&format!("/users/{}", UserId::new()), Some(&alice.auth_token))
        .await
        .assert_error(StatusCode::NOT_FOUND, USER_NOT_FOUND);

    app.get("/users/not-a-uuid", Some(&alice.auth_token))
        .await
        .assert_error(StatusCode::NOT_FOUND, USER_NOT_FOUND);
}

#[tokio::test]
async fn test_get_deleted_profile() {
    let app = TestApp::new().await;
    let alice = app.sign_up(&Credentials::alice()).await;
    let bob = app.sign_up(&Credentials::bob()).await;
    app.soft_delete(&alice.user_id).await;

    app.get(&alice.profile_path(), Some(&bob.auth_token))
        .await
        .assert_error(StatusCode::NOT_FOUND, USER_NOT_FOUND);
}

// =============================================================================
// `me` resolution
// =============================================================================

#[tokio::test]
async fn test_me_resolves_to_caller() {
    let app = TestApp::new().await;
    let alice = app.sign_up(&Credentials::alice()).await;

    let response = app.get("/users/me", Some(&alice.auth_token)).await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.str_field("userId"), Some(alice.user_id.to_string().as_str()));
}

#[tokio::test]
async fn test_me_without_identity() {
    let app = TestApp::new().await;

    app.get("/users/me", None).await.assert_error(
        StatusCode::UNAUTHORIZED,
        "Authentication required to resolve 'me'",
    );
}

#[tokio::test]
async fn test_me_satisfies_ownership() {
    let app = TestApp::new().await;
    let alice = app.sign_up(&Credentials::alice()).await;

    let response = app
        .patch("/users/me", Some(&alice.auth_token), json!({ "username": "alicia" }))
        .await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.str_field("username"), Some("alicia"));
}

// =============================================================================
// Updates
// =============================================================================

#[tokio::test]
async fn test_update_username_taken() {
    let app = TestApp::new().await;
    let alice = app.sign_up(&Credentials::alice()).await;
    app.sign_up(&Credentials::bob()).await;

    app.patch(
        &alice.profile_path(),
        Some(&alice.auth_token),
        json!({ "username": "bob" }),
    )
    .await
    .assert_error(StatusCode::CONFLICT, USERNAME_TAKEN);
}

#[tokio::test]
async fn test_update_validation() {
    let app = TestApp::new().await;
    let alice = app.sign_up(&Credentials::alice()).await;
    let path = alice.profile_path();

    app.patch(&path, Some(&alice.auth_token), json!({ "username": "" }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    app.patch(&path, Some(&alice.auth_token), json!({ "email": "new@x.com" }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_update_without_changes() {
    let app = TestApp::new().await;
    let alice = app.sign_up(&Credentials::alice()).await;

    let response = app
        .patch(&alice.profile_path(), Some(&alice.auth_token), json!({}))
        .await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.str_field("username"), Some("alice"));
}

#[tokio::test]
async fn test_update_deleted_owner() {
    let app = TestApp::new().await;
    let alice = app.sign_up(&Credentials::alice()).await;
    app.soft_delete(&alice.user_id).await;

    // The token is still valid until it expires; the profile is gone.
    app.patch(
        &alice.profile_path(),
        Some(&alice.auth_token),
        json!({ "username": "ghost" }),
    )
    .await
    .assert_error(StatusCode::NOT_FOUND, USER_NOT_FOUND);
}

#[tokio::test]
async fn test_username_change_frees_old_name() {
    let app = TestApp::new().await;
    let alice = app.sign_up(&Credentials::alice()).await;

    app.patch(
        &alice.profile_path(),
        Some(&alice.auth_token),
        json!({ "username": "alicia" }),
    )
    .await
    .assert_status(StatusCode::OK);

    let newcomer = app
        .sign_up(&Credentials::new("n@x.com", "password123", "alice"))
        .await;
    assert_eq!(newcomer.username, "alice");
}
