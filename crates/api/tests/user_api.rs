//! HTTP-level integration tests for admin user management.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, delete_auth, get_auth, post_json_auth, put_json_auth, seed_user, token_for,
};
use audittrack_core::roles::Role;
use audittrack_db::repositories::UserRepo;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_creates_and_lists_users(pool: PgPool) {
    let admin = seed_user(&pool, "Root", Role::Admin).await;
    let token = token_for(&admin);

    let body = serde_json::json!({
        "name": "New Auditor",
        "email": "new.auditor@test.com",
        "password": "long enough password",
        "role": "Auditor",
        "region": "EMEA"
    });
    let response =
        post_json_auth(common::build_test_app(pool.clone()), "/api/v1/users", &token, body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["role"], "Auditor");
    assert_eq!(created["region"], "EMEA");

    let response = get_auth(common::build_test_app(pool), "/api/v1/users", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn non_admin_is_forbidden(pool: PgPool) {
    let auditor = seed_user(&pool, "Plain Auditor", Role::Auditor).await;
    let token = token_for(&auditor);

    let response = get_auth(common::build_test_app(pool), "/api/v1/users", &token).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_email_returns_409(pool: PgPool) {
    let admin = seed_user(&pool, "Root", Role::Admin).await;
    let existing = seed_user(&pool, "Taken", Role::Spoc).await;
    let token = token_for(&admin);

    let body = serde_json::json!({
        "name": "Impostor",
        "email": existing.email,
        "password": "long enough password",
        "role": "Auditor"
    });
    let response = post_json_auth(common::build_test_app(pool), "/api/v1/users", &token, body).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn short_password_is_rejected(pool: PgPool) {
    let admin = seed_user(&pool, "Root", Role::Admin).await;
    let token = token_for(&admin);

    let body = serde_json::json!({
        "name": "Weak",
        "email": "weak@test.com",
        "password": "short",
        "role": "Auditor"
    });
    let response = post_json_auth(common::build_test_app(pool), "/api/v1/users", &token, body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_changes_role_and_rehashes_password(pool: PgPool) {
    let admin = seed_user(&pool, "Root", Role::Admin).await;
    let target = seed_user(&pool, "Promotee", Role::Spoc).await;
    let token = token_for(&admin);
    let old_hash = target.password_hash.clone();

    let body = serde_json::json!({ "role": "Auditor", "password": "a brand new password" });
    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/users/{}", target.id),
        &token,
        body,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["role"], "Auditor");

    let stored = UserRepo::find_by_id(&pool, target.id).await.unwrap().unwrap();
    assert_ne!(stored.password_hash, old_hash, "password must be re-hashed");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_removes_user(pool: PgPool) {
    let admin = seed_user(&pool, "Root", Role::Admin).await;
    let target = seed_user(&pool, "Leaver", Role::Auditor).await;
    let token = token_for(&admin);

    let response = delete_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/users/{}", target.id),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert!(UserRepo::find_by_id(&pool, target.id).await.unwrap().is_none());

    // Deleting again is a 404.
    let response = delete_auth(
        common::build_test_app(pool),
        &format!("/api/v1/users/{}", target.id),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
