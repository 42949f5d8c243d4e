//! HTTP-level integration tests for the audit lifecycle.
//!
//! Covers creation and the duplicate-open guard, stakeholder resolution on
//! request, the schedule/complete/request-edit/approve-edit/reopen
//! transitions, the edit lock, and list scoping per role.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, delete_auth, get_auth, patch_auth, patch_json_auth, post_auth, post_json_auth,
    seed_user, token_for,
};
use audittrack_core::roles::Role;
use audittrack_db::models::project::CreateProject;
use audittrack_db::models::user::User;
use audittrack_db::repositories::ProjectRepo;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_project(pool: &PgPool, dr_number: &str, ui_spocs: Vec<String>) -> i64 {
    let input = CreateProject {
        dr_number: dr_number.to_string(),
        name: format!("Project {dr_number}"),
        region: None,
        project_manager: None,
        ui_spocs,
        delivery_manager: Some("dm@test.com".to_string()),
        auditor_name: None,
        regional_spoc_lead: None,
        technology: None,
        year: Some(2026),
    };
    ProjectRepo::create(pool, &input)
        .await
        .expect("project creation should succeed")
        .id
}

/// Create an audit through the API as the given admin, returning its JSON.
async fn create_audit(
    pool: &PgPool,
    admin_token: &str,
    project_id: i64,
    auditor_id: i64,
) -> serde_json::Value {
    let body = serde_json::json!({
        "project_id": project_id,
        "quarter": "Q3",
        "assigned_auditor": auditor_id
    });
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/audits",
        admin_token,
        body,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

/// Mark every default step completed via the step-patch endpoint.
async fn complete_all_steps(pool: &PgPool, token: &str, audit_id: i64) {
    for index in 0..3 {
        let response = patch_json_auth(
            common::build_test_app(pool.clone()),
            &format!("/api/v1/audits/{audit_id}/steps/{index}"),
            token,
            serde_json::json!({ "completed": true }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

/// Seed the standard cast: an admin, an assigned auditor, a project, and a
/// fresh audit. Returns (admin, auditor, project_id, audit_id).
async fn standard_setup(pool: &PgPool) -> (User, User, i64, i64) {
    let admin = seed_user(pool, "Root", Role::Admin).await;
    let auditor = seed_user(pool, "Field Auditor", Role::Auditor).await;
    let project_id = seed_project(pool, "DR-100", vec!["spoc@test.com".to_string()]).await;
    let audit = create_audit(pool, &token_for(&admin), project_id, auditor.id).await;
    let audit_id = audit["id"].as_i64().unwrap();
    (admin, auditor, project_id, audit_id)
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_fills_defaults(pool: PgPool) {
    let admin = seed_user(&pool, "Root", Role::Admin).await;
    let auditor = seed_user(&pool, "Field Auditor", Role::Auditor).await;
    let project_id = seed_project(&pool, "DR-100", vec![]).await;

    let audit = create_audit(&pool, &token_for(&admin), project_id, auditor.id).await;

    assert_eq!(audit["status"], "Pending");
    assert_eq!(audit["year"], 2026, "falls back to the project year");
    assert_eq!(audit["steps"].as_array().unwrap().len(), 3);
    assert_eq!(audit["steps"][0]["name"], "Checklist");
    assert_eq!(audit["progress"], 0);
    assert_eq!(audit["health"], "amber");
    assert_eq!(audit["edit_request"], false);
    assert_eq!(audit["edit_enabled"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn second_open_audit_for_project_conflicts(pool: PgPool) {
    let (admin, auditor, project_id, _audit_id) = standard_setup(&pool).await;

    let body = serde_json::json!({
        "project_id": project_id,
        "quarter": "Q4",
        "assigned_auditor": auditor.id
    });
    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/v1/audits",
        &token_for(&admin),
        body,
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn new_audit_allowed_after_previous_completes(pool: PgPool) {
    let (admin, auditor, project_id, audit_id) = standard_setup(&pool).await;
    completed_audit(&pool, &token_for(&auditor), audit_id).await;

    // The guard only counts open audits, so a fresh cycle can start.
    let audit = create_audit(&pool, &token_for(&admin), project_id, auditor.id).await;
    assert_eq!(audit["status"], "Pending");
    assert_ne!(audit["id"].as_i64(), Some(audit_id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_rejects_unknown_project(pool: PgPool) {
    let admin = seed_user(&pool, "Root", Role::Admin).await;
    let auditor = seed_user(&pool, "Field Auditor", Role::Auditor).await;

    let body = serde_json::json!({
        "project_id": 999_999,
        "quarter": "Q1",
        "assigned_auditor": auditor.id
    });
    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/v1/audits",
        &token_for(&admin),
        body,
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn request_resolves_stakeholders(pool: PgPool) {
    let admin = seed_user(&pool, "Root", Role::Admin).await;
    let auditor = seed_user(&pool, "Field Auditor", Role::Auditor).await;
    // One SPOC with an account, one address without, one plain name.
    let spoc = seed_user(&pool, "Known Spoc", Role::Spoc).await;
    let project_id = seed_project(
        &pool,
        "DR-100",
        vec![
            spoc.email.clone(),
            "unknown@test.com".to_string(),
            "Offline Contact".to_string(),
        ],
    )
    .await;

    let body = serde_json::json!({
        "project_id": project_id,
        "quarter": "Q2",
        "assigned_auditor": auditor.id
    });
    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/v1/audits/request",
        &token_for(&admin),
        body,
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let audit = body_json(response).await;

    let emails: Vec<&str> = audit["stakeholder_emails"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert!(emails.contains(&spoc.email.as_str()));
    assert!(emails.contains(&"unknown@test.com"), "kept without an account");
    assert!(emails.contains(&"Offline Contact"), "SPOC entries stored as entered");
    assert!(emails.contains(&"dm@test.com"), "delivery manager included");

    let ids: Vec<i64> = audit["stakeholders"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![spoc.id], "only the matching account resolves");
}

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn assigned_auditor_schedules(pool: PgPool) {
    let (_admin, auditor, _project_id, audit_id) = standard_setup(&pool).await;

    let body = serde_json::json!({ "scheduled_date": "2026-09-15T10:00:00Z" });
    let response = post_json_auth(
        common::build_test_app(pool),
        &format!("/api/v1/audits/{audit_id}/schedule"),
        &token_for(&auditor),
        body,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "InProgress");
    assert_eq!(json["scheduled_date"], "2026-09-15T10:00:00Z");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn schedule_is_auditor_only(pool: PgPool) {
    let (admin, _auditor, _project_id, audit_id) = standard_setup(&pool).await;
    let other = seed_user(&pool, "Other Auditor", Role::Auditor).await;

    let body = serde_json::json!({ "scheduled_date": "2026-09-15T10:00:00Z" });

    // Admins do not schedule on the auditor's behalf.
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/audits/{audit_id}/schedule"),
        &token_for(&admin),
        body.clone(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Nor does an auditor the audit is not assigned to.
    let response = post_json_auth(
        common::build_test_app(pool),
        &format!("/api/v1/audits/{audit_id}/schedule"),
        &token_for(&other),
        body,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn schedule_twice_is_rejected(pool: PgPool) {
    let (_admin, auditor, _project_id, audit_id) = standard_setup(&pool).await;
    let token = token_for(&auditor);

    let body = serde_json::json!({ "scheduled_date": "2026-09-15T10:00:00Z" });
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/audits/{audit_id}/schedule"),
        &token,
        body.clone(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json_auth(
        common::build_test_app(pool),
        &format!("/api/v1/audits/{audit_id}/schedule"),
        &token,
        body,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Steps and completion
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn step_patch_updates_progress_and_health(pool: PgPool) {
    let (_admin, auditor, _project_id, audit_id) = standard_setup(&pool).await;
    let token = token_for(&auditor);

    let body = serde_json::json!({
        "completed": true,
        "status": "green",
        "remarks": "no findings",
        "reference_url": "https://wiki.internal/audit"
    });
    let response = patch_json_auth(
        common::build_test_app(pool),
        &format!("/api/v1/audits/{audit_id}/steps/0"),
        &token,
        body,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["steps"][0]["completed"], true);
    assert!(json["steps"][0]["completed_at"].is_string());
    assert_eq!(json["steps"][0]["remarks"], "no findings");
    assert_eq!(json["progress"], 33);
    assert_eq!(json["health"], "amber", "two steps are still amber");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn step_patch_rejects_bad_index(pool: PgPool) {
    let (_admin, auditor, _project_id, audit_id) = standard_setup(&pool).await;

    let response = patch_json_auth(
        common::build_test_app(pool),
        &format!("/api/v1/audits/{audit_id}/steps/7"),
        &token_for(&auditor),
        serde_json::json!({ "completed": true }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn complete_requires_all_steps_done(pool: PgPool) {
    let (_admin, auditor, _project_id, audit_id) = standard_setup(&pool).await;
    let token = token_for(&auditor);

    let response = patch_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/audits/{audit_id}/complete"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    complete_all_steps(&pool, &token, audit_id).await;

    let response = patch_auth(
        common::build_test_app(pool),
        &format!("/api/v1/audits/{audit_id}/complete"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "Completed");
    assert_eq!(json["progress"], 100);
}

// ---------------------------------------------------------------------------
// Edit lock and the request/approve/reopen cycle
// ---------------------------------------------------------------------------

/// Drive an audit to Completed as its assigned auditor.
async fn completed_audit(pool: &PgPool, auditor_token: &str, audit_id: i64) {
    complete_all_steps(pool, auditor_token, audit_id).await;
    let response = patch_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/audits/{audit_id}/complete"),
        auditor_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn completed_audit_locks_step_edits(pool: PgPool) {
    let (admin, auditor, _project_id, audit_id) = standard_setup(&pool).await;
    let token = token_for(&auditor);
    completed_audit(&pool, &token, audit_id).await;

    // The assigned auditor is locked out...
    let response = patch_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/audits/{audit_id}/steps/0"),
        &token,
        serde_json::json!({ "remarks": "too late" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // ...but an admin is not.
    let response = patch_json_auth(
        common::build_test_app(pool),
        &format!("/api/v1/audits/{audit_id}/steps/0"),
        &token_for(&admin),
        serde_json::json!({ "remarks": "admin override" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn edit_request_cycle(pool: PgPool) {
    let (admin, auditor, _project_id, audit_id) = standard_setup(&pool).await;
    let auditor_token = token_for(&auditor);
    let admin_token = token_for(&admin);
    completed_audit(&pool, &auditor_token, audit_id).await;

    // Request edit access.
    let response = patch_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/audits/{audit_id}/request-edit"),
        &auditor_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["edit_request"], true);
    assert_eq!(json["status"], "Completed");

    // A second request is rejected.
    let response = patch_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/audits/{audit_id}/request-edit"),
        &auditor_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The request shows up on the admin dashboard.
    let response = get_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/audits/edit-requests",
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["id"], audit_id);

    // Approval reopens the audit with edit access.
    let response = patch_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/audits/{audit_id}/approve-edit"),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "Pending");
    assert_eq!(json["edit_enabled"], true);
    assert_eq!(json["edit_request"], false);

    // The auditor can edit steps again.
    let response = patch_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/audits/{audit_id}/steps/1"),
        &auditor_token,
        serde_json::json!({ "remarks": "revised" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Re-completion revokes the access again.
    let response = patch_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/audits/{audit_id}/complete"),
        &auditor_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["edit_enabled"], false);

    let response = patch_json_auth(
        common::build_test_app(pool),
        &format!("/api/v1/audits/{audit_id}/steps/1"),
        &auditor_token,
        serde_json::json!({ "remarks": "locked again" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn request_edit_is_assigned_auditor_only(pool: PgPool) {
    let (admin, auditor, _project_id, audit_id) = standard_setup(&pool).await;
    completed_audit(&pool, &token_for(&auditor), audit_id).await;

    // Admins have no use for edit requests; the transition is auditor-only.
    let response = patch_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/audits/{audit_id}/request-edit"),
        &token_for(&admin),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Requesting on a non-completed audit is a validation error.
    let project2 = seed_project(&pool, "DR-200", vec![]).await;
    let audit2 = create_audit(&pool, &token_for(&admin), project2, auditor.id).await;
    let response = patch_auth(
        common::build_test_app(pool),
        &format!("/api/v1/audits/{}/request-edit", audit2["id"]),
        &token_for(&auditor),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reopen_clears_completion_without_edit_access(pool: PgPool) {
    let (admin, auditor, _project_id, audit_id) = standard_setup(&pool).await;
    let auditor_token = token_for(&auditor);
    completed_audit(&pool, &auditor_token, audit_id).await;

    let response = patch_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/audits/{audit_id}/reopen"),
        &token_for(&admin),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "Pending");
    assert_eq!(json["edit_enabled"], false);

    // Reopening a pending audit is rejected.
    let response = patch_auth(
        common::build_test_app(pool),
        &format!("/api/v1/audits/{audit_id}/reopen"),
        &token_for(&admin),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Notifications endpoint
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn resend_notification_rules(pool: PgPool) {
    let (admin, auditor, _project_id, audit_id) = standard_setup(&pool).await;
    let admin_token = token_for(&admin);

    // Fine while the audit is open (the disabled test mailer still reports
    // success).
    let response = post_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/audits/{audit_id}/resend-notification"),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Notification sent");

    // Auditors cannot resend.
    let response = post_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/audits/{audit_id}/resend-notification"),
        &token_for(&auditor),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Completed audits have nothing left to announce.
    completed_audit(&pool, &token_for(&auditor), audit_id).await;
    let response = post_auth(
        common::build_test_app(pool),
        &format!("/api/v1/audits/{audit_id}/resend-notification"),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Visibility and deletion
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_is_scoped_per_role(pool: PgPool) {
    let (admin, auditor, _project_id, _audit_id) = standard_setup(&pool).await;
    let other = seed_user(&pool, "Other Auditor", Role::Auditor).await;
    let spoc = seed_user(&pool, "Observer", Role::Spoc).await;
    let project2 = seed_project(&pool, "DR-200", vec![]).await;
    create_audit(&pool, &token_for(&admin), project2, other.id).await;

    // Admin sees both.
    let response =
        get_auth(common::build_test_app(pool.clone()), "/api/v1/audits", &token_for(&admin)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);

    // Each auditor sees only their own.
    let response =
        get_auth(common::build_test_app(pool.clone()), "/api/v1/audits", &token_for(&auditor))
            .await;
    let json = body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["assigned_auditor"], auditor.id);

    // SPOCs see nothing.
    let response =
        get_auth(common::build_test_app(pool), "/api/v1/audits", &token_for(&spoc)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn get_by_id_requires_admin_or_assignment(pool: PgPool) {
    let (_admin, _auditor, _project_id, audit_id) = standard_setup(&pool).await;
    let other = seed_user(&pool, "Other Auditor", Role::Auditor).await;

    let response = get_auth(
        common::build_test_app(pool),
        &format!("/api/v1/audits/{audit_id}"),
        &token_for(&other),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn corrupted_lifecycle_row_is_rejected_on_load(pool: PgPool) {
    let (admin, _auditor, _project_id, audit_id) = standard_setup(&pool).await;
    let token = token_for(&admin);

    // Completed with edit access granted is not a state any transition
    // produces; force it directly.
    sqlx::query(
        "UPDATE audits SET status = 'Completed', edit_request = TRUE, edit_enabled = TRUE \
         WHERE id = $1",
    )
    .bind(audit_id)
    .execute(&pool)
    .await
    .expect("row corruption should apply");

    // Reading surfaces the illegal combination instead of serving it.
    let response = get_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/audits/{audit_id}"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // No transition runs on it either.
    let response = patch_auth(
        common::build_test_app(pool),
        &format!("/api/v1/audits/{audit_id}/reopen"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_deletes_audit(pool: PgPool) {
    let (admin, _auditor, _project_id, audit_id) = standard_setup(&pool).await;
    let token = token_for(&admin);

    let response = delete_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/audits/{audit_id}"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(
        common::build_test_app(pool),
        &format!("/api/v1/audits/{audit_id}"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
