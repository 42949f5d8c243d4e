//! Handlers for the `/audits` resource: the lifecycle engine's HTTP face.
//!
//! Every transition follows the same shape: load the row, let
//! `audittrack_core::audit` validate and compute the next state, persist,
//! then fire the best-effort notification. Authorization beyond the route
//! extractor (assignment, edit lock) is decided here against the loaded
//! row, re-derived on every request.

use audittrack_core::audit::{self, AuditStatus, StepPatch};
use audittrack_core::error::CoreError;
use audittrack_core::roles::Role;
use audittrack_core::stakeholders::collect_stakeholder_entries;
use audittrack_core::types::{DbId, Timestamp};
use audittrack_db::models::audit::{Audit, AuditView, CreateAudit, InsertAudit, UpdateAudit};
use audittrack_db::models::project::Project;
use audittrack_db::models::user::User;
use audittrack_db::repositories::{AuditRepo, ProjectRepo, UserRepo};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Datelike, Utc};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireAuditor, RequireAuth};
use crate::notifications;
use crate::state::AppState;

/// Request body for `POST /audits/{id}/schedule`.
#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub scheduled_date: Timestamp,
}

// ---------------------------------------------------------------------------
// Shared lookups and checks
// ---------------------------------------------------------------------------

async fn load_audit(state: &AppState, id: DbId) -> AppResult<Audit> {
    let audit = AuditRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Audit", id }))?;
    // Every operation loads through here, so an illegal flag combination
    // (a corrupted row) is caught before any transition can run on it.
    audit.lifecycle().phase()?;
    Ok(audit)
}

async fn load_project(state: &AppState, id: DbId) -> AppResult<Project> {
    ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))
}

async fn load_user(state: &AppState, id: DbId) -> AppResult<User> {
    UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))
}

/// Admin, or the auditor this audit is assigned to.
fn ensure_admin_or_assigned(user: &AuthUser, audit: &Audit) -> Result<(), AppError> {
    if user.role == Role::Admin || user.user_id == audit.assigned_auditor {
        return Ok(());
    }
    Err(AppError::Core(CoreError::Forbidden(
        "Not the assigned auditor".into(),
    )))
}

/// The assigned auditor themselves; Admins are deliberately excluded
/// (used where the transition table names the auditor as sole actor).
fn ensure_assigned_auditor(user: &AuthUser, audit: &Audit) -> Result<(), AppError> {
    if user.role != Role::Auditor {
        return Err(AppError::Core(CoreError::Forbidden(
            "Auditor role required".into(),
        )));
    }
    if user.user_id != audit.assigned_auditor {
        return Err(AppError::Core(CoreError::Forbidden(
            "Not the assigned auditor".into(),
        )));
    }
    Ok(())
}

/// Reject a second open audit for the same project with a friendly
/// conflict before the partial unique index would.
async fn ensure_no_open_audit(state: &AppState, project_id: DbId) -> AppResult<()> {
    if AuditRepo::find_open_by_project(&state.pool, project_id)
        .await?
        .is_some()
    {
        return Err(AppError::Core(CoreError::Conflict(
            "An audit for this project is already planned and not completed".into(),
        )));
    }
    Ok(())
}

/// Year precedence: explicit on the request, else the project's, else the
/// current calendar year.
fn resolve_year(requested: Option<i32>, project: &Project) -> i32 {
    requested
        .or(project.year)
        .unwrap_or_else(|| Utc::now().year())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/v1/audits
///
/// Admins see every audit; auditors only their own assignments; other
/// roles have no list access.
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> AppResult<Json<Vec<AuditView>>> {
    let audits = match user.role {
        Role::Admin => AuditRepo::list(&state.pool).await?,
        Role::Auditor => AuditRepo::list_by_auditor(&state.pool, user.user_id).await?,
        Role::Spoc => {
            return Err(AppError::Core(CoreError::Forbidden(
                "No audit list access for this role".into(),
            )))
        }
    };
    Ok(Json(audits.into_iter().map(Audit::into_view).collect()))
}

/// GET /api/v1/audits/edit-requests
///
/// Admin dashboard: audits with a pending edit-access request.
pub async fn list_edit_requests(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> AppResult<Json<Vec<AuditView>>> {
    let audits = AuditRepo::list_edit_requests(&state.pool).await?;
    Ok(Json(audits.into_iter().map(Audit::into_view).collect()))
}

/// GET /api/v1/audits/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<DbId>,
) -> AppResult<Json<AuditView>> {
    let audit = load_audit(&state, id).await?;
    ensure_admin_or_assigned(&user, &audit)?;
    Ok(Json(audit.into_view()))
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

/// POST /api/v1/audits
///
/// Plain Admin create: no stakeholder resolution, default checklist when
/// none supplied. The assigned auditor is notified after the row exists.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(input): Json<CreateAudit>,
) -> AppResult<(StatusCode, Json<AuditView>)> {
    ensure_no_open_audit(&state, input.project_id).await?;
    let project = load_project(&state, input.project_id).await?;
    let auditor = load_user(&state, input.assigned_auditor).await?;

    let insert = InsertAudit {
        project_id: input.project_id,
        quarter: input.quarter,
        year: resolve_year(input.year, &project),
        assigned_auditor: input.assigned_auditor,
        steps: input.steps.unwrap_or_else(audit::default_steps),
        remarks: input.remarks,
        stakeholders: Vec::new(),
        stakeholder_emails: Vec::new(),
    };
    let created = AuditRepo::create(&state.pool, &insert).await?;

    notifications::send_audit_requested(&state.mailer, &auditor.email, &project, created.quarter)
        .await;

    Ok((StatusCode::CREATED, Json(created.into_view())))
}

/// POST /api/v1/audits/request
///
/// Admin requests an audit: like create, but resolves stakeholders from
/// the project's UI SPOCs + delivery manager, matching collected addresses
/// against user accounts. The raw address list is kept even for addresses
/// without an account.
pub async fn request(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(input): Json<CreateAudit>,
) -> AppResult<(StatusCode, Json<AuditView>)> {
    ensure_no_open_audit(&state, input.project_id).await?;
    let project = load_project(&state, input.project_id).await?;
    let auditor = load_user(&state, input.assigned_auditor).await?;

    let stakeholder_emails =
        collect_stakeholder_entries(&project.ui_spocs, project.delivery_manager.as_deref());
    let stakeholders = UserRepo::find_by_emails(&state.pool, &stakeholder_emails)
        .await?
        .into_iter()
        .map(|u| u.id)
        .collect();

    let insert = InsertAudit {
        project_id: input.project_id,
        quarter: input.quarter,
        year: resolve_year(input.year, &project),
        assigned_auditor: input.assigned_auditor,
        steps: match input.steps {
            Some(steps) if !steps.is_empty() => steps,
            _ => audit::default_steps(),
        },
        remarks: input.remarks,
        stakeholders,
        stakeholder_emails,
    };
    let created = AuditRepo::create(&state.pool, &insert).await?;

    notifications::send_audit_requested(&state.mailer, &auditor.email, &project, created.quarter)
        .await;

    Ok((StatusCode::CREATED, Json(created.into_view())))
}

// ---------------------------------------------------------------------------
// Broad update / delete
// ---------------------------------------------------------------------------

/// PUT /api/v1/audits/{id}
///
/// Broad field update. Lifecycle fields only move through the dedicated
/// transition endpoints below.
pub async fn update(
    State(state): State<AppState>,
    RequireAuditor(user): RequireAuditor,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateAudit>,
) -> AppResult<Json<AuditView>> {
    let audit = load_audit(&state, id).await?;
    ensure_admin_or_assigned(&user, &audit)?;

    let updated = AuditRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Audit", id }))?;
    Ok(Json(updated.into_view()))
}

/// DELETE /api/v1/audits/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let deleted = AuditRepo::delete(&state.pool, id).await?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound { entity: "Audit", id }))
    }
}

// ---------------------------------------------------------------------------
// Step updates
// ---------------------------------------------------------------------------

/// PATCH /api/v1/audits/{id}/steps/{index}
///
/// Mutate one step. Admins always may; the assigned auditor only while
/// the audit is not completed-and-locked (`can_edit`).
pub async fn patch_step(
    State(state): State<AppState>,
    RequireAuditor(user): RequireAuditor,
    Path((id, index)): Path<(DbId, i64)>,
    Json(patch): Json<StepPatch>,
) -> AppResult<Json<AuditView>> {
    let audit = load_audit(&state, id).await?;

    if !audit::can_edit(
        user.role,
        user.user_id,
        audit.assigned_auditor,
        &audit.lifecycle(),
    ) {
        let message = if user.user_id == audit.assigned_auditor {
            "Audit is completed. Edit access not granted"
        } else {
            "Not the assigned auditor"
        };
        return Err(AppError::Core(CoreError::Forbidden(message.into())));
    }

    let mut steps = audit.steps.0.clone();
    audit::apply_step_patch(&mut steps, index, &patch, Utc::now())?;

    let updated = AuditRepo::update_steps(&state.pool, id, &steps)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Audit", id }))?;
    Ok(Json(updated.into_view()))
}

// ---------------------------------------------------------------------------
// Lifecycle transitions
// ---------------------------------------------------------------------------

/// PATCH /api/v1/audits/{id}/complete
pub async fn complete(
    State(state): State<AppState>,
    RequireAuditor(user): RequireAuditor,
    Path(id): Path<DbId>,
) -> AppResult<Json<AuditView>> {
    let audit = load_audit(&state, id).await?;
    ensure_admin_or_assigned(&user, &audit)?;

    let next = audit.lifecycle().complete(&audit.steps)?;
    let updated = AuditRepo::set_lifecycle(&state.pool, id, next)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Audit", id }))?;
    Ok(Json(updated.into_view()))
}

/// PATCH /api/v1/audits/{id}/request-edit
///
/// The assigned auditor asks for edit access on a completed audit.
/// Admins never need this and are rejected by design.
pub async fn request_edit(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<AuditView>> {
    let audit = load_audit(&state, id).await?;
    ensure_assigned_auditor(&user, &audit)?;

    let next = audit.lifecycle().request_edit()?;
    let updated = AuditRepo::set_lifecycle(&state.pool, id, next)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Audit", id }))?;
    Ok(Json(updated.into_view()))
}

/// PATCH /api/v1/audits/{id}/approve-edit
///
/// Admin grants edit access: the audit reopens to Pending immediately.
pub async fn approve_edit(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<AuditView>> {
    let audit = load_audit(&state, id).await?;

    let next = audit.lifecycle().approve_edit()?;
    let updated = AuditRepo::set_lifecycle(&state.pool, id, next)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Audit", id }))?;
    Ok(Json(updated.into_view()))
}

/// PATCH /api/v1/audits/{id}/reopen
///
/// Admin reopens a completed audit without granting edit access.
pub async fn reopen(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<AuditView>> {
    let audit = load_audit(&state, id).await?;

    let next = audit.lifecycle().reopen()?;
    let updated = AuditRepo::set_lifecycle(&state.pool, id, next)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Audit", id }))?;
    Ok(Json(updated.into_view()))
}

/// POST /api/v1/audits/{id}/schedule
///
/// The assigned auditor schedules the audit meeting: Pending becomes
/// InProgress, and the project's UI SPOCs + delivery manager are notified.
pub async fn schedule(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<ScheduleRequest>,
) -> AppResult<Json<AuditView>> {
    let audit = load_audit(&state, id).await?;
    ensure_assigned_auditor(&user, &audit)?;

    let next = audit.lifecycle().schedule()?;
    let updated = AuditRepo::schedule(&state.pool, id, input.scheduled_date, next)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Audit", id }))?;

    let project = load_project(&state, updated.project_id).await?;
    notifications::send_audit_scheduled(&state.mailer, &project, input.scheduled_date).await;

    Ok(Json(updated.into_view()))
}

/// POST /api/v1/audits/{id}/resend-notification
///
/// Admin re-sends the request notification for a not-yet-completed audit.
/// No state change.
pub async fn resend_notification(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let audit = load_audit(&state, id).await?;
    if audit.status == AuditStatus::Completed {
        return Err(AppError::Core(CoreError::Validation(
            "Audit already completed".into(),
        )));
    }

    let project = load_project(&state, audit.project_id).await?;
    let auditor = load_user(&state, audit.assigned_auditor).await?;
    notifications::send_audit_requested(&state.mailer, &auditor.email, &project, audit.quarter)
        .await;

    Ok(Json(serde_json::json!({ "message": "Notification sent" })))
}
