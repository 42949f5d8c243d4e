//! Handlers for the `/projects` resource.

use audittrack_core::error::CoreError;
use audittrack_core::roles::Role;
use audittrack_core::types::DbId;
use audittrack_db::models::project::{CreateProject, ImportProjectRow, Project, UpdateProject};
use audittrack_db::repositories::ProjectRepo;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireAuth};
use crate::state::AppState;

/// GET /api/v1/projects
///
/// Admins see the whole roster; auditors only the projects with audits
/// assigned to them. Other roles have no roster view.
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> AppResult<Json<Vec<Project>>> {
    let projects = match user.role {
        Role::Admin => ProjectRepo::list(&state.pool).await?,
        Role::Auditor => ProjectRepo::list_for_auditor(&state.pool, user.user_id).await?,
        Role::Spoc => {
            return Err(AppError::Core(CoreError::Forbidden(
                "No project list access for this role".into(),
            )))
        }
    };
    Ok(Json(projects))
}

/// POST /api/v1/projects
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(input): Json<CreateProject>,
) -> AppResult<(StatusCode, Json<Project>)> {
    let project = ProjectRepo::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /api/v1/projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Path(id): Path<DbId>,
) -> AppResult<Json<Project>> {
    let project = ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;
    Ok(Json(project))
}

/// PUT /api/v1/projects/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProject>,
) -> AppResult<Json<Project>> {
    let project = ProjectRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;
    Ok(Json(project))
}

/// DELETE /api/v1/projects/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let deleted = ProjectRepo::delete(&state.pool, id).await?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))
    }
}

// ---------------------------------------------------------------------------
// Bulk import
// ---------------------------------------------------------------------------

/// Per-row failure detail in an [`ImportReport`].
#[derive(Debug, Serialize)]
pub struct ImportRowError {
    /// Zero-based position in the submitted row list.
    pub row: usize,
    pub error: String,
}

/// Outcome of a bulk import: per-row success/failure counts.
#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub created: usize,
    pub failed: usize,
    pub errors: Vec<ImportRowError>,
}

/// POST /api/v1/projects/bulk-import
///
/// Accepts pre-parsed spreadsheet rows (the spreadsheet-to-row conversion
/// is an upstream concern). Rows are processed independently: a bad row is
/// recorded and the rest continue.
pub async fn bulk_import(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(rows): Json<Vec<ImportProjectRow>>,
) -> AppResult<Json<ImportReport>> {
    let mut report = ImportReport {
        created: 0,
        failed: 0,
        errors: Vec::new(),
    };

    for (row_index, row) in rows.into_iter().enumerate() {
        match import_row(&state, row).await {
            Ok(()) => report.created += 1,
            Err(error) => {
                report.failed += 1;
                report.errors.push(ImportRowError {
                    row: row_index,
                    error,
                });
            }
        }
    }

    Ok(Json(report))
}

/// Validate and insert one import row, returning a human-readable error
/// on failure.
async fn import_row(state: &AppState, row: ImportProjectRow) -> Result<(), String> {
    let dr_number = row
        .dr_number
        .filter(|v| !v.trim().is_empty())
        .ok_or("Missing DR number")?;
    let name = row
        .name
        .filter(|v| !v.trim().is_empty())
        .ok_or("Missing project name")?;

    let input = CreateProject {
        dr_number,
        name,
        region: row.region,
        project_manager: row.project_manager,
        ui_spocs: row.ui_spocs,
        delivery_manager: row.delivery_manager,
        auditor_name: row.auditor_name,
        regional_spoc_lead: row.regional_spoc_lead,
        technology: row.technology,
        year: row.year,
    };

    ProjectRepo::create(&state.pool, &input)
        .await
        .map(|_| ())
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                "Duplicate DR number".to_string()
            }
            other => other.to_string(),
        })
}
