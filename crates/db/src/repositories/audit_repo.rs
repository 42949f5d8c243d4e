//! Repository for the `audits` table.
//!
//! Lifecycle transitions are computed by `audittrack_core::audit`; this
//! repo only persists the outcome. Each write is a single-document
//! read-validate-write with last-writer-wins semantics (no optimistic
//! concurrency token).

use audittrack_core::audit::{Lifecycle, Step};
use audittrack_core::types::{DbId, Timestamp};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::audit::{Audit, InsertAudit, UpdateAudit};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, project_id, quarter, year, assigned_auditor, status, steps, \
                       remarks, scheduled_date, stakeholders, stakeholder_emails, \
                       edit_request, edit_enabled, created_at, updated_at";

/// Provides persistence for audits.
pub struct AuditRepo;

impl AuditRepo {
    /// Insert a fully resolved audit, returning the created row.
    pub async fn create(pool: &PgPool, input: &InsertAudit) -> Result<Audit, sqlx::Error> {
        let query = format!(
            "INSERT INTO audits (project_id, quarter, year, assigned_auditor, steps,
                                 remarks, stakeholders, stakeholder_emails)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Audit>(&query)
            .bind(input.project_id)
            .bind(input.quarter)
            .bind(input.year)
            .bind(input.assigned_auditor)
            .bind(Json(&input.steps))
            .bind(&input.remarks)
            .bind(&input.stakeholders)
            .bind(&input.stakeholder_emails)
            .fetch_one(pool)
            .await
    }

    /// Find an audit by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Audit>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM audits WHERE id = $1");
        sqlx::query_as::<_, Audit>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The not-yet-completed audit for a project, if one exists. At most
    /// one can exist (partial unique index `uq_audits_open_project`).
    pub async fn find_open_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Option<Audit>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM audits
             WHERE project_id = $1 AND status <> 'Completed'"
        );
        sqlx::query_as::<_, Audit>(&query)
            .bind(project_id)
            .fetch_optional(pool)
            .await
    }

    /// List all audits, most recently created first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Audit>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM audits ORDER BY created_at DESC");
        sqlx::query_as::<_, Audit>(&query).fetch_all(pool).await
    }

    /// List the audits assigned to one auditor.
    pub async fn list_by_auditor(
        pool: &PgPool,
        auditor_id: DbId,
    ) -> Result<Vec<Audit>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM audits
             WHERE assigned_auditor = $1
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Audit>(&query)
            .bind(auditor_id)
            .fetch_all(pool)
            .await
    }

    /// Pending edit-access requests for the admin dashboard:
    /// `edit_request` set, access not yet granted.
    pub async fn list_edit_requests(pool: &PgPool) -> Result<Vec<Audit>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM audits
             WHERE edit_request = TRUE AND edit_enabled = FALSE
             ORDER BY updated_at DESC"
        );
        sqlx::query_as::<_, Audit>(&query).fetch_all(pool).await
    }

    /// Audits with a scheduled date inside `[from, until)`, for the
    /// reminder job's upcoming/past-due windows.
    pub async fn list_scheduled_between(
        pool: &PgPool,
        from: Timestamp,
        until: Timestamp,
    ) -> Result<Vec<Audit>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM audits
             WHERE scheduled_date >= $1 AND scheduled_date < $2
             ORDER BY scheduled_date"
        );
        sqlx::query_as::<_, Audit>(&query)
            .bind(from)
            .bind(until)
            .fetch_all(pool)
            .await
    }

    /// Broad field update. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateAudit,
    ) -> Result<Option<Audit>, sqlx::Error> {
        let query = format!(
            "UPDATE audits SET
                quarter = COALESCE($2, quarter),
                year = COALESCE($3, year),
                assigned_auditor = COALESCE($4, assigned_auditor),
                remarks = COALESCE($5, remarks),
                scheduled_date = COALESCE($6, scheduled_date),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Audit>(&query)
            .bind(id)
            .bind(input.quarter)
            .bind(input.year)
            .bind(input.assigned_auditor)
            .bind(&input.remarks)
            .bind(input.scheduled_date)
            .fetch_optional(pool)
            .await
    }

    /// Replace the embedded step list.
    pub async fn update_steps(
        pool: &PgPool,
        id: DbId,
        steps: &[Step],
    ) -> Result<Option<Audit>, sqlx::Error> {
        let query = format!(
            "UPDATE audits SET steps = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Audit>(&query)
            .bind(id)
            .bind(Json(steps))
            .fetch_optional(pool)
            .await
    }

    /// Persist a lifecycle transition computed by the engine.
    pub async fn set_lifecycle(
        pool: &PgPool,
        id: DbId,
        lifecycle: Lifecycle,
    ) -> Result<Option<Audit>, sqlx::Error> {
        let query = format!(
            "UPDATE audits SET
                status = $2,
                edit_request = $3,
                edit_enabled = $4,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Audit>(&query)
            .bind(id)
            .bind(lifecycle.status)
            .bind(lifecycle.edit_request)
            .bind(lifecycle.edit_enabled)
            .fetch_optional(pool)
            .await
    }

    /// Persist the schedule transition: new lifecycle plus the meeting
    /// date in one statement.
    pub async fn schedule(
        pool: &PgPool,
        id: DbId,
        scheduled_date: Timestamp,
        lifecycle: Lifecycle,
    ) -> Result<Option<Audit>, sqlx::Error> {
        let query = format!(
            "UPDATE audits SET
                scheduled_date = $2,
                status = $3,
                edit_request = $4,
                edit_enabled = $5,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Audit>(&query)
            .bind(id)
            .bind(scheduled_date)
            .bind(lifecycle.status)
            .bind(lifecycle.edit_request)
            .bind(lifecycle.edit_enabled)
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete an audit. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM audits WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
