//! Repository for the `projects` table.

use audittrack_core::types::DbId;
use sqlx::PgPool;

use crate::models::project::{CreateProject, Project, UpdateProject};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, dr_number, name, region, project_manager, ui_spocs, \
                       delivery_manager, auditor_name, regional_spoc_lead, technology, year, \
                       created_at, updated_at";

/// Provides CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateProject) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (dr_number, name, region, project_manager, ui_spocs,
                                   delivery_manager, auditor_name, regional_spoc_lead,
                                   technology, year)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(&input.dr_number)
            .bind(&input.name)
            .bind(&input.region)
            .bind(&input.project_manager)
            .bind(&input.ui_spocs)
            .bind(&input.delivery_manager)
            .bind(&input.auditor_name)
            .bind(&input.regional_spoc_lead)
            .bind(&input.technology)
            .bind(input.year)
            .fetch_one(pool)
            .await
    }

    /// Find a project by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all projects, most recently created first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects ORDER BY created_at DESC");
        sqlx::query_as::<_, Project>(&query).fetch_all(pool).await
    }

    /// List only the projects that have audits assigned to the given
    /// auditor (the auditor-facing roster view).
    pub async fn list_for_auditor(
        pool: &PgPool,
        auditor_id: DbId,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let query = "SELECT DISTINCT ON (p.id)
                p.id, p.dr_number, p.name, p.region, p.project_manager, p.ui_spocs,
                p.delivery_manager, p.auditor_name, p.regional_spoc_lead, p.technology,
                p.year, p.created_at, p.updated_at
             FROM projects p
             JOIN audits a ON a.project_id = p.id
             WHERE a.assigned_auditor = $1
             ORDER BY p.id, p.created_at DESC";
        sqlx::query_as::<_, Project>(query)
            .bind(auditor_id)
            .fetch_all(pool)
            .await
    }

    /// Update a project. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProject,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                dr_number = COALESCE($2, dr_number),
                name = COALESCE($3, name),
                region = COALESCE($4, region),
                project_manager = COALESCE($5, project_manager),
                ui_spocs = COALESCE($6, ui_spocs),
                delivery_manager = COALESCE($7, delivery_manager),
                auditor_name = COALESCE($8, auditor_name),
                regional_spoc_lead = COALESCE($9, regional_spoc_lead),
                technology = COALESCE($10, technology),
                year = COALESCE($11, year),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(&input.dr_number)
            .bind(&input.name)
            .bind(&input.region)
            .bind(&input.project_manager)
            .bind(&input.ui_spocs)
            .bind(&input.delivery_manager)
            .bind(&input.auditor_name)
            .bind(&input.regional_spoc_lead)
            .bind(&input.technology)
            .bind(input.year)
            .fetch_optional(pool)
            .await
    }

    /// Delete a project by ID. Returns `true` if a row was removed.
    /// Audits referencing it cascade away with it.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
