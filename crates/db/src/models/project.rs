//! Project entity model and DTOs.

use audittrack_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A project row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    /// Unique delivery-request number identifying the engagement.
    pub dr_number: String,
    pub name: String,
    pub region: Option<String>,
    pub project_manager: Option<String>,
    /// Free-form contact strings; '@'-containing entries double as
    /// notification addresses.
    pub ui_spocs: Vec<String>,
    pub delivery_manager: Option<String>,
    pub auditor_name: Option<String>,
    pub regional_spoc_lead: Option<String>,
    pub technology: Option<String>,
    pub year: Option<i32>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new project.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub dr_number: String,
    pub name: String,
    pub region: Option<String>,
    pub project_manager: Option<String>,
    #[serde(default)]
    pub ui_spocs: Vec<String>,
    pub delivery_manager: Option<String>,
    pub auditor_name: Option<String>,
    pub regional_spoc_lead: Option<String>,
    pub technology: Option<String>,
    pub year: Option<i32>,
}

/// DTO for updating an existing project. All fields are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProject {
    pub dr_number: Option<String>,
    pub name: Option<String>,
    pub region: Option<String>,
    pub project_manager: Option<String>,
    pub ui_spocs: Option<Vec<String>>,
    pub delivery_manager: Option<String>,
    pub auditor_name: Option<String>,
    pub regional_spoc_lead: Option<String>,
    pub technology: Option<String>,
    pub year: Option<i32>,
}

/// One pre-parsed spreadsheet row for bulk import. The spreadsheet-to-row
/// conversion happens upstream; rows arrive with whatever fields survived,
/// so everything except the identifying pair is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportProjectRow {
    #[serde(default)]
    pub dr_number: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub region: Option<String>,
    pub project_manager: Option<String>,
    #[serde(default)]
    pub ui_spocs: Vec<String>,
    pub delivery_manager: Option<String>,
    pub auditor_name: Option<String>,
    pub regional_spoc_lead: Option<String>,
    pub technology: Option<String>,
    pub year: Option<i32>,
}
