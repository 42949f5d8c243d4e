//! Audit entity model and DTOs.

use audittrack_core::audit::{self, AuditStatus, Lifecycle, Quarter, Step, StepStatus};
use audittrack_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// An audit row from the `audits` table. Steps are embedded JSONB; there
/// is no separate step table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Audit {
    pub id: DbId,
    pub project_id: DbId,
    pub quarter: Quarter,
    pub year: i32,
    pub assigned_auditor: DbId,
    pub status: AuditStatus,
    pub steps: Json<Vec<Step>>,
    pub remarks: Option<String>,
    pub scheduled_date: Option<Timestamp>,
    /// User ids whose email matched a collected stakeholder address.
    pub stakeholders: Vec<DbId>,
    /// The raw collected entries, kept as entered even without a matching
    /// user so notifications can still target the address-shaped ones.
    pub stakeholder_emails: Vec<String>,
    pub edit_request: bool,
    pub edit_enabled: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Audit {
    /// The three lifecycle fields, folded for the engine.
    pub fn lifecycle(&self) -> Lifecycle {
        Lifecycle {
            status: self.status,
            edit_request: self.edit_request,
            edit_enabled: self.edit_enabled,
        }
    }

    /// Response shape with the derived progress/health views attached.
    pub fn into_view(self) -> AuditView {
        let progress = audit::progress(&self.steps);
        let health = audit::health(&self.steps);
        AuditView {
            audit: self,
            progress,
            health,
        }
    }
}

/// An [`Audit`] plus the derived views the dashboards consume.
#[derive(Debug, Clone, Serialize)]
pub struct AuditView {
    #[serde(flatten)]
    pub audit: Audit,
    /// Rounded completion percentage (0 when there are no steps).
    pub progress: u8,
    /// Worst-of step status; absent when the audit has no steps.
    pub health: Option<StepStatus>,
}

/// Request body for creating/requesting an audit.
///
/// `year` falls back to the project's year (then the current year);
/// omitted `steps` become the default checklist.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAudit {
    pub project_id: DbId,
    pub quarter: Quarter,
    pub year: Option<i32>,
    pub assigned_auditor: DbId,
    pub steps: Option<Vec<Step>>,
    pub remarks: Option<String>,
}

/// Fully resolved insert payload built by the request handler after
/// stakeholder resolution and step defaulting.
#[derive(Debug, Clone)]
pub struct InsertAudit {
    pub project_id: DbId,
    pub quarter: Quarter,
    pub year: i32,
    pub assigned_auditor: DbId,
    pub steps: Vec<Step>,
    pub remarks: Option<String>,
    pub stakeholders: Vec<DbId>,
    pub stakeholder_emails: Vec<String>,
}

/// Broad field update (PUT). Lifecycle fields are deliberately absent;
/// those only move through the dedicated transition endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAudit {
    pub quarter: Option<Quarter>,
    pub year: Option<i32>,
    pub assigned_auditor: Option<DbId>,
    pub remarks: Option<String>,
    pub scheduled_date: Option<Timestamp>,
}
