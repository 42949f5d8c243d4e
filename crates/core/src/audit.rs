//! Audit lifecycle engine.
//!
//! Owns every state-machine, authorization, and derived-view decision for
//! the `Audit` entity. The persisted representation keeps the three fields
//! the data model prescribes (`status`, `edit_request`, `edit_enabled`);
//! [`Lifecycle::phase`] folds them into a single explicit sub-state enum so
//! illegal flag combinations are rejected in exactly one place; handlers
//! run it on every row they load, before any transition.
//!
//! Handlers load a row, call one of the pure transition functions here,
//! persist the result, and only then fire notifications. Nothing in this
//! module performs I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Status enums
// ---------------------------------------------------------------------------

/// Top-level audit status. Maps onto the `audit_status` PostgreSQL enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "audit_status")]
pub enum AuditStatus {
    Pending,
    InProgress,
    Completed,
}

/// Fiscal quarter an audit covers. Maps onto the `audit_quarter` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "audit_quarter")]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

/// Red/amber/green health marker on a step (and on the derived audit
/// health). Lives inside the JSONB step list, so serde-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Red,
    Amber,
    Green,
}

impl Default for StepStatus {
    fn default() -> Self {
        StepStatus::Amber
    }
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// One checklist item inside an audit. Owned exclusively by its parent
/// audit document (stored as a JSONB array element, no identity of its own).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub remarks: String,
    /// Set exactly when `completed` flips false -> true, cleared on the
    /// reverse flip.
    #[serde(default)]
    pub completed_at: Option<Timestamp>,
    #[serde(default)]
    pub status: StepStatus,
    #[serde(default)]
    pub reference_url: Option<String>,
}

impl Step {
    /// A fresh, unstarted step with the given name.
    pub fn named(name: &str) -> Self {
        Step {
            name: name.to_string(),
            completed: false,
            remarks: String::new(),
            completed_at: None,
            status: StepStatus::Amber,
            reference_url: None,
        }
    }
}

/// The checklist an audit starts with when the request supplies none.
pub fn default_steps() -> Vec<Step> {
    vec![
        Step::named("Checklist"),
        Step::named("Elevated Checklist"),
        Step::named("Deep Audit"),
    ]
}

/// Partial update for a single step. Only present fields are applied.
/// `reference_url` distinguishes an absent field from an explicit `null`,
/// which clears the stored link.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StepPatch {
    pub completed: Option<bool>,
    pub remarks: Option<String>,
    pub status: Option<StepStatus>,
    #[serde(default, deserialize_with = "some_if_present")]
    pub reference_url: Option<Option<String>>,
}

// Serde folds a JSON `null` into the outer `Option`, so a plain
// `Option<Option<String>>` field cannot tell "absent" from "null". Wrapping
// whatever was present in `Some` restores the distinction.
fn some_if_present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Apply a [`StepPatch`] to the step at `index`.
///
/// The index must land inside `[0, steps.len())`; anything else is a
/// validation error and nothing is mutated. Toggling `completed` maintains
/// `completed_at`: set to `now` on false -> true, cleared on true -> false.
pub fn apply_step_patch(
    steps: &mut [Step],
    index: i64,
    patch: &StepPatch,
    now: DateTime<Utc>,
) -> Result<(), CoreError> {
    if index < 0 || index as usize >= steps.len() {
        return Err(CoreError::validation(format!(
            "Invalid step index {index} (audit has {} steps)",
            steps.len()
        )));
    }
    let step = &mut steps[index as usize];
    if let Some(completed) = patch.completed {
        step.completed = completed;
        step.completed_at = completed.then_some(now);
    }
    if let Some(remarks) = &patch.remarks {
        step.remarks = remarks.clone();
    }
    if let Some(status) = patch.status {
        step.status = status;
    }
    if let Some(url) = &patch.reference_url {
        step.reference_url = url.clone();
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Lifecycle state machine
// ---------------------------------------------------------------------------

/// The persisted lifecycle fields of an audit, taken together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifecycle {
    pub status: AuditStatus,
    pub edit_request: bool,
    pub edit_enabled: bool,
}

/// Explicit enumeration of the legal lifecycle sub-states.
///
/// `edit_request` may only hold while Completed without edit access;
/// `edit_enabled` only after an approval reopened the audit to Pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuditPhase {
    Pending,
    InProgress,
    Completed,
    CompletedEditRequested,
    ReopenedForEdit,
}

impl Lifecycle {
    /// State of a freshly requested audit.
    pub fn new() -> Self {
        Lifecycle {
            status: AuditStatus::Pending,
            edit_request: false,
            edit_enabled: false,
        }
    }

    /// Fold the three persisted fields into the explicit sub-state enum.
    ///
    /// Returns an internal error for combinations the transition table can
    /// never produce (e.g. `edit_enabled` while still Completed), so a
    /// corrupted row is caught instead of silently misbehaving.
    pub fn phase(&self) -> Result<AuditPhase, CoreError> {
        match (self.status, self.edit_request, self.edit_enabled) {
            (AuditStatus::Pending, false, false) => Ok(AuditPhase::Pending),
            (AuditStatus::Pending, false, true) => Ok(AuditPhase::ReopenedForEdit),
            (AuditStatus::InProgress, false, false) => Ok(AuditPhase::InProgress),
            // An in-flight reopened audit keeps edit_enabled once scheduled.
            (AuditStatus::InProgress, false, true) => Ok(AuditPhase::ReopenedForEdit),
            (AuditStatus::Completed, false, false) => Ok(AuditPhase::Completed),
            (AuditStatus::Completed, true, false) => Ok(AuditPhase::CompletedEditRequested),
            (status, edit_request, edit_enabled) => Err(CoreError::Internal(format!(
                "illegal lifecycle combination: status={status:?} \
                 edit_request={edit_request} edit_enabled={edit_enabled}"
            ))),
        }
    }

    /// Auditor schedules the audit meeting: Pending -> InProgress.
    ///
    /// The caller is responsible for the ownership check and for setting
    /// `scheduled_date` alongside the returned state.
    pub fn schedule(&self) -> Result<Lifecycle, CoreError> {
        if self.status != AuditStatus::Pending {
            return Err(CoreError::validation(
                "Only a pending audit can be scheduled",
            ));
        }
        Ok(Lifecycle {
            status: AuditStatus::InProgress,
            ..*self
        })
    }

    /// Mark the audit completed. Requires every step done; clears both
    /// edit flags so a reopened audit locks again on re-completion.
    pub fn complete(&self, steps: &[Step]) -> Result<Lifecycle, CoreError> {
        if self.status == AuditStatus::Completed {
            return Err(CoreError::validation("Audit is already completed"));
        }
        if !steps.iter().all(|s| s.completed) {
            return Err(CoreError::validation(
                "All steps must be completed before marking the audit as completed",
            ));
        }
        Ok(Lifecycle {
            status: AuditStatus::Completed,
            edit_request: false,
            edit_enabled: false,
        })
    }

    /// Assigned auditor asks for edit access on a completed audit.
    pub fn request_edit(&self) -> Result<Lifecycle, CoreError> {
        if self.status != AuditStatus::Completed {
            return Err(CoreError::validation("Audit is not completed"));
        }
        if self.edit_request {
            return Err(CoreError::validation("Edit request already sent"));
        }
        Ok(Lifecycle {
            edit_request: true,
            ..*self
        })
    }

    /// Admin grants edit access: the audit immediately reopens to Pending
    /// with `edit_enabled` set, so Completed and edit access never coexist.
    pub fn approve_edit(&self) -> Result<Lifecycle, CoreError> {
        if self.status != AuditStatus::Completed {
            return Err(CoreError::validation("Audit is not completed"));
        }
        Ok(Lifecycle {
            status: AuditStatus::Pending,
            edit_request: false,
            edit_enabled: true,
        })
    }

    /// Admin reopens a completed audit without granting the auditor edit
    /// access (unlike [`Lifecycle::approve_edit`]).
    pub fn reopen(&self) -> Result<Lifecycle, CoreError> {
        if self.status != AuditStatus::Completed {
            return Err(CoreError::validation(
                "Only completed audits can be reopened",
            ));
        }
        Ok(Lifecycle {
            status: AuditStatus::Pending,
            edit_request: false,
            edit_enabled: false,
        })
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Lifecycle::new()
    }
}

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

/// Whether `actor` may mutate step fields on an audit right now.
///
/// Admins always may. The assigned auditor may unless the audit is
/// completed and locked (no edit access granted). Re-derived on every
/// mutating request, never cached.
pub fn can_edit(
    actor_role: Role,
    actor_id: DbId,
    assigned_auditor: DbId,
    lifecycle: &Lifecycle,
) -> bool {
    if actor_role == Role::Admin {
        return true;
    }
    actor_id == assigned_auditor
        && (lifecycle.status != AuditStatus::Completed || lifecycle.edit_enabled)
}

// ---------------------------------------------------------------------------
// Derived views
// ---------------------------------------------------------------------------

/// Completion percentage, rounded to the nearest integer. Zero steps
/// means zero percent.
pub fn progress(steps: &[Step]) -> u8 {
    if steps.is_empty() {
        return 0;
    }
    let done = steps.iter().filter(|s| s.completed).count();
    ((done as f64 / steps.len() as f64) * 100.0).round() as u8
}

/// Worst-of health roll-up: any red step makes the audit red, else any
/// amber makes it amber, else green. `None` when there are no steps.
pub fn health(steps: &[Step]) -> Option<StepStatus> {
    if steps.is_empty() {
        return None;
    }
    if steps.iter().any(|s| s.status == StepStatus::Red) {
        Some(StepStatus::Red)
    } else if steps.iter().any(|s| s.status == StepStatus::Amber) {
        Some(StepStatus::Amber)
    } else {
        Some(StepStatus::Green)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
