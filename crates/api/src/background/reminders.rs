//! Daily audit reminder job.
//!
//! On every tick, finds audits whose `scheduled_date` falls inside the
//! next 24 hours (upcoming) or the previous 24 hours (recently due) and
//! emails the assigned auditor plus the project's email-like contacts.
//! Runs on a fixed interval using `tokio::time::interval`; a missing row
//! or failed send is logged and never stops the loop.

use std::sync::Arc;
use std::time::Duration;

use audittrack_db::repositories::{AuditRepo, ProjectRepo, UserRepo};
use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::notifications::{self, Mailer};

/// Default tick interval: once a day.
const DEFAULT_INTERVAL_SECS: u64 = 86_400;

/// Width of each reminder window on either side of now.
const WINDOW: chrono::Duration = chrono::Duration::hours(24);

/// Run the reminder loop until `cancel` is triggered.
///
/// The interval is overridable via `REMINDER_INTERVAL_SECS` (mainly so a
/// deployment can tighten it for verification).
pub async fn run(pool: PgPool, mailer: Arc<Mailer>, cancel: CancellationToken) {
    let interval_secs: u64 = std::env::var("REMINDER_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_INTERVAL_SECS);

    tracing::info!(interval_secs, "Audit reminder job started");

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Audit reminder job stopping");
                break;
            }
            _ = interval.tick() => {
                if let Err(e) = run_once(&pool, &mailer).await {
                    tracing::error!(error = %e, "Audit reminder sweep failed");
                }
            }
        }
    }
}

/// One sweep over both windows. Covers `[now - 24h, now + 24h)` in a
/// single range query.
async fn run_once(pool: &PgPool, mailer: &Mailer) -> Result<(), sqlx::Error> {
    let now = Utc::now();
    let audits = AuditRepo::list_scheduled_between(pool, now - WINDOW, now + WINDOW).await?;

    if audits.is_empty() {
        tracing::debug!("Audit reminder sweep: nothing scheduled in window");
        return Ok(());
    }
    tracing::info!(count = audits.len(), "Audit reminder sweep: sending reminders");

    for audit in audits {
        let Some(scheduled_date) = audit.scheduled_date else {
            continue;
        };
        let project = match ProjectRepo::find_by_id(pool, audit.project_id).await? {
            Some(p) => p,
            None => {
                tracing::warn!(audit_id = audit.id, "Reminder skipped: project row missing");
                continue;
            }
        };
        let auditor = UserRepo::find_by_id(pool, audit.assigned_auditor).await?;

        notifications::send_audit_reminder(
            mailer,
            auditor.as_ref().map(|u| u.email.as_str()),
            &project,
            scheduled_date,
        )
        .await;
    }

    Ok(())
}
