//! Notification triggers for audit lifecycle transitions.
//!
//! All sends are best-effort: the state transition is persisted first and
//! a delivery failure is logged, never surfaced as a request failure.
//! Recipient sets mirror the transition table: the assigned auditor on
//! request/create (and resend), the project's UI SPOCs plus delivery
//! manager on schedule, and the wider auditor+manager+SPOC set on
//! reminders.

pub mod email;

use audittrack_core::audit::Quarter;
use audittrack_core::stakeholders::{collect_project_emails, looks_like_email};
use audittrack_core::types::Timestamp;
use audittrack_db::models::project::Project;

pub use email::{EmailConfig, Mailer};

/// Notify the assigned auditor that an audit was requested for them.
/// Also used verbatim by resend-notification.
pub async fn send_audit_requested(
    mailer: &Mailer,
    auditor_email: &str,
    project: &Project,
    quarter: Quarter,
) {
    let subject = format!("Audit Requested for Project: {}", project.name);
    let body = format!(
        "You have been requested to perform an audit for project {} (Quarter: {quarter:?}). \
         Please log in to schedule the audit.",
        project.name
    );
    deliver(mailer, &[auditor_email.to_string()], &subject, &body).await;
}

/// Notify the project's UI SPOCs and delivery manager that the audit
/// meeting has been scheduled.
pub async fn send_audit_scheduled(mailer: &Mailer, project: &Project, scheduled_date: Timestamp) {
    let recipients =
        collect_project_emails(&project.ui_spocs, project.delivery_manager.as_deref());
    let subject = format!("Audit Meeting Scheduled for Project: {}", project.name);
    let body = format!(
        "An audit meeting has been scheduled for project {} on {scheduled_date}. \
         Please be available.",
        project.name
    );
    deliver(mailer, &recipients, &subject, &body).await;
}

/// Daily reminder for an audit scheduled within the last or next 24 hours.
pub async fn send_audit_reminder(
    mailer: &Mailer,
    auditor_email: Option<&str>,
    project: &Project,
    scheduled_date: Timestamp,
) {
    let mut recipients: Vec<String> = Vec::new();
    if let Some(email) = auditor_email {
        recipients.push(email.to_string());
    }
    if let Some(pm) = &project.project_manager {
        if looks_like_email(pm) {
            recipients.push(pm.clone());
        }
    }
    recipients.extend(
        project
            .ui_spocs
            .iter()
            .filter(|s| looks_like_email(s))
            .cloned(),
    );

    let subject = format!("Audit Reminder: {}", project.name);
    let body = format!(
        "This is a reminder for the audit of project {} scheduled on {scheduled_date}.",
        project.name
    );
    deliver(mailer, &recipients, &subject, &body).await;
}

/// Send and swallow: a failed notification must not fail the request that
/// already persisted its state transition.
async fn deliver(mailer: &Mailer, to: &[String], subject: &str, body: &str) {
    if let Err(e) = mailer.send(to, subject, body).await {
        tracing::warn!(error = %e, subject, "Notification delivery failed");
    }
}
