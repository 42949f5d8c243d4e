//! Stakeholder email collection.
//!
//! Project rosters store UI SPOCs and managers as free-form strings; only
//! entries that look like email addresses (`contains('@')`) are usable as
//! notification targets. The stored stakeholder list keeps the SPOC
//! entries as entered, even when they are not addresses and have no
//! matching user account; filtering happens at send time.

/// Loose email check used throughout the notification paths.
pub fn looks_like_email(value: &str) -> bool {
    value.contains('@')
}

/// Collect the notification addresses a project contributes: its UI SPOCs
/// plus the delivery manager, keeping only email-shaped entries.
pub fn collect_project_emails(ui_spocs: &[String], delivery_manager: Option<&str>) -> Vec<String> {
    let mut emails: Vec<String> = ui_spocs
        .iter()
        .filter(|s| looks_like_email(s))
        .cloned()
        .collect();
    if let Some(dm) = delivery_manager {
        if looks_like_email(dm) {
            emails.push(dm.to_string());
        }
    }
    emails
}

/// Collect the stakeholder entries stored on an audit: every UI SPOC
/// string as entered, plus the delivery manager when email-shaped.
pub fn collect_stakeholder_entries(
    ui_spocs: &[String],
    delivery_manager: Option<&str>,
) -> Vec<String> {
    let mut entries = ui_spocs.to_vec();
    if let Some(dm) = delivery_manager {
        if looks_like_email(dm) {
            entries.push(dm.to_string());
        }
    }
    entries
}
