//! User roles.
//!
//! Roles are a closed set; authorization decisions are made against the
//! tagged enum rather than ad-hoc string comparisons scattered per route.

use serde::{Deserialize, Serialize};

/// The three platform roles.
///
/// Maps onto the `user_role` PostgreSQL enum. The JWT `role` claim and all
/// JSON payloads carry the same labels (`Admin`, `Auditor`, `SPOC`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role")]
pub enum Role {
    /// Full access: manages projects, users, and the audit roster; may
    /// always edit audits and gates post-completion edit access.
    Admin,
    /// Performs audits assigned to them; sees only their own audits.
    Auditor,
    /// Project stakeholder. Notified of audit events but has no list
    /// access of their own.
    #[serde(rename = "SPOC")]
    #[sqlx(rename = "SPOC")]
    Spoc,
}

impl Role {
    /// Stable label used in logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Auditor => "Auditor",
            Role::Spoc => "SPOC",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_labels_are_stable() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"Admin\"");
        assert_eq!(serde_json::to_string(&Role::Spoc).unwrap(), "\"SPOC\"");
        let parsed: Role = serde_json::from_str("\"Auditor\"").unwrap();
        assert_eq!(parsed, Role::Auditor);
    }
}
