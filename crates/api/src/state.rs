use std::sync::Arc;

use crate::config::ServerConfig;
use crate::notifications::Mailer;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: audittrack_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Outbound email delivery (no-op logger when SMTP is unconfigured).
    pub mailer: Arc<Mailer>,
}
