pub mod audit;
pub mod auth;
pub mod health;
pub mod project;
pub mod user;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                        login (public)
/// /auth/me                           current user profile
///
/// /users                             list, create (admin only)
/// /users/{id}                        get, update, delete
///
/// /projects                          list, create
/// /projects/bulk-import              spreadsheet import (admin only)
/// /projects/{id}                     get, update, delete
///
/// /audits                            list, create
/// /audits/request                    request with stakeholder resolution
/// /audits/edit-requests              pending edit requests (admin only)
/// /audits/{id}                       get, update, delete
/// /audits/{id}/steps/{index}         patch one step
/// /audits/{id}/complete              mark completed
/// /audits/{id}/request-edit          ask for edit access
/// /audits/{id}/approve-edit          grant edit access, reopen
/// /audits/{id}/reopen                reopen without edit access
/// /audits/{id}/schedule              schedule audit meeting
/// /audits/{id}/resend-notification   resend request email
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Authentication (login + profile).
        .nest("/auth", auth::router())
        // Admin user management.
        .nest("/users", user::router())
        // Project catalogue and bulk import.
        .nest("/projects", project::router())
        // Audit lifecycle.
        .nest("/audits", audit::router())
}
