//! Route definitions for the `/audits` resource.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::audit;
use crate::state::AppState;

/// Routes mounted at `/audits`.
///
/// Static segments register before `/{id}` so `edit-requests` is never
/// captured as an id.
///
/// ```text
/// GET    /                          -> list (Admin: all, Auditor: own)
/// POST   /                          -> create (Admin)
/// POST   /request                   -> request with stakeholder resolution (Admin)
/// GET    /edit-requests             -> pending edit requests (Admin)
/// GET    /{id}                      -> get by id (Admin or assigned)
/// PUT    /{id}                      -> broad update (Admin or assigned)
/// DELETE /{id}                      -> delete (Admin)
/// PATCH  /{id}/steps/{index}        -> patch one step
/// PATCH  /{id}/complete             -> mark completed (Admin or assigned)
/// PATCH  /{id}/request-edit         -> ask for edit access (assigned auditor)
/// PATCH  /{id}/approve-edit         -> grant edit access, reopen (Admin)
/// PATCH  /{id}/reopen               -> reopen without edit access (Admin)
/// POST   /{id}/schedule             -> schedule meeting (assigned auditor)
/// POST   /{id}/resend-notification  -> resend request email (Admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(audit::list).post(audit::create))
        .route("/request", post(audit::request))
        .route("/edit-requests", get(audit::list_edit_requests))
        .route(
            "/{id}",
            get(audit::get_by_id)
                .put(audit::update)
                .delete(audit::delete),
        )
        .route("/{id}/steps/{index}", patch(audit::patch_step))
        .route("/{id}/complete", patch(audit::complete))
        .route("/{id}/request-edit", patch(audit::request_edit))
        .route("/{id}/approve-edit", patch(audit::approve_edit))
        .route("/{id}/reopen", patch(audit::reopen))
        .route("/{id}/schedule", post(audit::schedule))
        .route("/{id}/resend-notification", post(audit::resend_notification))
}
