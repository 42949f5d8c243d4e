//! Route definitions for the `/projects` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::project;
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /             -> list (Admin: all, Auditor: own via audits)
/// POST   /             -> create (Admin)
/// POST   /bulk-import  -> spreadsheet bulk import (Admin)
/// GET    /{id}         -> get by id
/// PUT    /{id}         -> update (Admin)
/// DELETE /{id}         -> delete (Admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(project::list).post(project::create))
        .route("/bulk-import", post(project::bulk_import))
        .route(
            "/{id}",
            get(project::get_by_id)
                .put(project::update)
                .delete(project::delete),
        )
}
