//! Route definitions for the `/signatures` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{export, signature};
use crate::state::AppState;

/// Routes mounted at `/signatures`.
///
/// ```text
/// GET    /                      -> list (?owner_id=)
/// POST   /                      -> create
/// GET    /{id}                  -> get_by_id
/// PUT    /{id}                  -> update
/// DELETE /{id}                  -> delete
///
/// GET    /{id}/preview          -> preview
/// POST   /{id}/export           -> export
/// POST   /{id}/export-inline    -> export_inline
/// POST   /{id}/export-mjml      -> export_mjml
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(signature::list).post(signature::create))
        .route(
            "/{id}",
            get(signature::get_by_id)
                .put(signature::update)
                .delete(signature::delete),
        )
        .route("/{id}/preview", get(export::preview))
        .route("/{id}/export", post(export::export))
        .route("/{id}/export-inline", post(export::export_inline))
        .route("/{id}/export-mjml", post(export::export_mjml))
}
