pub mod health;
pub mod signature;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /signatures                          list, create
/// /signatures/{id}                     get, update, delete
/// /signatures/{id}/preview             raw layout HTML (GET)
/// /signatures/{id}/export              client-tuned export (POST)
/// /signatures/{id}/export-inline       static single-table export (POST)
/// /signatures/{id}/export-mjml         MJML export (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/signatures", signature::router())
}
