//! Handlers for the `/signatures` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use sigcraft_core::error::CoreError;
use sigcraft_core::signature::{NewSignature, Signature, SignaturePatch};
use sigcraft_core::types::{DbId, SignatureId};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub owner_id: Option<DbId>,
}

fn not_found(id: SignatureId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Signature",
        id: id.to_string(),
    })
}

/// Load a signature or fail with 404.
pub(crate) async fn load(state: &AppState, id: SignatureId) -> AppResult<Signature> {
    state.store.get(id).await?.ok_or_else(|| not_found(id))
}

/// POST /api/v1/signatures
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<NewSignature>,
) -> AppResult<(StatusCode, Json<Signature>)> {
    input.check()?;
    let signature = Signature::new(uuid::Uuid::now_v7(), input, Utc::now());
    let signature = state.store.create(signature).await?;
    tracing::info!(
        signature_id = %signature.id,
        template = %signature.template_id,
        tag = signature.tag.name(),
        "Signature created",
    );
    Ok((StatusCode::CREATED, Json(signature)))
}

/// GET /api/v1/signatures?owner_id=
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<DataResponse<Vec<Signature>>>> {
    let signatures = state.store.list(params.owner_id).await?;
    Ok(Json(DataResponse { data: signatures }))
}

/// GET /api/v1/signatures/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<SignatureId>,
) -> AppResult<Json<Signature>> {
    Ok(Json(load(&state, id).await?))
}

/// PUT /api/v1/signatures/{id}
///
/// Each section present in the body replaces the stored one.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<SignatureId>,
    Json(patch): Json<SignaturePatch>,
) -> AppResult<Json<Signature>> {
    patch.check()?;
    let mut signature = load(&state, id).await?;
    signature.apply(patch, Utc::now());
    let signature = state
        .store
        .update(signature)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(signature))
}

/// DELETE /api/v1/signatures/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<SignatureId>,
) -> AppResult<StatusCode> {
    if state.store.delete(id).await? {
        tracing::info!(signature_id = %id, "Signature deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}
