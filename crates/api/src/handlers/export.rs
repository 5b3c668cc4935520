//! Preview and export handlers for `/signatures/{id}/...`.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::response::Html;
use axum::Json;
use serde::{Deserialize, Serialize};
use sigcraft_core::types::SignatureId;
use sigcraft_pipeline::table::ValidationReport;
use sigcraft_pipeline::{EmailClient, ExportStrategy};

use crate::error::AppResult;
use crate::handlers::signature::load;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    #[serde(default)]
    pub email_client: EmailClient,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    pub html: String,
    /// Raster key (`headshot`, `socialIcons.linkedin`, ...) to GIF URL.
    pub gif_urls: BTreeMap<String, String>,
    pub success: bool,
    pub validation: ValidationReport,
    pub strategy: ExportStrategy,
    pub email_client: EmailClient,
}

#[derive(Debug, Serialize)]
pub struct InlineExportResponse {
    pub html: String,
    pub validation: ValidationReport,
    pub success: bool,
    pub format: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MarkupExportResponse {
    pub html: String,
    pub mjml: String,
    pub validation: ValidationReport,
    pub success: bool,
    pub format: &'static str,
}

/// GET /api/v1/signatures/{id}/preview
pub async fn preview(
    State(state): State<AppState>,
    Path(id): Path<SignatureId>,
) -> AppResult<Html<String>> {
    let signature = load(&state, id).await?;
    Ok(Html(state.exporter.preview(&signature)))
}

/// POST /api/v1/signatures/{id}/export
pub async fn export(
    State(state): State<AppState>,
    Path(id): Path<SignatureId>,
    Json(request): Json<ExportRequest>,
) -> AppResult<Json<ExportResponse>> {
    let signature = load(&state, id).await?;
    let output = state.exporter.export(&signature, request.email_client).await?;
    Ok(Json(ExportResponse {
        html: output.html,
        gif_urls: output.raster_urls,
        success: true,
        validation: output.validation,
        strategy: output.strategy,
        email_client: request.email_client,
    }))
}

/// POST /api/v1/signatures/{id}/export-inline
pub async fn export_inline(
    State(state): State<AppState>,
    Path(id): Path<SignatureId>,
) -> AppResult<Json<InlineExportResponse>> {
    let signature = load(&state, id).await?;
    let output = state.exporter.export_inline(&signature)?;
    Ok(Json(InlineExportResponse {
        html: output.html,
        validation: output.validation,
        success: true,
        format: "inline-table",
    }))
}

/// POST /api/v1/signatures/{id}/export-mjml
pub async fn export_mjml(
    State(state): State<AppState>,
    Path(id): Path<SignatureId>,
) -> AppResult<Json<MarkupExportResponse>> {
    let signature = load(&state, id).await?;
    let output = state.exporter.export_markup(&signature)?;
    Ok(Json(MarkupExportResponse {
        html: output.html,
        mjml: output.mjml,
        validation: output.validation,
        success: true,
        format: "mjml",
    }))
}
