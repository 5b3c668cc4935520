use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use sigcraft_core::error::CoreError;
use sigcraft_pipeline::ExportError;

use crate::store::StoreError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`ExportError`] for pipeline
/// failures. Implements [`IntoResponse`] to produce consistent JSON error
/// responses; export failures also report the pipeline stage.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

fn internal(message: impl std::fmt::Display) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %message, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

fn classify_core(core: &CoreError) -> (StatusCode, &'static str, String) {
    match core {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::MissingRequiredField { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "MISSING_REQUIRED_FIELD",
            core.to_string(),
        ),
        CoreError::InvalidTemplate(_) => {
            (StatusCode::BAD_REQUEST, "INVALID_TEMPLATE", core.to_string())
        }
        CoreError::Internal(msg) => internal(msg),
    }
}

fn classify_export(err: &ExportError) -> (StatusCode, &'static str, String) {
    match err {
        ExportError::Core(core) => classify_core(core),
        ExportError::RenderingSurface(_) => {
            tracing::warn!(error = %err, "Rendering surface unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "RENDERING_SURFACE_UNAVAILABLE",
                "No rendering surface is available, try again shortly".to_string(),
            )
        }
        ExportError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "EXPORT_TIMEOUT", err.to_string()),
        ExportError::AssetFetch { .. } => {
            tracing::warn!(error = %err, "Asset fetch failed during export");
            (StatusCode::BAD_GATEWAY, "ASSET_FETCH_FAILED", err.to_string())
        }
        ExportError::TableExtraction { .. } => {
            tracing::error!(error = %err, "Table extraction failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "TABLE_EXTRACTION_FAILED",
                err.to_string(),
            )
        }
        ExportError::Encoding { .. }
        | ExportError::Storage(_)
        | ExportError::Markup(_)
        | ExportError::Inline(_)
        | ExportError::Html(_) => {
            tracing::error!(error = %err, stage = err.stage(), "Export failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "EXPORT_FAILED", err.to_string())
        }
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        other => internal(other),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core(core),
            AppError::Export(err) => classify_export(err),
            AppError::Store(StoreError::Database(err)) => classify_sqlx_error(err),
        };

        let body = match &self {
            AppError::Export(err) => json!({
                "error": message,
                "code": code,
                "stage": err.stage(),
            }),
            _ => json!({
                "error": message,
                "code": code,
            }),
        };

        (status, axum::Json(body)).into_response()
    }
}
