//! Label preview, printing and status handlers.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use super::super::state::AppState;
use super::{ApiError, PrintResponse, error_response, task_error};
use crate::barcode::BarcodeValue;
use crate::cache::CacheStats;
use crate::error::EtiquetaError;
use crate::printer::PrinterHandle;
use crate::render::encode_png;

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub value: String,
    /// Return the downscaled preview instead of the full label
    #[serde(default)]
    pub thumbnail: bool,
    /// Input field the request was typed into; a newer request for the same
    /// field supersedes this one
    #[serde(default)]
    pub field: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PrintRequest {
    pub value: String,
    #[serde(default = "default_copies")]
    pub copies: u32,
    #[serde(default)]
    pub printer: Option<String>,
}

fn default_copies() -> u32 {
    1
}

/// GET /api/printers - Configured printers.
pub async fn printers(State(state): State<Arc<AppState>>) -> Json<Value> {
    let printers: Vec<PrinterHandle> = state.pipeline.printers();
    Json(json!({ "printers": printers }))
}

/// POST /api/preview - Render a label as PNG.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PreviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Issued in arrival order, before any blocking work is queued
    let ticket = req.field.as_deref().map(|field| state.pipeline.begin_preview(field));

    let png_bytes = tokio::task::spawn_blocking(move || -> Result<Option<Vec<u8>>, EtiquetaError> {
        let pipeline = &state.pipeline;
        let label = match &ticket {
            Some(ticket) => match pipeline.preview_for(ticket, &req.value)? {
                Some(label) => label,
                // A newer request for the same field made this one moot
                None => return Ok(None),
            },
            None => pipeline.preview(&req.value)?,
        };
        let png = if req.thumbnail {
            encode_png(&pipeline.thumbnail(&label))?
        } else {
            label.to_png()?
        };
        Ok(Some(png))
    })
    .await
    .map_err(task_error)?
    .map_err(error_response)?;

    match png_bytes {
        Some(png) => Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// POST /api/print - Print a label and record it in history.
pub async fn print(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PrintRequest>,
) -> Result<Json<PrintResponse>, ApiError> {
    let value = BarcodeValue::new(req.value).map_err(error_response)?;

    let outcome = tokio::task::spawn_blocking(move || {
        state
            .pipeline
            .print(&value, req.copies, req.printer.as_deref())
    })
    .await
    .map_err(task_error)?
    .map_err(error_response)?;

    Ok(Json(outcome.into()))
}

/// GET /api/cache - Cache counters.
pub async fn cache(State(state): State<Arc<AppState>>) -> Json<CacheStats> {
    Json(state.pipeline.cache_stats())
}
