//! History and reprint handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::super::state::AppState;
use super::{ApiError, PrintResponse, error_response, task_error};
use crate::history::{BarcodeTally, HistoryRecord, ListOrder};

#[derive(Debug, Default, Deserialize)]
pub struct ReprintRequest {
    #[serde(default)]
    pub printer: Option<String>,
}

/// GET /api/history - Records, newest first.
pub async fn list(State(state): State<Arc<AppState>>) -> Json<Vec<HistoryRecord>> {
    Json(state.pipeline.history(ListOrder::NewestFirst))
}

/// GET /api/history/summary - Per-value totals.
pub async fn summary(State(state): State<Arc<AppState>>) -> Json<Vec<BarcodeTally>> {
    Json(state.pipeline.summary())
}

/// POST /api/history/:id/reprint - Print a history entry again.
pub async fn reprint(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    body: Option<Json<ReprintRequest>>,
) -> Result<Json<PrintResponse>, ApiError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();

    let outcome = tokio::task::spawn_blocking(move || {
        state.pipeline.reprint(id, req.printer.as_deref())
    })
    .await
    .map_err(task_error)?
    .map_err(error_response)?;

    Ok(Json(outcome.into()))
}
