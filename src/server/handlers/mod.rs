//! HTTP handlers for the server.

pub mod history;
pub mod labels;

use axum::{Json, http::StatusCode};
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::EtiquetaError;
use crate::history::HistoryRecord;
use crate::pipeline::PrintOutcome;

pub type ApiError = (StatusCode, Json<Value>);

/// Map a pipeline error onto an HTTP status and JSON body.
pub fn error_response(e: EtiquetaError) -> ApiError {
    let status = match &e {
        EtiquetaError::EmptyValue
        | EtiquetaError::InvalidCharacter { .. }
        | EtiquetaError::RenderSize { .. }
        | EtiquetaError::InvalidCopyCount(_) => StatusCode::BAD_REQUEST,
        EtiquetaError::NotFound(_) | EtiquetaError::UnknownPrinter(_) => StatusCode::NOT_FOUND,
        EtiquetaError::Printer(_)
        | EtiquetaError::Config(_)
        | EtiquetaError::Image(_)
        | EtiquetaError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({"success": false, "error": e.to_string()})))
}

pub fn task_error(e: tokio::task::JoinError) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"success": false, "error": format!("Task error: {}", e)})),
    )
}

/// JSON body for print and reprint.
#[derive(Debug, Serialize)]
pub struct PrintResponse {
    pub success: bool,
    pub printer: String,
    pub pages_completed: u32,
    pub total_requested: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<HistoryRecord>,
}

impl From<PrintOutcome> for PrintResponse {
    fn from(outcome: PrintOutcome) -> Self {
        Self {
            success: outcome.result.is_complete(),
            printer: outcome.printer,
            pages_completed: outcome.result.pages_completed,
            total_requested: outcome.result.total_requested,
            error: outcome.result.error.map(|e| e.to_string()),
            record: outcome.record,
        }
    }
}
