//! # HTTP Server for Label Printing
//!
//! JSON API over a shared [`LabelPipeline`].
//!
//! ## Usage
//!
//! ```bash
//! etiqueta serve --listen 0.0.0.0:8080
//! ```
//!
//! ## Routes
//!
//! | Method | Path | Body | Response |
//! |--------|------|------|----------|
//! | GET | `/api/printers` | | configured printers |
//! | POST | `/api/preview` | `{value, thumbnail?, field?}` | `image/png` or 204 |
//! | POST | `/api/print` | `{value, copies?, printer?}` | print outcome |
//! | GET | `/api/history` | | records, newest first |
//! | GET | `/api/history/summary` | | per-value totals |
//! | POST | `/api/history/:id/reprint` | `{printer?}` | print outcome |
//! | GET | `/api/cache` | | cache counters |
//!
//! Invalid values and copy counts answer 400; unknown history ids and
//! printers answer 404.

mod handlers;
mod state;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::error::EtiquetaError;
use crate::pipeline::LabelPipeline;
use state::AppState;

/// Build the router around `pipeline`.
pub fn router(pipeline: LabelPipeline) -> Router {
    let app_state = Arc::new(AppState::new(pipeline));

    Router::new()
        .route("/api/printers", get(handlers::labels::printers))
        .route("/api/preview", post(handlers::labels::preview))
        .route("/api/print", post(handlers::labels::print))
        .route("/api/cache", get(handlers::labels::cache))
        .route("/api/history", get(handlers::history::list))
        .route("/api/history/summary", get(handlers::history::summary))
        .route(
            "/api/history/:id/reprint",
            post(handlers::history::reprint),
        )
        .with_state(app_state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use etiqueta::config::AppConfig;
/// use etiqueta::pipeline::LabelPipeline;
/// use etiqueta::server::serve;
///
/// # async fn example() -> Result<(), etiqueta::EtiquetaError> {
/// let config = AppConfig::default();
/// let pipeline = LabelPipeline::open(&config)?;
/// serve(pipeline, &config.listen_addr).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(pipeline: LabelPipeline, listen_addr: &str) -> Result<(), EtiquetaError> {
    let app = router(pipeline);

    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .map_err(|e| {
            EtiquetaError::Config(format!("Failed to bind to {}: {}", listen_addr, e))
        })?;

    log::info!("listening on http://{}/", listen_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
