//! Server state shared across handlers.

use crate::pipeline::LabelPipeline;

/// Application state shared across handlers.
pub struct AppState {
    pub pipeline: LabelPipeline,
}

impl AppState {
    pub fn new(pipeline: LabelPipeline) -> Self {
        Self { pipeline }
    }
}
