use std::sync::Arc;

use crate::analysis::pipeline::ExtractionPipeline;
use crate::normalizer::Normalizer;

/// Shared application state injected into all route handlers via Axum extractors.
/// Both members are read-only; nothing here is mutated per request.
#[derive(Clone)]
pub struct AppState {
    pub normalizer: Arc<Normalizer>,
    pub pipeline: Arc<ExtractionPipeline>,
    /// Request body cap for uploads, in bytes.
    pub max_upload_bytes: usize,
}
