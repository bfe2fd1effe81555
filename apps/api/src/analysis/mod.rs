// CV analysis: structured extraction from a normalized résumé.
// All model calls go through llm_client; nothing here talks HTTP to the model directly.

pub mod failure;
pub mod handlers;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod request;
pub mod sanitize;
pub mod schema;

pub use failure::ExtractionFailure;
pub use models::AnalysisResult;
pub use pipeline::{ExtractionPipeline, PipelineSettings};
pub use request::RequestContext;
