//! Axum route handlers for the Analysis API.

use axum::{
    extract::{multipart::Field, Multipart, State},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::analysis::models::AnalysisResult;
use crate::analysis::request::RequestContext;
use crate::errors::AppError;
use crate::normalizer::UploadedFile;
use crate::state::AppState;

const DEFAULT_MIME: &str = "application/octet-stream";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub file_name: String,
    pub analysis: AnalysisResult,
}

/// POST /api/v1/analyses
///
/// Multipart fields: `file` (required), `target_job` (required),
/// `candidate_name`, `context`. Normalizes the upload, then runs the extraction pipeline.
pub async fn handle_analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let mut file: Option<UploadedFile> = None;
    let mut target_job = String::new();
    let mut candidate_name = String::new();
    let mut notes = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "file" => {
                let name = field.file_name().unwrap_or("upload").to_string();
                let mime_type = field.content_type().unwrap_or(DEFAULT_MIME).to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read uploaded file: {e}")))?;
                file = Some(UploadedFile::from_bytes(name, mime_type, data));
            }
            "target_job" => target_job = read_text(&field_name, field).await?,
            "candidate_name" => candidate_name = read_text(&field_name, field).await?,
            "context" => notes = read_text(&field_name, field).await?,
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::Validation("file is required".to_string()))?;
    let ctx = RequestContext::new(target_job)
        .map_err(|e| AppError::Validation(e.to_string()))?
        .with_candidate_name(candidate_name)
        .with_notes(notes);

    let document = state.normalizer.normalize(file).await?;
    info!(file_name = %document.file_name, "Upload normalized");

    let analysis = state.pipeline.extract(&document.payload, &ctx).await?;

    Ok(Json(AnalyzeResponse {
        file_name: document.file_name,
        analysis,
    }))
}

async fn read_text(name: &str, field: Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Could not read field '{name}': {e}")))
}
