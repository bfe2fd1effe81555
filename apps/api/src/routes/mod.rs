pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/analyses", post(handlers::handle_analyze))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use chrono::NaiveDate;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::analysis::pipeline::{ExtractionPipeline, PipelineSettings};
    use crate::analysis::schema::SchemaVariant;
    use crate::llm_client::test_support::ScriptedCompletion;
    use crate::llm_client::CompletionService;
    use crate::normalizer::Normalizer;

    const BOUNDARY: &str = "dossier-test-boundary";
    const MINIMAL: &str = r#"{"matchScore":0.85,"meritJudgment":"مستحق بجدارة","operationalRisk":15,"salaryBenchmark":{"suggestedSalary":"12k SAR"},"interviewGuide":[{"question":"Why this role?","category":"behavioral"}]}"#;

    fn settings() -> PipelineSettings {
        PipelineSettings {
            model: "primary-model".to_string(),
            fallback_model: None,
            temperature: 0.2,
            max_output_tokens: 1024,
            schema_variant: SchemaVariant::Full,
            current_date: NaiveDate::from_ymd_opt(2026, 2, 6).unwrap(),
            overall_deadline: None,
        }
    }

    fn app(service: Option<Arc<ScriptedCompletion>>) -> Router {
        let completion = service.map(|s| s as Arc<dyn CompletionService>);
        build_router(AppState {
            normalizer: Arc::new(Normalizer::default()),
            pipeline: Arc::new(ExtractionPipeline::new(completion, settings())),
            max_upload_bytes: 1024 * 1024,
        })
    }

    /// Builds a multipart body. Parts with a file name are sent as files.
    fn multipart(parts: &[(&str, Option<(&str, &str)>, &str)]) -> Body {
        let mut body = String::new();
        for (name, file, content) in parts {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match file {
                Some((file_name, mime)) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {mime}\r\n\r\n"
                )),
                None => body.push_str(&format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")),
            }
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        Body::from(body)
    }

    fn analyze_request(body: Body) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/analyses")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(body)
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_configuration() {
        let response = app(None)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["analysis_configured"], false);
    }

    #[tokio::test]
    async fn test_analyze_text_cv() {
        let service = Arc::new(ScriptedCompletion::replying(MINIMAL));
        let body = multipart(&[
            ("file", Some(("cv.txt", "text/plain")), "Logistics coordinator, 6 years."),
            ("target_job", None, "Supply Chain Supervisor"),
            ("candidate_name", None, "Faisal"),
        ]);

        let response = app(Some(service.clone())).oneshot(analyze_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["fileName"], "cv.txt");
        assert_eq!(body["analysis"]["matchScore"], 85);
        assert_eq!(body["analysis"]["interviewGuide"][0]["category"], "behavioral");

        let calls = service.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].instruction.contains("Candidate name: Faisal"));
    }

    #[tokio::test]
    async fn test_missing_target_job_is_rejected_before_analysis() {
        let service = Arc::new(ScriptedCompletion::replying(MINIMAL));
        let body = multipart(&[("file", Some(("cv.txt", "text/plain")), "CV")]);

        let response = app(Some(service.clone())).oneshot(analyze_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "VALIDATION_ERROR");
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_rejected() {
        let body = multipart(&[("target_job", None, "Chef")]);
        let response = app(None).oneshot(analyze_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_credential_maps_to_503() {
        let body = multipart(&[
            ("file", Some(("cv.txt", "text/plain")), "CV"),
            ("target_job", None, "Chef"),
        ]);
        let response = app(None).oneshot(analyze_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(response).await["error"]["code"], "MISSING_CREDENTIAL");
    }

    #[tokio::test]
    async fn test_unparsable_response_does_not_leak_raw_text() {
        let service = Arc::new(ScriptedCompletion::replying("PARTIAL {\"matchScore\": 4"));
        let body = multipart(&[
            ("file", Some(("cv.txt", "text/plain")), "CV"),
            ("target_job", None, "Chef"),
        ]);

        let response = app(Some(service)).oneshot(analyze_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "UNPARSABLE_RESPONSE");
        assert!(!body.to_string().contains("PARTIAL"));
    }

    #[tokio::test]
    async fn test_unreadable_docx_maps_to_422() {
        let service = Arc::new(ScriptedCompletion::replying(MINIMAL));
        let body = multipart(&[
            (
                "file",
                Some((
                    "cv.docx",
                    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                )),
                "not a zip archive",
            ),
            ("target_job", None, "Chef"),
        ]);

        let response = app(Some(service.clone())).oneshot(analyze_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(response).await["error"]["code"], "UNREADABLE_FILE");
        assert!(service.calls().is_empty());
    }
}
