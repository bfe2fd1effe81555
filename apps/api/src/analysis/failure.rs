use thiserror::Error;

/// Terminal outcome of a failed extraction. The pipeline never retries these.
///
/// `Display` never includes the raw model text; it is kept in the variant for
/// diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionFailure {
    #[error("No access credential is configured for the completion service")]
    MissingCredential,

    #[error("The document payload carries neither bytes nor text")]
    EmptyPayload,

    #[error("Completion call failed: {detail}")]
    TransportError { detail: String },

    #[error("Model response could not be decoded as an analysis ({} bytes)", raw_text.len())]
    UnparsableResponse { raw_text: String },
}

impl ExtractionFailure {
    /// Short message for end users. Each kind implies a different corrective action.
    pub fn user_message(&self) -> &'static str {
        match self {
            ExtractionFailure::MissingCredential => {
                "The analysis service is not configured. Ask an administrator to set the API key."
            }
            ExtractionFailure::EmptyPayload => {
                "The uploaded CV appears to be empty. Please upload a file with content."
            }
            ExtractionFailure::TransportError { .. } => {
                "The analysis service could not be reached. Check your connection and try again."
            }
            ExtractionFailure::UnparsableResponse { .. } => {
                "The analysis service returned an unreadable result. Please run the analysis again."
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ExtractionFailure::MissingCredential => "MISSING_CREDENTIAL",
            ExtractionFailure::EmptyPayload => "EMPTY_PAYLOAD",
            ExtractionFailure::TransportError { .. } => "TRANSPORT_ERROR",
            ExtractionFailure::UnparsableResponse { .. } => "UNPARSABLE_RESPONSE",
        }
    }
}
