use crate::services::agents::AgentError;
use crate::services::ingestion::IngestionError;
use thiserror::Error;

/// Failures the page reports inline. Display text is what the user reads.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Google API key not found. Please check your .env file.")]
    MissingCredential,

    #[error("Please upload a medical image.")]
    MissingImage,

    #[error("Could not read the uploaded image: {0}")]
    ImageDecode(#[from] IngestionError),

    #[error("Analysis failed: {0}")]
    Agent(#[from] AgentError),
}

impl AnalysisError {
    pub fn user_message(&self) -> String {
        format!("❌ {}", self)
    }

    /// Label for the analyses metric.
    pub fn outcome(&self) -> &'static str {
        match self {
            AnalysisError::MissingCredential => "missing_credential",
            AnalysisError::MissingImage => "missing_image",
            AnalysisError::ImageDecode(_) => "image_error",
            AnalysisError::Agent(_) => "agent_error",
        }
    }
}
