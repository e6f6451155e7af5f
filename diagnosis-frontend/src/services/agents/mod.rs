//! Diagnostic agent abstraction.
//!
//! The page only needs "prompt + image file in, markdown out". Gemini is the
//! production backend; the mock stands in for it in tests.

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

pub use gemini::GeminiAgent;
pub use mock::MockAgent;

/// Error type for agent calls.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("The image was rejected by the model service: {0}")]
    UnsupportedInput(String),

    #[error("Rate limited by the model service")]
    RateLimited,

    #[error("The response was blocked by the model's safety filters")]
    ContentFiltered,

    #[error("The model returned no report")]
    EmptyResponse,

    #[error("Model service error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Could not read image file: {0}")]
    Io(String),
}

/// Remote model that turns a prompt and one image into a markdown report.
#[async_trait]
pub trait DiagnosticAgent: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Whether a credential is available. Unconfigured agents must not be
    /// called.
    fn is_configured(&self) -> bool;

    /// Run one analysis. Blocks until the remote service answers; no retry.
    async fn analyze(&self, prompt: &str, image_path: &Path) -> Result<String, AgentError>;
}
