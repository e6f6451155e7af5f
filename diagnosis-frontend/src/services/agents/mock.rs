//! Mock agent for testing.

use super::{AgentError, DiagnosticAgent};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// What the last call received.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub prompt: String,
    pub image_path: PathBuf,
    /// Whether the image file existed while the call was running.
    pub image_existed: bool,
}

/// Returns a fixed reply and records its calls.
pub struct MockAgent {
    configured: bool,
    reply: Result<String, AgentError>,
    calls: AtomicUsize,
    last_call: Mutex<Option<RecordedCall>>,
}

impl MockAgent {
    pub fn replying(markdown: impl Into<String>) -> Self {
        Self::new(true, Ok(markdown.into()))
    }

    pub fn failing(error: AgentError) -> Self {
        Self::new(true, Err(error))
    }

    /// Behaves like an agent with no credential.
    pub fn unconfigured() -> Self {
        Self::new(
            false,
            Err(AgentError::Authentication(
                "Mock agent not configured".to_string(),
            )),
        )
    }

    fn new(configured: bool, reply: Result<String, AgentError>) -> Self {
        Self {
            configured,
            reply,
            calls: AtomicUsize::new(0),
            last_call: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.last_call
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl DiagnosticAgent for MockAgent {
    fn name(&self) -> &str {
        "mock"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn analyze(&self, prompt: &str, image_path: &Path) -> Result<String, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let call = RecordedCall {
            prompt: prompt.to_string(),
            image_path: image_path.to_path_buf(),
            image_existed: image_path.exists(),
        };
        *self
            .last_call
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(call);

        self.reply.clone()
    }
}
