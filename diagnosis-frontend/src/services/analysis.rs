use crate::error::AnalysisError;
use crate::models::{Language, UiState, Upload};
use crate::services::agents::DiagnosticAgent;
use crate::services::ingestion::normalize_upload_blocking;
use crate::services::metrics::record_analysis;
use crate::services::prompt::assemble_prompt;
use crate::services::renderer::render_report;
use std::time::Instant;

/// Handle one Analyze click: validate, then step the state machine until it
/// lands on `Done` or `Errored`. Every failure is returned as state, never
/// raised.
pub async fn run_analysis(
    agent: &dyn DiagnosticAgent,
    language: Language,
    upload: Option<Upload>,
    max_width: u32,
) -> UiState {
    let started = Instant::now();
    let mut state = UiState::submit(agent.is_configured(), language, upload);

    let state = loop {
        state = match state {
            UiState::Ready { language, upload } => {
                tracing::info!(
                    agent = agent.name(),
                    language = %language,
                    file_name = %upload.file_name,
                    bytes = upload.bytes.len(),
                    "Analyzing image"
                );
                UiState::Analyzing { language, upload }
            }
            UiState::Analyzing { language, upload } => {
                match analyze(agent, language, upload, max_width).await {
                    Ok(report_html) => UiState::Done { report_html },
                    Err(error) => UiState::Errored { error },
                }
            }
            // `submit` never yields Idle; Done and Errored end the loop.
            settled => break settled,
        };
    };

    match &state {
        UiState::Errored { error } => {
            tracing::warn!(outcome = error.outcome(), error = %error, "Analysis did not complete");
            record_analysis(error.outcome(), started.elapsed());
        }
        _ => {
            tracing::info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Analysis complete"
            );
            record_analysis("success", started.elapsed());
        }
    }

    state
}

async fn analyze(
    agent: &dyn DiagnosticAgent,
    language: Language,
    upload: Upload,
    max_width: u32,
) -> Result<String, AnalysisError> {
    // Temp file lives until the end of this function.
    let image = normalize_upload_blocking(upload.bytes, max_width).await?;
    let prompt = assemble_prompt(language);
    let markdown = agent.analyze(&prompt, image.path()).await?;
    Ok(render_report(&markdown))
}
