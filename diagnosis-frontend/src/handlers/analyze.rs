use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use service_core::error::AppError;

use crate::handlers::app::IndexTemplate;
use crate::models::{Language, Upload};
use crate::services::run_analysis;
use crate::AppState;

/// Form field holding the dropdown value.
pub const LANGUAGE_FIELD: &str = "language";
/// Form field holding the uploaded file.
pub const IMAGE_FIELD: &str = "image";

/// Fields of the analyze form.
#[derive(Debug)]
pub struct AnalyzeForm {
    pub language: Language,
    pub upload: Option<Upload>,
}

impl AnalyzeForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut language = Language::default();
        let mut upload = None;

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                LANGUAGE_FIELD => {
                    let value = field.text().await.map_err(multipart_error)?;
                    language = value
                        .parse()
                        .map_err(|e| AppError::BadRequest(anyhow::Error::new(e)))?;
                }
                IMAGE_FIELD => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    upload = Some(Upload {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
                other => {
                    tracing::debug!(field = %other, "Ignoring unexpected form field");
                }
            }
        }

        Ok(Self { language, upload })
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(anyhow::anyhow!(err.body_text()))
    }
}

pub async fn analyze_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<IndexTemplate, AppError> {
    let form = AnalyzeForm::from_multipart(multipart).await?;

    let ui_state = run_analysis(
        state.agent.as_ref(),
        form.language,
        form.upload,
        state.max_width,
    )
    .await;

    Ok(IndexTemplate::for_state(form.language, &ui_state))
}
