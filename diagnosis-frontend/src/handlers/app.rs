use askama::Template;
use axum::response::IntoResponse;

use crate::models::{Language, UiState};
use crate::services::ingestion::ACCEPT_FILTER;

pub struct LanguageOption {
    pub name: &'static str,
    pub selected: bool,
}

/// The single page. Rendered empty on `GET /` and with a report or error
/// after `POST /analyze`.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub languages: Vec<LanguageOption>,
    pub accept: &'static str,
    pub phase: &'static str,
    /// Trusted HTML, inserted unescaped.
    pub report_html: Option<String>,
    pub error_message: Option<String>,
}

impl IndexTemplate {
    pub fn for_state(selected: Language, state: &UiState) -> Self {
        Self {
            languages: Language::ALL
                .into_iter()
                .map(|lang| LanguageOption {
                    name: lang.name(),
                    selected: lang == selected,
                })
                .collect(),
            accept: ACCEPT_FILTER,
            phase: state.phase(),
            report_html: state.report_html().map(str::to_owned),
            error_message: state.error_message(),
        }
    }
}

pub async fn index() -> impl IntoResponse {
    IndexTemplate::for_state(Language::default(), &UiState::Idle)
}

pub async fn health_check() -> &'static str {
    "OK"
}
