use crate::error::AnalysisError;
use crate::models::Language;

/// File received from the upload control.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Browsers still send the file part when nothing was chosen, with an
    /// empty name and body.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Page lifecycle for one analysis.
///
/// `Idle` -> `Ready` -> `Analyzing` -> `Done` | `Errored`. `Ready` is only
/// reached when a credential is configured and a file was uploaded; the two
/// checks run in that order and neither failure reaches the agent.
#[derive(Debug)]
pub enum UiState {
    Idle,
    Ready { language: Language, upload: Upload },
    Analyzing { language: Language, upload: Upload },
    Done { report_html: String },
    Errored { error: AnalysisError },
}

impl UiState {
    /// Button press: validate what the form carried.
    pub fn submit(credential_present: bool, language: Language, upload: Option<Upload>) -> Self {
        if !credential_present {
            return UiState::Errored {
                error: AnalysisError::MissingCredential,
            };
        }

        match upload.filter(|u| !u.is_empty()) {
            Some(upload) => UiState::Ready { language, upload },
            None => UiState::Errored {
                error: AnalysisError::MissingImage,
            },
        }
    }

    pub fn phase(&self) -> &'static str {
        match self {
            UiState::Idle => "idle",
            UiState::Ready { .. } => "ready",
            UiState::Analyzing { .. } => "analyzing",
            UiState::Done { .. } => "done",
            UiState::Errored { .. } => "errored",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, UiState::Done { .. } | UiState::Errored { .. })
    }

    pub fn report_html(&self) -> Option<&str> {
        match self {
            UiState::Done { report_html } => Some(report_html),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<String> {
        match self {
            UiState::Errored { error } => Some(error.user_message()),
            _ => None,
        }
    }
}
