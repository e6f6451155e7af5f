//! Gemini agent.
//!
//! One `generateContent` call per analysis: the normalized scan goes inline as
//! base64 PNG next to the prompt, and the `google_search` tool is attached when
//! web search is enabled so the model can look things up while it writes.

use super::{AgentError, DiagnosticAgent};
use crate::config::GeminiSettings;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Standing instruction asking for markdown output.
const SYSTEM_INSTRUCTION: &str = "Use markdown to format your answers.";

const IMAGE_MIME_TYPE: &str = "image/png";

/// Gemini-backed diagnostic agent.
pub struct GeminiAgent {
    settings: GeminiSettings,
    client: Client,
}

impl GeminiAgent {
    pub fn new(settings: GeminiSettings) -> Result<Self, AgentError> {
        let mut builder = Client::builder();
        if let Some(secs) = settings.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| AgentError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { settings, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.api_base.trim_end_matches('/'),
            self.settings.model
        )
    }

    fn build_request(&self, prompt: &str, image_base64: String) -> GenerateContentRequest {
        GenerateContentRequest {
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::text(SYSTEM_INSTRUCTION)],
            }),
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::text(prompt),
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: IMAGE_MIME_TYPE.to_string(),
                            data: image_base64,
                        },
                    },
                ],
            }],
            tools: if self.settings.web_search {
                Some(vec![Tool {
                    google_search: GoogleSearch {},
                }])
            } else {
                None
            },
        }
    }
}

#[async_trait]
impl DiagnosticAgent for GeminiAgent {
    fn name(&self) -> &str {
        "gemini"
    }

    fn is_configured(&self) -> bool {
        self.settings.has_credential()
    }

    async fn analyze(&self, prompt: &str, image_path: &Path) -> Result<String, AgentError> {
        let api_key = match &self.settings.api_key {
            Some(key) if self.is_configured() => key,
            _ => {
                return Err(AgentError::Authentication(
                    "Gemini API key not configured".to_string(),
                ))
            }
        };

        let image = tokio::fs::read(image_path)
            .await
            .map_err(|e| AgentError::Io(format!("{}: {}", image_path.display(), e)))?;
        let request = self.build_request(prompt, STANDARD.encode(&image));

        tracing::debug!(
            model = %self.settings.model,
            prompt_len = prompt.len(),
            image_bytes = image.len(),
            web_search = self.settings.web_search,
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &body));
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Api {
                status: status.as_u16(),
                message: format!("Failed to parse response: {}", e),
            })?;

        extract_report(api_response)
    }
}

/// Map a non-success Gemini status and body onto an [`AgentError`].
pub(crate) fn classify_error(status: StatusCode, body: &str) -> AgentError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let message = envelope
        .as_ref()
        .map(|e| e.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.trim().to_string());
    let key_rejected = envelope.as_ref().is_some_and(|e| {
        e.error
            .details
            .iter()
            .any(|d| d.reason.as_deref() == Some("API_KEY_INVALID"))
    });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::Authentication(message),
        StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited,
        StatusCode::BAD_REQUEST if key_rejected => AgentError::Authentication(message),
        StatusCode::BAD_REQUEST => AgentError::UnsupportedInput(message),
        _ => AgentError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_report(response: GenerateContentResponse) -> Result<String, AgentError> {
    if response
        .prompt_feedback
        .as_ref()
        .is_some_and(|f| f.block_reason.is_some())
    {
        return Err(AgentError::ContentFiltered);
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(AgentError::EmptyResponse)?;

    if candidate.finish_reason.as_deref() == Some("SAFETY") {
        return Err(AgentError::ContentFiltered);
    }

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    if text.trim().is_empty() {
        return Err(AgentError::EmptyResponse);
    }
    Ok(text)
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

impl Part {
    fn text(text: &str) -> Self {
        Part::Text {
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

/// Only text parts matter; search grounding parts are skipped.
#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn agent(web_search: bool) -> GeminiAgent {
        let mut settings = GeminiSettings::new(Some(Secret::new("key".to_string())));
        settings.web_search = web_search;
        GeminiAgent::new(settings).unwrap()
    }

    #[test]
    fn request_carries_prompt_image_and_search_tool() {
        let request = agent(true).build_request("describe", "AAAA".to_string());
        let json = serde_json::to_value(&request).unwrap();

        let parts = &json["contents"][0]["parts"];
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(parts[0]["text"], "describe");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[1]["inlineData"]["data"], "AAAA");
        assert!(json["tools"][0]["googleSearch"].is_object());
        assert_eq!(
            json["systemInstruction"]["parts"][0]["text"],
            SYSTEM_INSTRUCTION
        );
    }

    #[test]
    fn search_tool_is_omitted_when_disabled() {
        let request = agent(false).build_request("describe", String::new());
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("tools").is_none());
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let mut settings = GeminiSettings::new(None);
        settings.api_base = "http://localhost:9/v1beta/".to_string();
        let agent = GeminiAgent::new(settings).unwrap();
        assert_eq!(
            agent.endpoint(),
            "http://localhost:9/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn text_parts_are_concatenated() {
        let response: GenerateContentResponse = serde_json::from_str(
            r##"{"candidates":[{"content":{"role":"model","parts":[{"text":"# Report\n"},{"text":"All clear"}]},"finishReason":"STOP"}]}"##,
        )
        .unwrap();
        assert_eq!(extract_report(response).unwrap(), "# Report\nAll clear");
    }

    #[test]
    fn safety_stop_is_content_filtered() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"finishReason":"SAFETY"}]}"#,
        )
        .unwrap();
        assert_eq!(extract_report(response), Err(AgentError::ContentFiltered));
    }

    #[test]
    fn blocked_prompt_is_content_filtered() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"OTHER"}}"#).unwrap();
        assert_eq!(extract_report(response), Err(AgentError::ContentFiltered));
    }

    #[test]
    fn no_candidates_is_empty() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(extract_report(response), Err(AgentError::EmptyResponse));
    }

    #[test]
    fn invalid_key_on_400_is_authentication() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT","details":[{"@type":"type.googleapis.com/google.rpc.ErrorInfo","reason":"API_KEY_INVALID"}]}}"#;
        assert_eq!(
            classify_error(StatusCode::BAD_REQUEST, body),
            AgentError::Authentication("API key not valid. Please pass a valid API key.".into())
        );
    }

    #[test]
    fn other_400_is_unsupported_input() {
        let body = r#"{"error":{"code":400,"message":"Unable to process input image.","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(
            classify_error(StatusCode::BAD_REQUEST, body),
            AgentError::UnsupportedInput("Unable to process input image.".into())
        );
    }

    #[test]
    fn status_codes_map_to_kinds() {
        assert!(matches!(
            classify_error(StatusCode::FORBIDDEN, ""),
            AgentError::Authentication(_)
        ));
        assert_eq!(
            classify_error(StatusCode::TOO_MANY_REQUESTS, ""),
            AgentError::RateLimited
        );
        assert_eq!(
            classify_error(StatusCode::BAD_GATEWAY, "upstream down"),
            AgentError::Api {
                status: 502,
                message: "upstream down".into()
            }
        );
    }

    #[tokio::test]
    async fn unconfigured_agent_refuses_before_reading_image() {
        let agent = GeminiAgent::new(GeminiSettings::new(None)).unwrap();
        assert!(!agent.is_configured());
        let err = agent
            .analyze("prompt", Path::new("/nonexistent/scan.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Authentication(_)));
    }
}
