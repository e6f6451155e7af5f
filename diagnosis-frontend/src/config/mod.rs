use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use service_core::config::{load_layered, TelemetrySettings};
use service_core::error::AppError;

/// Environment variable the Gemini credential is conventionally kept in.
pub const CREDENTIAL_ENV_VAR: &str = "GOOGLE_API_KEY";

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub gemini: GeminiSettings,
    #[serde(default)]
    pub ingestion: IngestionSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Directory served under `/static`.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    /// Upper bound on the multipart request body.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_static_dir() -> String {
    "diagnosis-frontend/static".to_string()
}

fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

#[derive(Deserialize, Clone, Debug)]
pub struct GeminiSettings {
    /// Missing or blank means analyses fail with the missing-credential message.
    #[serde(default)]
    pub api_key: Option<Secret<String>>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Lets the model run Google searches while writing the report.
    #[serde(default = "default_web_search")]
    pub web_search: bool,
    /// No client-side timeout unless set.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl GeminiSettings {
    pub fn new(api_key: Option<Secret<String>>) -> Self {
        Self {
            api_key,
            model: default_model(),
            api_base: default_api_base(),
            web_search: default_web_search(),
            request_timeout_secs: None,
        }
    }

    pub fn has_credential(&self) -> bool {
        self.api_key
            .as_ref()
            .is_some_and(|key| !key.expose_secret().trim().is_empty())
    }
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self::new(None)
    }
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_web_search() -> bool {
    true
}

#[derive(Deserialize, Clone, Debug)]
pub struct IngestionSettings {
    #[serde(default = "default_max_width")]
    pub max_width: u32,
}

impl Default for IngestionSettings {
    fn default() -> Self {
        Self {
            max_width: default_max_width(),
        }
    }
}

fn default_max_width() -> u32 {
    500
}

pub fn get_configuration() -> Result<Settings, AppError> {
    let base_path = std::env::current_dir()
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("No working directory: {}", e)))?;

    // Run either from the workspace root or from inside the crate
    let configuration_directory = if base_path.ends_with("diagnosis-frontend") {
        base_path.join("config")
    } else {
        base_path.join("diagnosis-frontend").join("config")
    };

    let mut settings: Settings = load_layered(&configuration_directory)?;
    apply_credential_fallback(&mut settings.gemini, std::env::var(CREDENTIAL_ENV_VAR).ok());
    Ok(settings)
}

/// Fill the credential from `GOOGLE_API_KEY` when the layered config has none,
/// and normalize blank keys to `None`.
pub fn apply_credential_fallback(gemini: &mut GeminiSettings, env_value: Option<String>) {
    if !gemini.has_credential() {
        gemini.api_key = env_value
            .filter(|key| !key.trim().is_empty())
            .map(Secret::new);
    }
}
