//! External image generation collaborator.
//!
//! The pipeline only needs "text in, image bytes out, may fail", expressed by
//! the [`ImageGenerator`] trait. [`GeminiGenerator`] is the production
//! implementation; [`DisabledGenerator`] backs offline runs where every cache
//! miss uses the procedural background.

use crate::config::{GeneratorConfig, Provider};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::blocking::Client as HttpClient;
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("image generation is disabled")]
    Disabled,
    #[error("environment variable {0} is not set; set it or run with --offline")]
    MissingApiKey(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
    #[error("base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// What to ask the generator for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Number of images wanted. Providers may return fewer.
    pub count: u32,
    /// Aspect ratio hint such as `"16:9"`.
    pub aspect_ratio: String,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, aspect_ratio: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            count: 1,
            aspect_ratio: aspect_ratio.into(),
        }
    }
}

/// Raw bytes of one generated image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

/// Anything that turns an instruction into zero or more images.
pub trait ImageGenerator {
    /// Short name shown in logs and output (`"gemini"`, `"disabled"`).
    fn name(&self) -> &str;

    /// Make a single attempt. No retries; callers fall back on any error.
    fn generate(&self, request: &GenerationRequest) -> Result<Vec<GeneratedImage>, GenerationError>;
}

/// Always fails with [`GenerationError::Disabled`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledGenerator;

impl ImageGenerator for DisabledGenerator {
    fn name(&self) -> &str {
        "disabled"
    }

    fn generate(&self, _request: &GenerationRequest) -> Result<Vec<GeneratedImage>, GenerationError> {
        Err(GenerationError::Disabled)
    }
}

/// Google Gemini `generateContent` image generation over blocking HTTP.
pub struct GeminiGenerator {
    http: HttpClient,
    api_base: String,
    model: String,
    api_key: String,
}

impl GeminiGenerator {
    pub fn new(
        api_base: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let http = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_base: api_base.into(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self) -> String {
        let trimmed = self.model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!(
            "{}/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            model_path
        )
    }
}

/// Request body for a Gemini image generation call.
pub(crate) fn gemini_payload(request: &GenerationRequest) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": request.prompt }],
        }],
        "generationConfig": {
            "responseModalities": ["IMAGE"],
            "candidateCount": request.count.max(1),
            "imageConfig": { "aspectRatio": request.aspect_ratio },
        },
    })
}

/// Collect every inline image part from a `generateContent` response.
///
/// Accepts both the camelCase and snake_case spellings of the inline data
/// fields. Text parts are ignored.
pub(crate) fn extract_inline_images(payload: &Value) -> Result<Vec<GeneratedImage>, GenerationError> {
    let Some(candidates) = payload.get("candidates").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };
    let mut out = Vec::new();
    for candidate in candidates {
        let parts = candidate
            .get("content")
            .and_then(|content| content.get("parts"))
            .and_then(Value::as_array);
        for part in parts.into_iter().flatten() {
            let Some(inline) = part.get("inlineData").or_else(|| part.get("inline_data")) else {
                continue;
            };
            let data = inline.get("data").and_then(Value::as_str).unwrap_or_default();
            if data.is_empty() {
                continue;
            }
            let bytes = BASE64.decode(data.as_bytes())?;
            let mime_type = inline
                .get("mimeType")
                .or_else(|| inline.get("mime_type"))
                .and_then(Value::as_str)
                .map(str::to_string);
            out.push(GeneratedImage { bytes, mime_type });
        }
    }
    Ok(out)
}

impl ImageGenerator for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    fn generate(&self, request: &GenerationRequest) -> Result<Vec<GeneratedImage>, GenerationError> {
        let endpoint = self.endpoint();
        debug!(endpoint = %endpoint, prompt_chars = request.prompt.len(), "requesting illustration");

        let response = self
            .http
            .post(&endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&gemini_payload(request))
            .send()?;

        let status = response.status();
        let body = response.bytes()?;
        if !status.is_success() {
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).chars().take(500).collect(),
            });
        }

        let payload: Value = serde_json::from_slice(&body)
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;
        extract_inline_images(&payload)
    }
}

/// Build the generator named by the config.
///
/// `offline` forces [`DisabledGenerator`]. A configured provider whose API key
/// variable is unset or blank is an error rather than a silent fallback.
pub fn from_config(
    config: &GeneratorConfig,
    offline: bool,
) -> Result<Box<dyn ImageGenerator>, GenerationError> {
    if offline || config.provider == Provider::None {
        return Ok(Box::new(DisabledGenerator));
    }
    let api_key = std::env::var(&config.api_key_env)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| GenerationError::MissingApiKey(config.api_key_env.clone()))?;
    match config.provider {
        Provider::Gemini => Ok(Box::new(GeminiGenerator::new(
            &config.api_base,
            &config.model,
            api_key,
            Duration::from_secs(config.timeout_secs),
        )?)),
        Provider::None => Ok(Box::new(DisabledGenerator)),
    }
}
