use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::LlmSettings;

const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Gemini,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => DEFAULT_OPENAI_MODEL,
            Self::Gemini => DEFAULT_GEMINI_MODEL,
        }
    }

    fn credential_var(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "gemini" => Ok(Self::Gemini),
            other => Err(GatewayError::Configuration(format!(
                "unsupported LLM provider '{other}', choose 'openai' or 'gemini'"
            ))),
        }
    }
}

/// Sampling parameters for a single completion.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub system: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("generation failed: {0}")]
    Generation(String),
}

/// Provider-level failure. Never leaves this module: it is logged and collapsed
/// into [`GatewayError::Generation`].
#[derive(Debug, Error)]
enum ProviderError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("empty completion")]
    EmptyCompletion,
}

impl ProviderError {
    fn summary(&self) -> String {
        match self {
            Self::Request(e) if e.is_timeout() => "request timed out".to_string(),
            Self::Request(_) => "request could not be completed".to_string(),
            Self::HttpStatus { status, .. } => {
                format!("provider returned HTTP {}", status.as_u16())
            }
            Self::Json(_) => "provider response could not be decoded".to_string(),
            Self::EmptyCompletion => "provider returned an empty completion".to_string(),
        }
    }
}

fn collapse(provider: ProviderKind, model: &str, err: ProviderError) -> GatewayError {
    error!(provider = provider.as_str(), model, error = %err, "LLM generation failed");
    GatewayError::Generation(format!("{} {}", provider.as_str(), err.summary()))
}

/// Text-completion capability shared by every provider.
///
/// Implementations hold only immutable state after construction and are shared
/// across requests behind an `Arc`. Each call is a single attempt.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    fn provider(&self) -> ProviderKind;

    fn model(&self) -> &str;

    async fn generate(&self, prompt: &str, params: &GenerationParams)
        -> Result<String, GatewayError>;
}

/// Builds the gateway selected by `settings`, refusing to start without a credential.
pub fn build_gateway(settings: &LlmSettings) -> Result<Arc<dyn LlmGateway>, GatewayError> {
    let provider: ProviderKind = settings.provider.parse()?;
    let model = settings
        .model
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| provider.default_model())
        .to_string();

    let api_key = match provider {
        ProviderKind::OpenAi => settings.openai_api_key.as_deref(),
        ProviderKind::Gemini => settings.gemini_api_key.as_deref(),
    }
    .map(str::trim)
    .filter(|key| !key.is_empty())
    .ok_or_else(|| {
        GatewayError::Configuration(format!(
            "{} environment variable not set for {}",
            provider.credential_var(),
            provider.as_str()
        ))
    })?
    .to_string();

    let gateway: Arc<dyn LlmGateway> = match provider {
        ProviderKind::OpenAi => Arc::new(OpenAiGateway::new(
            api_key,
            model,
            &settings.openai_base_url,
            settings.timeout,
        )?),
        ProviderKind::Gemini => Arc::new(GeminiGateway::new(
            api_key,
            model,
            &settings.gemini_base_url,
            settings.timeout,
        )?),
    };

    info!(
        provider = gateway.provider().as_str(),
        model = gateway.model(),
        "LLM gateway initialized"
    );
    Ok(gateway)
}

fn http_client(timeout: Duration) -> Result<reqwest::Client, GatewayError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| GatewayError::Configuration(format!("HTTP client could not be built: {e}")))
}

fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

async fn decode_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ProviderError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ProviderError::HttpStatus { status, body });
    }

    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| {
        error!(body = %String::from_utf8_lossy(&bytes), "Failed to parse LLM response JSON");
        ProviderError::Json(e)
    })
}

// ========== OpenAI chat completions ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ChatReplyMessage {
    content: Option<String>,
}

impl ChatResponse {
    fn into_first_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
    }
}

pub struct OpenAiGateway {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiGateway {
    pub fn new(
        api_key: String,
        model: String,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            api_key,
            model,
            base_url: normalize_base_url(base_url),
            client: http_client(timeout)?,
        })
    }

    async fn complete(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = params.system.as_deref() {
            messages.push(ChatMessage {
                role: "system".into(),
                content: system.into(),
            });
        }
        messages.push(ChatMessage {
            role: "user".into(),
            content: prompt.into(),
        });

        let payload = ChatRequest {
            model: &self.model,
            messages,
            temperature: params.temperature,
            max_tokens: params.max_output_tokens,
        };

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let parsed: ChatResponse = decode_json(resp).await?;
        parsed
            .into_first_content()
            .ok_or(ProviderError::EmptyCompletion)
    }
}

#[async_trait]
impl LlmGateway for OpenAiGateway {
    fn provider(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, GatewayError> {
        debug!(model = %self.model, prompt_chars = prompt.len(), "sending OpenAI completion");
        self.complete(prompt, params)
            .await
            .map_err(|e| collapse(ProviderKind::OpenAi, &self.model, e))
    }
}

// ========== Gemini generateContent ==========

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiReplyContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiReplyContent {
    #[serde(default)]
    parts: Vec<GeminiReplyPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiReplyPart {
    text: Option<String>,
}

impl GeminiResponse {
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

pub struct GeminiGateway {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiGateway {
    pub fn new(
        api_key: String,
        model: String,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            api_key,
            model,
            base_url: normalize_base_url(base_url),
            client: http_client(timeout)?,
        })
    }

    async fn complete(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let payload = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user"),
                parts: vec![GeminiPart { text: prompt }],
            }],
            system_instruction: params.system.as_deref().map(|system| GeminiContent {
                role: None,
                parts: vec![GeminiPart { text: system }],
            }),
            generation_config: GeminiGenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_output_tokens,
            },
        };

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        let parsed: GeminiResponse = decode_json(resp).await?;
        parsed.into_text().ok_or(ProviderError::EmptyCompletion)
    }
}

#[async_trait]
impl LlmGateway for GeminiGateway {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, GatewayError> {
        debug!(model = %self.model, prompt_chars = prompt.len(), "sending Gemini completion");
        self.complete(prompt, params)
            .await
            .map_err(|e| collapse(ProviderKind::Gemini, &self.model, e))
    }
}
