//! Text-generation providers
//!
//! [`TextProvider`] is the only thing the story pipeline knows about the model behind it:
//! submit a prompt, optionally in JSON mode, and get back the reply text. [`OpenAiProvider`]
//! implements it against any OpenAI-compatible chat completions endpoint.
use crate::client::HttpClient;
use crate::errors::StoryError;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, header};
use bon::Builder;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};
use url::Url;

const CHAT_COMPLETIONS_PATH: &str = "chat/completions";

/// Largest completion envelope read from the provider before giving up.
const MAX_RESPONSE_BYTES: usize = 8 * 1024 * 1024;

/// Longest slice of an upstream body that is written to the logs.
const LOG_PREVIEW_CHARS: usize = 500;

#[async_trait]
pub trait TextProvider: std::fmt::Debug + Send + Sync {
    /// Submits `prompt` as a single user message.
    ///
    /// Returns `Ok(None)` when the provider answered but produced no content.
    async fn complete(&self, prompt: &str, json_mode: bool) -> Result<Option<String>, StoryError>;
}

/// Everything needed to reach an OpenAI-compatible provider.
#[derive(Clone, Builder)]
pub struct ProviderSettings {
    api_key: String,
    model: String,
    base_url: Url,
    temperature: Option<f32>,
}

impl ProviderSettings {
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("model", &self.model)
            .field("base_url", &self.base_url.as_str())
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

/// Request body for POST {base}/chat/completions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ChatCompletionRequest {
    pub(crate) model: String,
    pub(crate) messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ChatMessage {
    pub(crate) role: String,
    pub(crate) content: String,
}

impl ChatMessage {
    fn user(content: &str) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ResponseFormat {
    #[serde(rename = "type")]
    pub(crate) kind: String,
}

impl ResponseFormat {
    fn json_object() -> Self {
        Self {
            kind: "json_object".into(),
        }
    }
}

/// Only the parts of a completion this service reads. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionResponse {
    fn into_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
    }
}

/// A provider speaking the OpenAI chat completions protocol.
#[derive(Debug, Clone)]
pub struct OpenAiProvider<T: HttpClient> {
    http_client: T,
    settings: ProviderSettings,
    endpoint: Url,
    max_response_bytes: usize,
}

impl<T: HttpClient> OpenAiProvider<T> {
    pub fn new(http_client: T, settings: ProviderSettings) -> Result<Self, url::ParseError> {
        let mut base = settings.base_url.clone();
        // `Url::join` replaces the last segment unless the base ends with a slash.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base.join(CHAT_COMPLETIONS_PATH)?;

        Ok(Self {
            http_client,
            settings,
            endpoint,
            max_response_bytes: MAX_RESPONSE_BYTES,
        })
    }

    /// Overrides the cap on how much of a provider response body is buffered.
    pub fn with_max_response_bytes(mut self, limit: usize) -> Self {
        self.max_response_bytes = limit;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn build_request(&self, prompt: &str, json_mode: bool) -> Result<Request<Body>, StoryError> {
        let body = ChatCompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![ChatMessage::user(prompt)],
            response_format: json_mode.then(ResponseFormat::json_object),
            temperature: self.settings.temperature,
        };
        let body_bytes = serde_json::to_vec(&body)
            .map_err(|e| StoryError::ProviderInvocation(format!("serialize request: {e}")))?;

        Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.as_str())
            .header(header::CONTENT_TYPE, "application/json")
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.settings.api_key),
            )
            .body(Body::from(body_bytes))
            .map_err(|e| StoryError::ProviderInvocation(format!("build request: {e}")))
    }
}

#[async_trait]
impl<T: HttpClient + Send + Sync> TextProvider for OpenAiProvider<T> {
    #[instrument(skip(self, prompt), fields(model = %self.settings.model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str, json_mode: bool) -> Result<Option<String>, StoryError> {
        let request = self.build_request(prompt, json_mode)?;

        debug!("Sending completion request to {}", self.endpoint);
        let response = self.http_client.request(request).await.map_err(|e| {
            error!(error = %e, endpoint = %self.endpoint, "Error calling story provider");
            StoryError::ProviderInvocation(e.to_string())
        })?;

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), self.max_response_bytes)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to read provider response body");
                StoryError::ProviderInvocation(format!("read body: {e}"))
            })?;

        if !status.is_success() {
            error!(
                %status,
                body_preview = %preview(&body_bytes),
                "Story provider returned an error status"
            );
            return Err(StoryError::ProviderStatus(status));
        }

        let completion: ChatCompletionResponse =
            serde_json::from_slice(&body_bytes).map_err(|e| {
                error!(
                    error = %e,
                    body_preview = %preview(&body_bytes),
                    "Failed to parse chat completion envelope"
                );
                StoryError::ProviderInvocation(format!("decode completion: {e}"))
            })?;

        Ok(completion.into_content())
    }
}

fn preview(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .take(LOG_PREVIEW_CHARS)
        .collect()
}
