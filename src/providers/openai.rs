//! OpenAI-compatible assistant service client
//!
//! This module implements [`AssistantClient`] over HTTP for the Assistants v2
//! API, plus the plain chat completion, image generation, and audio
//! transcription endpoints.

use crate::config::OpenAiConfig;
use crate::error::{RelayError, Result};
use crate::providers::media::{ChatCompletion, ChatCompletionRequest, FinishReason, ImageRequest};
use crate::providers::{AssistantClient, Run, Thread, ThreadMessage, ToolOutput};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

/// HTTP client for the remote assistant service
///
/// Every request carries the configured API key as a bearer token and the
/// `OpenAI-Beta: assistants=v2` header. Non-success responses become
/// [`RelayError::Service`] with the service's own error message.
///
/// # Examples
///
/// ```no_run
/// use assistant_relay::config::OpenAiConfig;
/// use assistant_relay::providers::{AssistantClient, OpenAiClient};
///
/// # async fn example() -> assistant_relay::error::Result<()> {
/// let config = OpenAiConfig {
///     api_key: Some("sk-...".to_string()),
///     ..Default::default()
/// };
/// let client = OpenAiClient::new(config)?;
/// let thread = client.create_thread().await?;
/// # Ok(())
/// # }
/// ```
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    config: OpenAiConfig,
}

/// Error envelope returned by the service
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Paginated list wrapper
#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    finish_reason: Option<FinishReason>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Pull the service-provided message out of an error body
///
/// Falls back to the raw body when it is not the usual error envelope.
fn service_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| body.to_string())
}

impl OpenAiClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::MissingCredentials`] when no API key is
    /// configured, or [`RelayError::Provider`] if the HTTP client cannot be
    /// built.
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| RelayError::MissingCredentials("OPENAI_API_KEY is not set".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert("OpenAI-Beta", HeaderValue::from_static("assistants=v2"));

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("assistant-relay/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| RelayError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized assistant client: base_url={}, timeout_ms={}",
            config.base_url,
            config.timeout_ms
        );

        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    /// Configured base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Send a request and decode a JSON response
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let response = request
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("{} request failed: {}", what, e);
                RelayError::Http(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = service_error_message(&body);
            tracing::error!("{} returned error {}: {}", what, status, message);
            return Err(RelayError::Service {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        response.json::<T>().await.map_err(|e| {
            tracing::error!("Failed to parse {} response: {}", what, e);
            RelayError::Provider(format!("Failed to parse {} response: {}", what, e)).into()
        })
    }

    /// Run a plain chat completion
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, a non-success status, or a
    /// response without choices
    pub async fn create_chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletion> {
        tracing::debug!(
            "Sending chat completion: model={}, {} messages",
            request.model,
            request.messages.len()
        );

        let response: ChatCompletionResponse = self
            .send(
                self.client
                    .post(self.url("/v1/chat/completions"))
                    .json(request),
                "Chat completion",
            )
            .await?;

        let choice = response.choices.into_iter().next().ok_or_else(|| {
            RelayError::Provider("Chat completion returned no choices".to_string())
        })?;

        Ok(ChatCompletion {
            text: choice.message.content.unwrap_or_default(),
            finish_reason: choice.finish_reason.unwrap_or(FinishReason::Other),
        })
    }

    /// Generate images and return their URLs
    ///
    /// The request size is normalized for the target model before sending.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure or a non-success status
    pub async fn create_image(&self, request: ImageRequest) -> Result<Vec<String>> {
        let request = request.normalized();
        tracing::debug!(
            "Sending image generation: model={}, size={}",
            request.model,
            request.size
        );

        let response: ImageResponse = self
            .send(
                self.client
                    .post(self.url("/v1/images/generations"))
                    .json(&request),
                "Image generation",
            )
            .await?;

        Ok(response.data.into_iter().filter_map(|d| d.url).collect())
    }

    /// Transcribe an audio file
    ///
    /// # Errors
    ///
    /// Returns error on transport failure or a non-success status
    pub async fn create_transcription(
        &self,
        audio: Vec<u8>,
        file_name: &str,
        model: &str,
    ) -> Result<String> {
        tracing::debug!(
            "Sending transcription: file={}, {} bytes, model={}",
            file_name,
            audio.len(),
            model
        );

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio).file_name(file_name.to_string()),
            )
            .text("model", model.to_string());

        let response: TranscriptionResponse = self
            .send(
                self.client
                    .post(self.url("/v1/audio/transcriptions"))
                    .multipart(form),
                "Transcription",
            )
            .await?;

        Ok(response.text)
    }
}

#[async_trait]
impl AssistantClient for OpenAiClient {
    async fn create_thread(&self) -> Result<Thread> {
        self.send(
            self.client.post(self.url("/v1/threads")).json(&json!({})),
            "Create thread",
        )
        .await
    }

    async fn create_message(&self, thread_id: &str, content: &str) -> Result<ThreadMessage> {
        self.send(
            self.client
                .post(self.url(&format!("/v1/threads/{}/messages", thread_id)))
                .json(&json!({ "role": "user", "content": content })),
            "Create message",
        )
        .await
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run> {
        self.send(
            self.client
                .post(self.url(&format!("/v1/threads/{}/runs", thread_id)))
                .json(&json!({ "assistant_id": assistant_id })),
            "Create run",
        )
        .await
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        self.send(
            self.client
                .get(self.url(&format!("/v1/threads/{}/runs/{}", thread_id, run_id))),
            "Retrieve run",
        )
        .await
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<Run> {
        self.send(
            self.client
                .post(self.url(&format!(
                    "/v1/threads/{}/runs/{}/submit_tool_outputs",
                    thread_id, run_id
                )))
                .json(&json!({ "tool_outputs": outputs })),
            "Submit tool outputs",
        )
        .await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>> {
        let response: ListResponse<ThreadMessage> = self
            .send(
                self.client
                    .get(self.url(&format!("/v1/threads/{}/messages", thread_id)))
                    .query(&[("order", "desc")]),
                "List messages",
            )
            .await?;
        Ok(response.data)
    }
}
