//! Request and response types for the plain completion, image, and audio endpoints
//!
//! These endpoints are simple request/response proxies; the only behaviour
//! that lives here is model selection for image-bearing chats and the image
//! size normalization rule.

use crate::config::OpenAiConfig;
use serde::{Deserialize, Serialize};

/// 256 pixel square image
pub const IMAGE_SIZE_256: &str = "256x256";
/// 512 pixel square image
pub const IMAGE_SIZE_512: &str = "512x512";
/// 1024 pixel square image
pub const IMAGE_SIZE_1024: &str = "1024x1024";

/// Image model that only renders 1024 and larger
pub const MODEL_DALL_E_3: &str = "dall-e-3";
/// Default transcription model
pub const MODEL_WHISPER_1: &str = "whisper-1";

/// Upgrade small sizes for models that cannot render them
///
/// A requested size of 256 or 512 becomes 1024 when the model is
/// `dall-e-3`; any other combination is returned unchanged.
///
/// # Examples
///
/// ```
/// use assistant_relay::providers::media::normalize_image_size;
///
/// assert_eq!(normalize_image_size("dall-e-3", "256x256"), "1024x1024");
/// assert_eq!(normalize_image_size("dall-e-2", "256x256"), "256x256");
/// ```
pub fn normalize_image_size(model: &str, size: &str) -> String {
    if model == MODEL_DALL_E_3 && (size == IMAGE_SIZE_256 || size == IMAGE_SIZE_512) {
        IMAGE_SIZE_1024.to_string()
    } else {
        size.to_string()
    }
}

/// Why a completion stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// The model finished its answer
    Stop,
    /// The answer was cut short
    Length,
    /// Anything else the service reports
    #[serde(other)]
    Other,
}

/// Chat message content: either a plain string or a list of parts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatContent {
    /// Plain text
    Text(String),
    /// Mixed text and image parts
    Parts(Vec<ContentPart>),
}

/// A part of a multi-part chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text part
    Text {
        /// Text payload
        text: String,
    },
    /// Image referenced by URL or data URI
    ImageUrl {
        /// Image location
        image_url: ImageUrl,
    },
}

/// Image location for vision requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrl {
    /// URL or `data:` URI
    pub url: String,
}

/// A message of a chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author role
    pub role: String,
    /// Message content
    pub content: ChatContent,
}

impl ChatMessage {
    /// System message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: ChatContent::Text(content.into()),
        }
    }

    /// User message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: ChatContent::Text(content.into()),
        }
    }

    /// Assistant reply, kept in a prompt history
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: ChatContent::Text(content.into()),
        }
    }

    /// User message carrying an image
    pub fn user_with_image(text: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: ChatContent::Parts(vec![
                ContentPart::Text { text: text.into() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image_url.into(),
                    },
                },
            ]),
        }
    }

    /// True when any part of the content is an image
    pub fn has_image(&self) -> bool {
        match &self.content {
            ChatContent::Text(_) => false,
            ChatContent::Parts(parts) => parts
                .iter()
                .any(|p| matches!(p, ContentPart::ImageUrl { .. })),
        }
    }

    /// Text of the message with image parts left out
    pub fn text(&self) -> String {
        match &self.content {
            ChatContent::Text(text) => text.clone(),
            ChatContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// Body of a chat completion request
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    /// Model name
    pub model: String,
    /// Conversation so far
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens in the reply
    pub max_tokens: u32,
    /// Frequency penalty
    pub frequency_penalty: f32,
    /// Presence penalty
    pub presence_penalty: f32,
}

impl ChatCompletionRequest {
    /// Build a request from configured defaults
    ///
    /// The vision model replaces the completion model when any message
    /// carries an image.
    pub fn from_config(config: &OpenAiConfig, messages: Vec<ChatMessage>) -> Self {
        let model = if messages.iter().any(ChatMessage::has_image) {
            config.vision_model.clone()
        } else {
            config.completion.model.clone()
        };

        Self {
            model,
            messages,
            temperature: config.completion.temperature,
            max_tokens: config.completion.max_tokens,
            frequency_penalty: config.completion.frequency_penalty,
            presence_penalty: config.completion.presence_penalty,
        }
    }
}

/// Result of a chat completion
#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletion {
    /// Reply text
    pub text: String,
    /// Why the model stopped
    pub finish_reason: FinishReason,
}

/// Body of an image generation request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRequest {
    /// Model name
    pub model: String,
    /// What to draw
    pub prompt: String,
    /// Requested size
    pub size: String,
    /// Quality hint
    pub quality: String,
    /// Number of images
    pub n: u32,
}

impl ImageRequest {
    /// Build a request from configured defaults
    pub fn from_config(config: &OpenAiConfig, prompt: impl Into<String>) -> Self {
        Self {
            model: config.image.model.clone(),
            prompt: prompt.into(),
            size: config.image.size.clone(),
            quality: config.image.quality.clone(),
            n: 1,
        }
    }

    /// Apply [`normalize_image_size`] to this request
    pub fn normalized(mut self) -> Self {
        self.size = normalize_image_size(&self.model, &self.size);
        self
    }
}
