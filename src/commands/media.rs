//! Media commands: chat completion, image generation, transcription

use std::path::Path;

use crate::agent::{Prompt, PromptStore};
use crate::config::Config;
use crate::error::Result;
use crate::providers::media::MODEL_WHISPER_1;
use crate::providers::{
    ChatCompletionRequest, ChatMessage, FinishReason, ImageRequest, OpenAiClient,
};

/// Extend the stored prompt of `user` with a new message
///
/// The system instruction is only added to an empty prompt.
pub async fn next_prompt(
    prompts: &PromptStore,
    user: &str,
    prompt: &str,
    system: Option<&str>,
    image_url: Option<&str>,
) -> Prompt {
    let mut history = prompts.get_prompt(user).await;
    if history.is_empty() {
        if let Some(system) = system {
            history.push(ChatMessage::system(system));
        }
    }
    history.push(match image_url {
        Some(url) => ChatMessage::user_with_image(prompt, url),
        None => ChatMessage::user(prompt),
    });
    history
}

/// Send a chat completion for `user` and print the reply
///
/// The reply is appended to the user's prompt in `prompts`.
///
/// # Errors
///
/// Returns error if the client cannot be created or the request fails
pub async fn run_chat(
    config: &Config,
    prompts: &PromptStore,
    user: &str,
    prompt: &str,
    system: Option<&str>,
    image_url: Option<&str>,
) -> Result<()> {
    let client = OpenAiClient::new(config.openai.clone())?;
    let mut history = next_prompt(prompts, user, prompt, system, image_url).await;
    let request = ChatCompletionRequest::from_config(&config.openai, history.messages().to_vec());

    let completion = client.create_chat_completion(&request).await?;
    if completion.finish_reason != FinishReason::Stop {
        tracing::warn!("Reply stopped early ({:?})", completion.finish_reason);
    }
    let text = completion.text.trim();
    println!("{}", text);

    history.push(ChatMessage::assistant(text));
    prompts.set_prompt(user, history).await;
    if let Some(rendered) = prompts.render().await {
        tracing::debug!("Prompts:{}", rendered);
    }
    Ok(())
}

/// Build an image request with optional command-line overrides
pub fn image_request(
    config: &Config,
    prompt: &str,
    size: Option<String>,
    model: Option<String>,
) -> ImageRequest {
    let mut request = ImageRequest::from_config(&config.openai, prompt);
    if let Some(size) = size {
        request.size = size;
    }
    if let Some(model) = model {
        request.model = model;
    }
    request
}

/// Generate an image and print its URLs
///
/// # Errors
///
/// Returns error if the client cannot be created or the request fails
pub async fn run_image(
    config: &Config,
    prompt: &str,
    size: Option<String>,
    model: Option<String>,
) -> Result<()> {
    let client = OpenAiClient::new(config.openai.clone())?;
    let urls = client
        .create_image(image_request(config, prompt, size, model))
        .await?;

    if urls.is_empty() {
        tracing::warn!("Image generation returned no URLs");
    }
    for url in urls {
        println!("{}", url);
    }
    Ok(())
}

/// Transcribe an audio file and print the text
///
/// # Errors
///
/// Returns error if the file cannot be read, the client cannot be created,
/// or the request fails
pub async fn run_transcribe(config: &Config, file: &Path) -> Result<()> {
    let audio = tokio::fs::read(file).await?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "audio".to_string());

    let client = OpenAiClient::new(config.openai.clone())?;
    let text = client
        .create_transcription(audio, &file_name, MODEL_WHISPER_1)
        .await?;
    println!("{}", text);
    Ok(())
}
