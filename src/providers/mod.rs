//! Provider module for the assistant relay
//!
//! This module contains the assistant service abstraction, its HTTP
//! implementation, the media endpoint types, and a scripted fake for tests.

pub mod base;
pub mod fake;
pub mod media;
pub mod openai;

pub use base::{
    AssistantClient, FunctionCall, MessageContent, MessageText, RequiredAction, Run, RunError,
    RunStatus, SubmitToolOutputs, Thread, ThreadMessage, ToolCall, ToolOutput,
    ACTION_SUBMIT_TOOL_OUTPUTS,
};
pub use media::{ChatCompletion, ChatCompletionRequest, ChatMessage, FinishReason, ImageRequest};
pub use openai::OpenAiClient;

#[cfg(test)]
pub use base::MockAssistantClient;

use crate::config::OpenAiConfig;
use crate::error::Result;
use std::sync::Arc;

/// Create the assistant client described by configuration
///
/// # Errors
///
/// Returns error if credentials are missing or the HTTP client cannot be
/// initialized
pub fn create_client(config: &OpenAiConfig) -> Result<Arc<dyn AssistantClient>> {
    Ok(Arc::new(OpenAiClient::new(config.clone())?))
}
