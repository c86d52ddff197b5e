//! Per-user chat prompts
//!
//! Chat completions carry their own message history instead of a remote
//! thread. The store keeps that history per user for the lifetime of the
//! process, alongside the thread map in [`super::conversation`].

use std::collections::HashMap;
use std::fmt;

use tokio::sync::RwLock;
use tracing::debug;

use crate::providers::ChatMessage;

/// Length of the user id prefix shown when rendering the store
const USER_ID_PREFIX_LEN: usize = 6;

/// Message history sent with a chat completion
#[derive(Debug, Clone, Default)]
pub struct Prompt {
    messages: Vec<ChatMessage>,
}

impl Prompt {
    /// Create an empty prompt
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Messages in the order they were added
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True if no message was added yet
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for message in &self.messages {
            writeln!(f, "{}: {}", message.role, message.text())?;
        }
        Ok(())
    }
}

/// Process-wide map from user id to chat prompt
#[derive(Debug, Default)]
pub struct PromptStore {
    prompts: RwLock<HashMap<String, Prompt>>,
}

impl PromptStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Prompt of `user_id`, or an empty one if none was stored
    pub async fn get_prompt(&self, user_id: &str) -> Prompt {
        self.prompts
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Store `prompt` for `user_id`, replacing any previous one
    pub async fn set_prompt(&self, user_id: &str, prompt: Prompt) {
        debug!("Storing {} messages for user {}", prompt.len(), user_id);
        self.prompts
            .write()
            .await
            .insert(user_id.to_string(), prompt);
    }

    /// Forget the prompt of `user_id`, returning it if one was stored
    pub async fn remove_prompt(&self, user_id: &str) -> Option<Prompt> {
        self.prompts.write().await.remove(user_id)
    }

    /// Every stored prompt under a short user id heading, sorted by user
    ///
    /// Returns `None` when the store is empty.
    pub async fn render(&self) -> Option<String> {
        let prompts = self.prompts.read().await;
        if prompts.is_empty() {
            return None;
        }

        let mut users: Vec<&String> = prompts.keys().collect();
        users.sort();
        let rendered: String = users
            .into_iter()
            .map(|user_id| {
                let prefix: String = user_id.chars().take(USER_ID_PREFIX_LEN).collect();
                format!("\n=== {} ===\n{}", prefix, prompts[user_id])
            })
            .collect();
        Some(rendered)
    }
}
