//! `ask`: answer a prompt through the assistant

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::agent::{Completion, CompletionAdapter, ConversationStore};
use crate::config::Config;
use crate::error::Result;
use crate::providers::fake::FakeAssistantClient;
use crate::providers::{self, AssistantClient};
use crate::tools::build_registry;

/// Ask the assistant and print the reply
///
/// Ctrl-C cancels a run that is still being polled.
///
/// # Arguments
///
/// * `config` - Validated configuration
/// * `user_id` - User whose conversation thread is used
/// * `prompt` - Question for the assistant
///
/// # Errors
///
/// Returns error if the roster or client cannot be initialized, or the
/// completion fails
pub async fn run_ask(config: &Config, user_id: &str, prompt: &str) -> Result<()> {
    let adapter = build_adapter(config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling run");
            on_interrupt.cancel();
        }
    });

    let result = adapter.generate_with_cancel(prompt, user_id, &cancel).await;
    interrupt.abort();

    print_completion(&result?);
    Ok(())
}

/// Wire a completion adapter from configuration
///
/// Outside production the adapter never reaches the service, so a missing
/// API key is tolerated there and an offline client is used instead.
///
/// # Errors
///
/// Returns error if the roster cannot be loaded or, in production, the
/// client cannot be created
pub fn build_adapter(config: &Config) -> Result<CompletionAdapter> {
    let tools = Arc::new(build_registry(&config.tools, config.app.lang)?);

    let client: Arc<dyn AssistantClient> =
        if !config.app.env.is_production() && config.openai.api_key.is_none() {
            tracing::info!("No API key configured; using offline client for canned replies");
            Arc::new(FakeAssistantClient::new())
        } else {
            providers::create_client(&config.openai)?
        };

    CompletionAdapter::from_config(config, client, tools, Arc::new(ConversationStore::new()))
}

fn print_completion(completion: &Completion) {
    if !completion.is_finish_reason_stop() {
        tracing::warn!("Answer stopped early ({:?})", completion.finish_reason);
    }
    println!("{}", completion.text);
}
