/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint:

- `ask`   : answer a prompt in a user's assistant conversation
- `media` : chat completion, image generation, and transcription
- `tools` : list or invoke the local tools

[`run`] is the outermost error boundary. Handler errors are logged there and
turned into a failing exit code instead of a panic.
*/

pub mod ask;
pub mod media;
pub mod tools;

use std::process::ExitCode;

use crate::agent::PromptStore;
use crate::cli::{Commands, ToolsCommand};
use crate::config::Config;
use crate::error::Result;

/// Execute one command
///
/// # Errors
///
/// Returns whatever the selected handler returns
pub async fn dispatch(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Ask { user, prompt } => {
            tracing::info!("Asking assistant for user {}", user);
            ask::run_ask(&config, &user, &prompt).await
        }
        Commands::Chat {
            user,
            prompt,
            system,
            image_url,
        } => {
            tracing::info!("Sending chat completion");
            let prompts = PromptStore::new();
            media::run_chat(
                &config,
                &prompts,
                &user,
                &prompt,
                system.as_deref(),
                image_url.as_deref(),
            )
            .await
        }
        Commands::Image {
            prompt,
            size,
            model,
        } => {
            tracing::info!("Generating image");
            media::run_image(&config, &prompt, size, model).await
        }
        Commands::Transcribe { file } => {
            tracing::info!("Transcribing {}", file.display());
            media::run_transcribe(&config, &file).await
        }
        Commands::Tools { command } => match command {
            ToolsCommand::List => tools::list_tools(&config),
            ToolsCommand::Call { name, args } => tools::call_tool(&config, &name, &args).await,
        },
    }
}

/// Execute one command, logging any failure
///
/// # Returns
///
/// `ExitCode::SUCCESS` when the handler succeeded, `ExitCode::FAILURE`
/// otherwise
pub async fn run(command: Commands, config: Config) -> ExitCode {
    match dispatch(command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppEnv;

    #[tokio::test]
    async fn test_run_logs_failure_and_returns_failure_code() {
        let mut config = Config::default();
        config.tools.roster_path = "/nonexistent/roster.yaml".to_string();

        let code = run(
            Commands::Tools {
                command: ToolsCommand::List,
            },
            config,
        )
        .await;
        assert_eq!(code, ExitCode::FAILURE);
    }

    #[tokio::test]
    async fn test_run_media_without_key_fails_cleanly() {
        let mut config = Config::default();
        config.app.env = AppEnv::Production;

        let code = run(
            Commands::Image {
                prompt: "a cat".to_string(),
                size: None,
                model: None,
            },
            config,
        )
        .await;
        assert_eq!(code, ExitCode::FAILURE);
    }
}
