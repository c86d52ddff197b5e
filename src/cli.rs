//! Command-line interface definition for the assistant relay
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for asking the assistant, the media endpoints, and
//! inspecting the local tools.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::AppEnv;

/// Assistant relay - drive hosted assistant runs from the command line
///
/// Relays prompts to a hosted assistant, answers its tool calls from local
/// roster data, and prints the final reply.
#[derive(Parser, Debug, Clone)]
#[command(name = "assistant-relay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Override the deployment environment (production, development)
    #[arg(short, long)]
    pub env: Option<AppEnv>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Ask the assistant a question in a user's conversation
    Ask {
        /// User whose conversation thread is used
        #[arg(short, long, default_value = "cli")]
        user: String,

        /// Question for the assistant
        prompt: String,
    },

    /// Send a one-off chat completion without a conversation thread
    Chat {
        /// User whose prompt history is extended
        #[arg(short, long, default_value = "cli")]
        user: String,

        /// User message
        prompt: String,

        /// System instruction placed before the message
        #[arg(long)]
        system: Option<String>,

        /// Image to attach; switches to the vision model
        #[arg(long)]
        image_url: Option<String>,
    },

    /// Generate an image
    Image {
        /// Image description
        #[arg(short, long)]
        prompt: String,

        /// Requested size, e.g. 256x256
        #[arg(short, long)]
        size: Option<String>,

        /// Image model override
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Transcribe an audio file
    Transcribe {
        /// Audio file to upload
        file: PathBuf,
    },

    /// Inspect or invoke the local tools
    Tools {
        /// Tool subcommand
        #[command(subcommand)]
        command: ToolsCommand,
    },
}

/// Tool subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ToolsCommand {
    /// Print every tool definition as JSON
    List,

    /// Invoke a tool locally and print its output
    Call {
        /// Tool name
        name: String,

        /// Arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            env: None,
            verbose: false,
            command: Commands::Tools {
                command: ToolsCommand::List,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert_eq!(cli.env, None);
        assert!(matches!(
            cli.command,
            Commands::Tools {
                command: ToolsCommand::List
            }
        ));
    }

    #[test]
    fn test_cli_parse_ask() {
        let cli = Cli::try_parse_from(["assistant-relay", "ask", "--user", "u42", "Who is in today?"])
            .unwrap();
        if let Commands::Ask { user, prompt } = cli.command {
            assert_eq!(user, "u42");
            assert_eq!(prompt, "Who is in today?");
        } else {
            panic!("Expected Ask command");
        }
    }

    #[test]
    fn test_cli_parse_ask_default_user() {
        let cli = Cli::try_parse_from(["assistant-relay", "ask", "hello"]).unwrap();
        if let Commands::Ask { user, .. } = cli.command {
            assert_eq!(user, "cli");
        } else {
            panic!("Expected Ask command");
        }
    }

    #[test]
    fn test_cli_parse_env_override() {
        let cli = Cli::try_parse_from(["assistant-relay", "--env", "production", "ask", "hi"])
            .unwrap();
        assert_eq!(cli.env, Some(AppEnv::Production));

        assert!(Cli::try_parse_from(["assistant-relay", "--env", "staging", "ask", "hi"]).is_err());
    }

    #[test]
    fn test_cli_parse_image() {
        let cli = Cli::try_parse_from([
            "assistant-relay",
            "image",
            "--prompt",
            "a cat",
            "--size",
            "512x512",
        ])
        .unwrap();
        if let Commands::Image {
            prompt,
            size,
            model,
        } = cli.command
        {
            assert_eq!(prompt, "a cat");
            assert_eq!(size, Some("512x512".to_string()));
            assert_eq!(model, None);
        } else {
            panic!("Expected Image command");
        }
    }

    #[test]
    fn test_cli_parse_chat_with_image() {
        let cli = Cli::try_parse_from([
            "assistant-relay",
            "chat",
            "What is in this picture?",
            "--image-url",
            "https://example.com/cat.png",
        ])
        .unwrap();
        if let Commands::Chat {
            user,
            prompt,
            system,
            image_url,
        } = cli.command
        {
            assert_eq!(user, "cli");
            assert_eq!(prompt, "What is in this picture?");
            assert_eq!(system, None);
            assert_eq!(image_url.as_deref(), Some("https://example.com/cat.png"));
        } else {
            panic!("Expected Chat command");
        }
    }

    #[test]
    fn test_cli_parse_transcribe() {
        let cli = Cli::try_parse_from(["assistant-relay", "transcribe", "voice.m4a"]).unwrap();
        if let Commands::Transcribe { file } = cli.command {
            assert_eq!(file, PathBuf::from("voice.m4a"));
        } else {
            panic!("Expected Transcribe command");
        }
    }

    #[test]
    fn test_cli_parse_tools_call() {
        let cli = Cli::try_parse_from([
            "assistant-relay",
            "tools",
            "call",
            "get_wfa_by_date_and_nickname",
            "--args",
            r#"{"dates":["10"]}"#,
        ])
        .unwrap();
        if let Commands::Tools {
            command: ToolsCommand::Call { name, args },
        } = cli.command
        {
            assert_eq!(name, "get_wfa_by_date_and_nickname");
            assert_eq!(args, r#"{"dates":["10"]}"#);
        } else {
            panic!("Expected tools call command");
        }
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["assistant-relay"]).is_err());
    }
}
