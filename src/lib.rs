//! Assistant relay - conversational backend for a hosted assistant
//!
//! This library relays user messages to an OpenAI-compatible Assistants
//! service, drives each run to a terminal state, answers the assistant's tool
//! calls from local roster data, and returns the final reply.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `agent`: Conversation store, run driver state machine, and completion adapter
//! - `providers`: Assistant service abstraction, HTTP client, and media endpoints
//! - `tools`: Date and roster lookup tools and the tool registry
//! - `config`: Configuration management and validation
//! - `locales`: User-facing strings per language
//! - `error`: Error types and result aliases
//! - `cli` / `commands`: Command-line interface and handlers
//!
//! # Example
//!
//! ```no_run
//! use assistant_relay::agent::{CompletionAdapter, ConversationStore};
//! use assistant_relay::{providers, tools, Config};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let registry = Arc::new(tools::build_registry(&config.tools, config.app.lang)?);
//!     let client = providers::create_client(&config.openai)?;
//!     let store = Arc::new(ConversationStore::new());
//!     let adapter = CompletionAdapter::from_config(&config, client, registry, store)?;
//!
//!     let completion = adapter.generate("Who works from home on the 10th?", "user-1").await?;
//!     println!("{}", completion.text);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod locales;
pub mod providers;
pub mod tools;

// Re-export commonly used types
pub use agent::{Completion, CompletionAdapter, ConversationStore, RunDriver, RunOutcome};
pub use config::Config;
pub use error::{RelayError, Result};
