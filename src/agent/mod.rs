//! Agent module for the assistant relay
//!
//! This module contains the per-user conversation and prompt stores, the
//! run orchestration state machine, and the completion operation built on
//! top of them.

pub mod completion;
pub mod conversation;
pub mod prompt;
pub mod run_driver;

pub use completion::{Completion, CompletionAdapter, MOCK_TEXT_OK};
pub use conversation::{ConversationStore, ThreadId};
pub use prompt::{Prompt, PromptStore};
pub use run_driver::{RunDriver, RunOutcome};
