//! Scripted in-process assistant client for tests
//!
//! [`FakeAssistantClient`] replaces the HTTP client when exercising the run
//! driver and completion adapter. Tests script the sequence of run states
//! returned by successive polls and inspect every call the code under test
//! made, in order.
//!
//! # Example
//!
//! ```
//! use assistant_relay::providers::fake::{FakeAssistantClient, FakeCall};
//! use assistant_relay::providers::{AssistantClient, RunStatus};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let client = FakeAssistantClient::new().with_poll(RunStatus::Completed);
//! let thread = client.create_thread().await.unwrap();
//! let run = client.create_run(&thread.id, "asst_1").await.unwrap();
//! let polled = client.retrieve_run(&thread.id, &run.id).await.unwrap();
//!
//! assert_eq!(polled.status, RunStatus::Completed);
//! assert_eq!(client.calls()[0], FakeCall::CreateThread);
//! # }
//! ```

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{RelayError, Result};
use crate::providers::{
    AssistantClient, RequiredAction, Run, RunStatus, SubmitToolOutputs, Thread, ThreadMessage,
    ToolCall, ToolOutput, ACTION_SUBMIT_TOOL_OUTPUTS,
};

/// A call recorded by [`FakeAssistantClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    /// `create_thread`
    CreateThread,
    /// `create_message`
    CreateMessage {
        /// Target thread
        thread_id: String,
        /// Message text
        content: String,
    },
    /// `create_run`
    CreateRun {
        /// Target thread
        thread_id: String,
        /// Assistant the run was created for
        assistant_id: String,
    },
    /// `retrieve_run`
    RetrieveRun {
        /// Owning thread
        thread_id: String,
        /// Polled run
        run_id: String,
    },
    /// `submit_tool_outputs`
    SubmitToolOutputs {
        /// Owning thread
        thread_id: String,
        /// Target run
        run_id: String,
        /// Submitted outputs
        outputs: Vec<ToolOutput>,
    },
    /// `list_messages`
    ListMessages {
        /// Listed thread
        thread_id: String,
    },
}

#[derive(Debug, Default)]
struct FakeState {
    calls: Vec<FakeCall>,
    polls: VecDeque<(RunStatus, Option<RequiredAction>)>,
    messages: Vec<ThreadMessage>,
    threads_created: usize,
    runs_created: usize,
}

/// In-process assistant client driven by a script of poll results
///
/// Once the scripted polls are exhausted every further poll reports
/// `in_progress`, which lets tests exercise deadlines and cancellation.
#[derive(Debug)]
pub struct FakeAssistantClient {
    initial_status: RunStatus,
    state: Mutex<FakeState>,
}

impl Default for FakeAssistantClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeAssistantClient {
    /// Create a client whose runs start `queued` with an empty script
    pub fn new() -> Self {
        Self {
            initial_status: RunStatus::Queued,
            state: Mutex::new(FakeState::default()),
        }
    }

    /// Status reported by `create_run`
    pub fn with_initial_status(mut self, status: RunStatus) -> Self {
        self.initial_status = status;
        self
    }

    /// Append a poll result with the given status
    pub fn with_poll(self, status: RunStatus) -> Self {
        self.lock().polls.push_back((status, None));
        self
    }

    /// Append a `requires_action` poll carrying the given tool calls
    pub fn with_tool_calls(self, tool_calls: Vec<ToolCall>) -> Self {
        let action = RequiredAction {
            action_type: ACTION_SUBMIT_TOOL_OUTPUTS.to_string(),
            submit_tool_outputs: Some(SubmitToolOutputs { tool_calls }),
        };
        self.lock()
            .polls
            .push_back((RunStatus::RequiresAction, Some(action)));
        self
    }

    /// Append a `requires_action` poll with an arbitrary action
    pub fn with_required_action(self, action: RequiredAction) -> Self {
        self.lock()
            .polls
            .push_back((RunStatus::RequiresAction, Some(action)));
        self
    }

    /// Messages returned by `list_messages`, newest first
    pub fn with_messages(self, messages: Vec<ThreadMessage>) -> Self {
        self.lock().messages = messages;
        self
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<FakeCall> {
        self.lock().calls.clone()
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Number of `create_thread` calls
    pub fn threads_created(&self) -> usize {
        self.lock().threads_created
    }

    /// Every batch passed to `submit_tool_outputs`
    pub fn submissions(&self) -> Vec<Vec<ToolOutput>> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                FakeCall::SubmitToolOutputs { outputs, .. } => Some(outputs.clone()),
                _ => None,
            })
            .collect()
    }

    /// True when `list_messages` was called
    pub fn listed_messages(&self) -> bool {
        self.lock()
            .calls
            .iter()
            .any(|call| matches!(call, FakeCall::ListMessages { .. }))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        // A poisoned lock only happens after a test already panicked
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn run(
        thread_id: &str,
        run_id: &str,
        status: RunStatus,
        required_action: Option<RequiredAction>,
    ) -> Run {
        Run {
            id: run_id.to_string(),
            thread_id: thread_id.to_string(),
            status,
            required_action,
            last_error: None,
        }
    }
}

#[async_trait]
impl AssistantClient for FakeAssistantClient {
    async fn create_thread(&self) -> Result<Thread> {
        let mut state = self.lock();
        state.calls.push(FakeCall::CreateThread);
        state.threads_created += 1;
        Ok(Thread {
            id: format!("thread_{}", state.threads_created),
        })
    }

    async fn create_message(&self, thread_id: &str, content: &str) -> Result<ThreadMessage> {
        let mut state = self.lock();
        state.calls.push(FakeCall::CreateMessage {
            thread_id: thread_id.to_string(),
            content: content.to_string(),
        });
        Ok(ThreadMessage::user(
            format!("msg_user_{}", state.calls.len()),
            content,
        ))
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run> {
        let mut state = self.lock();
        state.calls.push(FakeCall::CreateRun {
            thread_id: thread_id.to_string(),
            assistant_id: assistant_id.to_string(),
        });
        state.runs_created += 1;
        let run_id = format!("run_{}", state.runs_created);
        Ok(Self::run(thread_id, &run_id, self.initial_status, None))
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let mut state = self.lock();
        state.calls.push(FakeCall::RetrieveRun {
            thread_id: thread_id.to_string(),
            run_id: run_id.to_string(),
        });
        let (status, action) = state
            .polls
            .pop_front()
            .unwrap_or((RunStatus::InProgress, None));
        Ok(Self::run(thread_id, run_id, status, action))
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<Run> {
        if outputs.is_empty() {
            return Err(RelayError::Service {
                status: 400,
                message: "tool_outputs must not be empty".to_string(),
            }
            .into());
        }
        let mut state = self.lock();
        state.calls.push(FakeCall::SubmitToolOutputs {
            thread_id: thread_id.to_string(),
            run_id: run_id.to_string(),
            outputs,
        });
        Ok(Self::run(thread_id, run_id, RunStatus::Queued, None))
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>> {
        let mut state = self.lock();
        state.calls.push(FakeCall::ListMessages {
            thread_id: thread_id.to_string(),
        });
        Ok(state.messages.clone())
    }
}
