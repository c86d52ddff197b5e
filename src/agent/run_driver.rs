//! Run orchestration state machine
//!
//! The driver posts a user message to a thread, starts a run, and polls it
//! until it reaches a terminal status:
//!
//! - `completed`: the newest assistant message is returned
//! - `incomplete`: [`RunOutcome::Incomplete`], messages are not listed
//! - `failed`, `cancelled`, `expired`: [`RelayError::RunFailed`]
//! - `requires_action`: pending tool calls are executed in delivered order
//!   and their outputs submitted as one batch before the next poll
//! - anything else: wait one poll interval and poll again
//!
//! Polling is bounded by a deadline and can be cancelled by the caller.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RunnerConfig;
use crate::error::{RelayError, Result};
use crate::providers::{
    AssistantClient, Run, RunStatus, ToolCall, ToolOutput, ACTION_SUBMIT_TOOL_OUTPUTS,
};
use crate::tools::ToolRegistry;

/// How a run ended when it did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The run completed; text of the newest assistant message
    Completed(String),
    /// The run stopped before the answer was finished
    Incomplete,
}

/// Drives assistant runs to a terminal state
pub struct RunDriver {
    client: Arc<dyn AssistantClient>,
    tools: Arc<ToolRegistry>,
    assistant_id: String,
    poll_interval: Duration,
    deadline: Duration,
}

impl RunDriver {
    /// Create a driver
    ///
    /// # Arguments
    ///
    /// * `client` - Remote assistant service
    /// * `tools` - Registry resolving the tools the assistant may call
    /// * `assistant_id` - Assistant every run is created for
    /// * `runner` - Poll interval and deadline
    pub fn new(
        client: Arc<dyn AssistantClient>,
        tools: Arc<ToolRegistry>,
        assistant_id: impl Into<String>,
        runner: &RunnerConfig,
    ) -> Self {
        Self {
            client,
            tools,
            assistant_id: assistant_id.into(),
            poll_interval: runner.poll_interval(),
            deadline: runner.deadline(),
        }
    }

    /// Post `message` to `thread_id` and drive a new run to completion
    ///
    /// # Errors
    ///
    /// - `RelayError::Service` if a remote call fails
    /// - `RelayError::RunFailed` if the run ends failed, cancelled or expired
    /// - `RelayError::UnknownTool` / `RelayError::ToolArguments` if a tool
    ///   call cannot be dispatched; nothing is submitted for that batch
    /// - `RelayError::UnsupportedAction` for required actions other than
    ///   tool output submission
    /// - `RelayError::RunTimeout` when the deadline passes first
    /// - `RelayError::Cancelled` when `cancel` fires first
    pub async fn execute(
        &self,
        thread_id: &str,
        message: &str,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome> {
        if cancel.is_cancelled() {
            return Err(RelayError::Cancelled(format!("on thread {}", thread_id)).into());
        }

        self.client.create_message(thread_id, message).await?;
        let run = self
            .client
            .create_run(thread_id, &self.assistant_id)
            .await?;
        info!(
            "Created run {} on thread {} (status {})",
            run.id, thread_id, run.status
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Run {} cancelled by caller", run.id);
                Err(RelayError::Cancelled(run.id.clone()).into())
            }
            _ = tokio::time::sleep(self.deadline) => {
                warn!("Run {} exceeded deadline of {:?}", run.id, self.deadline);
                Err(RelayError::RunTimeout {
                    run_id: run.id.clone(),
                    seconds: self.deadline.as_secs(),
                }
                .into())
            }
            outcome = self.poll_until_terminal(thread_id, &run.id) => outcome,
        }
    }

    async fn poll_until_terminal(&self, thread_id: &str, run_id: &str) -> Result<RunOutcome> {
        let mut polls: u32 = 0;

        loop {
            polls += 1;
            let run = self.client.retrieve_run(thread_id, run_id).await?;
            debug!("Run {} poll {}: {}", run_id, polls, run.status);

            match run.status {
                RunStatus::Completed => {
                    let text = self.latest_assistant_text(thread_id).await?;
                    info!("Run {} completed after {} polls", run_id, polls);
                    return Ok(RunOutcome::Completed(text));
                }
                RunStatus::Incomplete => {
                    info!("Run {} incomplete after {} polls", run_id, polls);
                    return Ok(RunOutcome::Incomplete);
                }
                RunStatus::Failed | RunStatus::Cancelled | RunStatus::Expired => {
                    let message = run
                        .last_error
                        .as_ref()
                        .map(|e| e.message.clone())
                        .unwrap_or_default();
                    warn!("Run {} ended with status {}: {}", run_id, run.status, message);
                    return Err(RelayError::RunFailed {
                        run_id: run_id.to_string(),
                        status: run.status.to_string(),
                        message,
                    }
                    .into());
                }
                RunStatus::RequiresAction => {
                    self.handle_required_action(thread_id, &run).await?;
                }
                _ => {}
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn handle_required_action(&self, thread_id: &str, run: &Run) -> Result<()> {
        let action = run.required_action.as_ref().ok_or_else(|| {
            RelayError::Provider(format!(
                "Run {} requires action but carries no action payload",
                run.id
            ))
        })?;

        if action.action_type != ACTION_SUBMIT_TOOL_OUTPUTS {
            return Err(RelayError::UnsupportedAction(action.action_type.clone()).into());
        }

        let calls = action
            .submit_tool_outputs
            .as_ref()
            .map(|s| s.tool_calls.as_slice())
            .unwrap_or_default();
        if calls.is_empty() {
            return Err(RelayError::Provider(format!(
                "Run {} requires tool outputs but lists no tool calls",
                run.id
            ))
            .into());
        }

        let outputs = self.dispatch_tool_calls(calls).await?;
        self.client
            .submit_tool_outputs(thread_id, &run.id, outputs)
            .await?;
        info!("Submitted {} tool outputs for run {}", calls.len(), run.id);
        Ok(())
    }

    /// Execute tool calls sequentially, in order, pairing outputs by call id
    ///
    /// # Errors
    ///
    /// Fails on the first call that names an unknown tool, carries
    /// undecodable arguments, or whose tool returns an error
    pub async fn dispatch_tool_calls(&self, calls: &[ToolCall]) -> Result<Vec<ToolOutput>> {
        let mut outputs = Vec::with_capacity(calls.len());

        for call in calls {
            let name = &call.function.name;
            let tool = self.tools.resolve(name)?;
            let args = decode_arguments(call)?;
            debug!("Executing tool {} ({})", name, call.id);

            let value = tool.execute(args).await?;
            outputs.push(ToolOutput {
                tool_call_id: call.id.clone(),
                output: serialize_output(value)?,
            });
        }

        Ok(outputs)
    }

    async fn latest_assistant_text(&self, thread_id: &str) -> Result<String> {
        let messages = self.client.list_messages(thread_id).await?;
        Ok(messages
            .iter()
            .find(|m| m.is_assistant())
            .map(|m| m.text())
            .unwrap_or_default())
    }
}

/// Arguments arrive as a JSON string; an empty string means no arguments
fn decode_arguments(call: &ToolCall) -> Result<serde_json::Value> {
    let raw = call.function.arguments.trim();
    if raw.is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_str(raw).map_err(|e| {
        RelayError::ToolArguments {
            tool: call.function.name.clone(),
            message: e.to_string(),
        }
        .into()
    })
}

/// Strings are submitted as-is, everything else as JSON text
fn serialize_output(value: serde_json::Value) -> Result<String> {
    match value {
        serde_json::Value::String(s) => Ok(s),
        other => Ok(serde_json::to_string(&other)?),
    }
}
