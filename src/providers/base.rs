//! Assistant service trait and wire types
//!
//! This module defines the [`AssistantClient`] trait the run driver talks to,
//! along with the thread, run, and message types exchanged with the remote
//! assistant service.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Remote conversation thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    /// Identifier issued by the service
    pub id: String,
}

/// Lifecycle status of a run
///
/// Statuses the relay does not know about deserialize to `Unknown` so the
/// driver can keep polling instead of failing to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Waiting to be picked up
    Queued,
    /// The assistant is working
    InProgress,
    /// The run is blocked on local tool outputs
    RequiresAction,
    /// Cancellation has been requested
    Cancelling,
    /// The run was cancelled
    Cancelled,
    /// The run failed
    Failed,
    /// The run finished normally
    Completed,
    /// The run stopped early (token limits)
    Incomplete,
    /// The run expired before finishing
    Expired,
    /// A status this client does not recognise
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Returns true once no further progress can occur
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed
                | RunStatus::Incomplete
                | RunStatus::Failed
                | RunStatus::Cancelled
                | RunStatus::Expired
        )
    }

    /// Wire name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Expired => "expired",
            RunStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One assistant invocation against a thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    /// Run identifier
    pub id: String,
    /// Owning thread
    pub thread_id: String,
    /// Current status
    pub status: RunStatus,
    /// Present when `status` is `requires_action`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_action: Option<RequiredAction>,
    /// Error reported for failed runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<RunError>,
}

/// Error details attached to a failed run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunError {
    /// Machine-readable code
    #[serde(default)]
    pub code: String,
    /// Human-readable message
    #[serde(default)]
    pub message: String,
}

/// Action type asking the client to run tools and submit their outputs
pub const ACTION_SUBMIT_TOOL_OUTPUTS: &str = "submit_tool_outputs";

/// Action the service needs from the client before the run can continue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequiredAction {
    /// Action type, normally `submit_tool_outputs`
    #[serde(rename = "type")]
    pub action_type: String,
    /// Pending tool calls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit_tool_outputs: Option<SubmitToolOutputs>,
}

/// Tool calls awaiting outputs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitToolOutputs {
    /// Calls in the order the service delivered them
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

/// Function call information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the function/tool to call
    pub name: String,
    /// Arguments for the function (as JSON string)
    #[serde(default)]
    pub arguments: String,
}

/// Tool call structure
///
/// Represents a request from the assistant to execute a tool with specific
/// arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call
    pub id: String,
    /// Function call details
    pub function: FunctionCall,
}

impl ToolCall {
    /// Create a tool call
    ///
    /// # Examples
    ///
    /// ```
    /// use assistant_relay::providers::ToolCall;
    ///
    /// let call = ToolCall::new("call_1", "get_current_date", "{}");
    /// assert_eq!(call.function.name, "get_current_date");
    /// ```
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// Output for one tool call, submitted back to the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// The call this output answers
    pub tool_call_id: String,
    /// Serialized tool result
    pub output: String,
}

/// A message stored in a thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadMessage {
    /// Message identifier
    pub id: String,
    /// Author role (`user` or `assistant`)
    pub role: String,
    /// Content parts
    #[serde(default)]
    pub content: Vec<MessageContent>,
}

impl ThreadMessage {
    /// Build an assistant message with a single text part
    pub fn assistant(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: "assistant".to_string(),
            content: vec![MessageContent::Text {
                text: MessageText {
                    value: text.into(),
                },
            }],
        }
    }

    /// Build a user message with a single text part
    pub fn user(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            ..Self::assistant(id, text)
        }
    }

    /// True when the assistant authored this message
    pub fn is_assistant(&self) -> bool {
        self.role == "assistant"
    }

    /// Text parts joined with a space
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| match part {
                MessageContent::Text { text } => Some(text.value.as_str()),
                MessageContent::Other => None,
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A content part of a thread message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    /// Plain text
    Text {
        /// Text payload
        text: MessageText,
    },
    /// Images, file references and anything else
    #[serde(other)]
    Other,
}

/// Text payload of a message part
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageText {
    /// The text
    pub value: String,
}

/// Client-facing operations of the remote assistant service
///
/// Implementations must surface non-success responses as
/// [`crate::error::RelayError::Service`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssistantClient: Send + Sync {
    /// Create an empty thread
    async fn create_thread(&self) -> Result<Thread>;

    /// Append a user message to a thread
    async fn create_message(&self, thread_id: &str, content: &str) -> Result<ThreadMessage>;

    /// Start a run of `assistant_id` against a thread
    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run>;

    /// Read the current state of a run
    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;

    /// Submit the outputs for every pending tool call of a run in one request
    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<Run>;

    /// List the messages of a thread, newest first
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>>;
}
