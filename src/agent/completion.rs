//! Outward-facing completion operation
//!
//! [`CompletionAdapter::generate`] resolves the user's thread, drives a run
//! through [`RunDriver`], and wraps the result in a [`Completion`].

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::agent::conversation::ConversationStore;
use crate::agent::run_driver::{RunDriver, RunOutcome};
use crate::config::{AppEnv, Config};
use crate::error::{RelayError, Result};
use crate::locales::{t, Key, Lang};
use crate::providers::{AssistantClient, FinishReason};
use crate::tools::ToolRegistry;

/// Reply returned outside production without contacting the service
pub const MOCK_TEXT_OK: &str = "OK";

/// Final answer for one prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Answer text, trimmed; may be empty
    pub text: String,
    /// `Stop` for a finished answer, `Length` when the run stopped early
    pub finish_reason: FinishReason,
}

impl Completion {
    /// True if the answer is complete
    pub fn is_finish_reason_stop(&self) -> bool {
        self.finish_reason == FinishReason::Stop
    }

    /// Length of the answer in characters
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Turns prompts into completions through the assistant service
pub struct CompletionAdapter {
    env: AppEnv,
    lang: Lang,
    client: Arc<dyn AssistantClient>,
    store: Arc<ConversationStore>,
    driver: RunDriver,
}

impl CompletionAdapter {
    /// Create an adapter from its parts
    pub fn new(
        env: AppEnv,
        lang: Lang,
        client: Arc<dyn AssistantClient>,
        store: Arc<ConversationStore>,
        driver: RunDriver,
    ) -> Self {
        Self {
            env,
            lang,
            client,
            store,
            driver,
        }
    }

    /// Create an adapter wired from configuration
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Config` if production mode has no assistant id
    pub fn from_config(
        config: &Config,
        client: Arc<dyn AssistantClient>,
        tools: Arc<ToolRegistry>,
        store: Arc<ConversationStore>,
    ) -> Result<Self> {
        let assistant_id = match (&config.openai.assistant_id, config.app.env) {
            (Some(id), _) => id.clone(),
            (None, AppEnv::Production) => {
                return Err(RelayError::Config(
                    "openai.assistant_id is required in production".to_string(),
                )
                .into())
            }
            (None, AppEnv::Development) => String::new(),
        };
        let driver = RunDriver::new(Arc::clone(&client), tools, assistant_id, &config.runner);
        Ok(Self::new(
            config.app.env,
            config.app.lang,
            client,
            store,
            driver,
        ))
    }

    /// Answer `prompt` in the conversation of `user_id`
    ///
    /// # Errors
    ///
    /// Propagates thread creation and [`RunDriver::execute`] errors
    pub async fn generate(&self, prompt: &str, user_id: &str) -> Result<Completion> {
        self.generate_with_cancel(prompt, user_id, &CancellationToken::new())
            .await
    }

    /// Like [`CompletionAdapter::generate`], stopping early when `cancel` fires
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Cancelled` once `cancel` fires, plus everything
    /// [`CompletionAdapter::generate`] may return
    pub async fn generate_with_cancel(
        &self,
        prompt: &str,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Completion> {
        if !self.env.is_production() {
            debug!("Non-production mode, returning canned reply");
            return Ok(Completion {
                text: MOCK_TEXT_OK.to_string(),
                finish_reason: FinishReason::Stop,
            });
        }

        let _guard = self.store.lock_user(user_id).await;
        let thread_id = self
            .store
            .get_or_create_thread(user_id, self.client.as_ref())
            .await?;

        let completion = match self.driver.execute(&thread_id, prompt, cancel).await? {
            RunOutcome::Completed(text) => Completion {
                text: text.trim().to_string(),
                finish_reason: FinishReason::Stop,
            },
            RunOutcome::Incomplete => Completion {
                text: t(self.lang, Key::AnswerTooLong).to_string(),
                finish_reason: FinishReason::Length,
            },
        };
        info!(
            "Completion for user {} on thread {}: {:?}, {} chars",
            user_id,
            thread_id,
            completion.finish_reason,
            completion.char_count()
        );
        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunnerConfig;
    use crate::providers::fake::{FakeAssistantClient, FakeCall};
    use crate::providers::{MockAssistantClient, RunStatus, ThreadMessage, ToolCall};
    use crate::tools::{Roster, ToolRegistryBuilder};

    fn tools() -> Arc<ToolRegistry> {
        let roster = Roster::from_yaml_str(
            "version: 1\nmembers:\n  - nickname: Achi\n    wfa: [\"10\"]\n",
        )
        .unwrap();
        Arc::new(ToolRegistryBuilder::new(Arc::new(roster)).build().unwrap())
    }

    fn adapter(env: AppEnv, client: Arc<dyn AssistantClient>) -> CompletionAdapter {
        let driver = RunDriver::new(
            Arc::clone(&client),
            tools(),
            "asst_1",
            &RunnerConfig::default(),
        );
        CompletionAdapter::new(
            env,
            Lang::En,
            client,
            Arc::new(ConversationStore::new()),
            driver,
        )
    }

    #[tokio::test]
    async fn test_non_production_returns_canned_text_without_remote_calls() {
        let mut mock = MockAssistantClient::new();
        mock.expect_create_thread().times(0);
        mock.expect_create_message().times(0);
        mock.expect_create_run().times(0);
        mock.expect_retrieve_run().times(0);
        mock.expect_submit_tool_outputs().times(0);
        mock.expect_list_messages().times(0);

        let completion = adapter(AppEnv::Development, Arc::new(mock))
            .generate("hello", "u1")
            .await
            .unwrap();

        assert_eq!(completion.text, MOCK_TEXT_OK);
        assert!(completion.is_finish_reason_stop());
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_text_is_trimmed() {
        let client = Arc::new(
            FakeAssistantClient::new()
                .with_poll(RunStatus::Completed)
                .with_messages(vec![ThreadMessage::assistant("m", "  \n Hello there \n")]),
        );
        let completion = adapter(AppEnv::Production, client)
            .generate("hi", "u1")
            .await
            .unwrap();

        assert_eq!(completion.text, "Hello there");
        assert_eq!(completion.finish_reason, FinishReason::Stop);
    }

    #[tokio::test(start_paused = true)]
    async fn test_incomplete_returns_sentinel_with_length() {
        let client = Arc::new(FakeAssistantClient::new().with_poll(RunStatus::Incomplete));
        let completion = adapter(AppEnv::Production, Arc::clone(&client) as Arc<dyn AssistantClient>)
            .generate("tell me everything", "u1")
            .await
            .unwrap();

        assert_eq!(completion.text, t(Lang::En, Key::AnswerTooLong));
        assert_eq!(completion.finish_reason, FinishReason::Length);
        assert!(!completion.is_finish_reason_stop());
        assert!(!client.listed_messages());
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_user_reuses_thread_across_requests() {
        let client = Arc::new(
            FakeAssistantClient::new()
                .with_poll(RunStatus::Completed)
                .with_poll(RunStatus::Completed)
                .with_messages(vec![ThreadMessage::assistant("m", "ok")]),
        );
        let adapter = adapter(AppEnv::Production, Arc::clone(&client) as Arc<dyn AssistantClient>);

        adapter.generate("first", "u1").await.unwrap();
        adapter.generate("second", "u1").await.unwrap();

        assert_eq!(client.threads_created(), 1);
        let threads: Vec<String> = client
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                FakeCall::CreateRun { thread_id, .. } => Some(thread_id),
                _ => None,
            })
            .collect();
        assert_eq!(threads, vec!["thread_1".to_string(), "thread_1".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tool_round_trip_then_answer() {
        let client = Arc::new(
            FakeAssistantClient::new()
                .with_tool_calls(vec![ToolCall::new(
                    "call_1",
                    "get_wfa_by_date_and_nickname",
                    r#"{"dates":["10"],"nicknames":["Achi"]}"#,
                )])
                .with_poll(RunStatus::InProgress)
                .with_poll(RunStatus::Completed)
                .with_messages(vec![ThreadMessage::assistant("m", "Achi is remote on the 10th.")]),
        );
        let completion = adapter(AppEnv::Production, Arc::clone(&client) as Arc<dyn AssistantClient>)
            .generate("Is Achi remote on the 10th?", "u1")
            .await
            .unwrap();

        assert_eq!(completion.text, "Achi is remote on the 10th.");
        assert_eq!(client.submissions().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_run_propagates_error() {
        let client = Arc::new(FakeAssistantClient::new().with_poll(RunStatus::Failed));
        let err = adapter(AppEnv::Production, client)
            .generate("hi", "u1")
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RelayError>(),
            Some(RelayError::RunFailed { .. })
        ));
    }

    #[test]
    fn test_char_count_counts_characters_not_bytes() {
        let completion = Completion {
            text: t(Lang::Th, Key::AnswerTooLong).to_string(),
            finish_reason: FinishReason::Length,
        };
        assert!(completion.char_count() < completion.text.len());
        assert_eq!(completion.char_count(), completion.text.chars().count());

        let ascii = Completion {
            text: "OK".to_string(),
            finish_reason: FinishReason::Stop,
        };
        assert_eq!(ascii.char_count(), 2);
    }

    #[test]
    fn test_from_config_requires_assistant_id_in_production() {
        let mut config = Config::default();
        config.app.env = AppEnv::Production;
        let client: Arc<dyn AssistantClient> = Arc::new(FakeAssistantClient::new());
        let store = Arc::new(ConversationStore::new());

        let missing_id =
            CompletionAdapter::from_config(&config, Arc::clone(&client), tools(), Arc::clone(&store));
        assert!(missing_id.is_err());

        config.openai.assistant_id = Some("asst_1".to_string());
        assert!(CompletionAdapter::from_config(&config, client, tools(), store).is_ok());
    }
}
