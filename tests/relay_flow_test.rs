//! End-to-end completion flow against a mock Assistants service

use std::sync::Arc;

use chrono::{FixedOffset, TimeZone};
use serde_json::json;

use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use assistant_relay::agent::{CompletionAdapter, ConversationStore, RunDriver};
use assistant_relay::config::{AppEnv, OpenAiConfig, RunnerConfig};
use assistant_relay::locales::{t, Key, Lang};
use assistant_relay::providers::{AssistantClient, FinishReason, OpenAiClient};
use assistant_relay::tools::{FixedClock, Roster, ToolRegistryBuilder};

const ROSTER: &str = r#"
version: 1
period: 2024-06
members:
  - nickname: Achi
    wfa: ["3", "10", "17"]
  - nickname: Bank
    wfa: ["10"]
"#;

fn adapter_for(server: &MockServer) -> CompletionAdapter {
    let client: Arc<dyn AssistantClient> = Arc::new(
        OpenAiClient::new(OpenAiConfig {
            api_key: Some("sk-test".to_string()),
            base_url: server.uri(),
            ..Default::default()
        })
        .unwrap(),
    );

    let tz = FixedOffset::east_opt(7 * 3600).unwrap();
    let clock = FixedClock(tz.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap());
    let roster = Roster::from_yaml_str(ROSTER).unwrap();
    let tools = Arc::new(
        ToolRegistryBuilder::new(Arc::new(roster))
            .with_clock(Arc::new(clock))
            .build()
            .unwrap(),
    );

    let runner = RunnerConfig {
        poll_interval_ms: 10,
        deadline_seconds: 10,
    };
    let driver = RunDriver::new(Arc::clone(&client), tools, "asst_1", &runner);
    CompletionAdapter::new(
        AppEnv::Production,
        Lang::En,
        client,
        Arc::new(ConversationStore::new()),
        driver,
    )
}

fn run_body(status: &str) -> serde_json::Value {
    json!({ "id": "run_1", "thread_id": "thread_1", "status": status })
}

async fn mount_thread_message_run(server: &MockServer, threads: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/threads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "thread_1" })))
        .expect(threads)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/threads/thread_1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_user",
            "role": "user",
            "content": []
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/threads/thread_1/runs"))
        .and(body_partial_json(json!({ "assistant_id": "asst_1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body("queued")))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_tool_call_round_trip_then_answer() {
    let server = MockServer::start().await;
    mount_thread_message_run(&server, 1).await;

    // First poll asks for two tool outputs
    Mock::given(method("GET"))
        .and(path("/v1/threads/thread_1/runs/run_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "run_1",
            "thread_id": "thread_1",
            "status": "requires_action",
            "required_action": {
                "type": "submit_tool_outputs",
                "submit_tool_outputs": {
                    "tool_calls": [
                        {
                            "id": "call_date",
                            "type": "function",
                            "function": { "name": "get_current_date", "arguments": "{}" }
                        },
                        {
                            "id": "call_wfa",
                            "type": "function",
                            "function": {
                                "name": "get_wfa_by_date_and_nickname",
                                "arguments": "{\"dates\":[\"10\"],\"nicknames\":[\"Achi\"]}"
                            }
                        }
                    ]
                }
            }
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    // Later polls report completion
    Mock::given(method("GET"))
        .and(path("/v1/threads/thread_1/runs/run_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body("completed")))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/threads/thread_1/runs/run_1/submit_tool_outputs"))
        .and(body_partial_json(json!({
            "tool_outputs": [
                { "tool_call_id": "call_date" },
                {
                    "tool_call_id": "call_wfa",
                    "output": "[{\"nickname\":\"Achi\",\"dates\":[\"10\"]}]"
                }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body("queued")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/threads/thread_1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": "msg_answer",
                "role": "assistant",
                "content": [{ "type": "text", "text": { "value": "  Achi works from home today.\n" } }]
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let completion = adapter_for(&server)
        .generate("Is Achi working from home today?", "user-1")
        .await
        .unwrap();

    assert_eq!(completion.text, "Achi works from home today.");
    assert_eq!(completion.finish_reason, FinishReason::Stop);
}

#[tokio::test]
async fn test_incomplete_run_returns_sentinel_without_listing_messages() {
    let server = MockServer::start().await;
    mount_thread_message_run(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/v1/threads/thread_1/runs/run_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body("incomplete")))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/threads/thread_1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let completion = adapter_for(&server)
        .generate("Explain everything", "user-1")
        .await
        .unwrap();

    assert_eq!(completion.text, t(Lang::En, Key::AnswerTooLong));
    assert_eq!(completion.finish_reason, FinishReason::Length);
}

#[tokio::test]
async fn test_unknown_tool_submits_nothing() {
    let server = MockServer::start().await;
    mount_thread_message_run(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/v1/threads/thread_1/runs/run_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "run_1",
            "thread_id": "thread_1",
            "status": "requires_action",
            "required_action": {
                "type": "submit_tool_outputs",
                "submit_tool_outputs": {
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": { "name": "order_pizza", "arguments": "{}" }
                    }]
                }
            }
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/threads/thread_1/runs/run_1/submit_tool_outputs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body("queued")))
        .expect(0)
        .mount(&server)
        .await;

    let err = adapter_for(&server)
        .generate("Order lunch", "user-1")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("order_pizza"));
}

#[tokio::test]
async fn test_thread_is_reused_for_the_same_user() {
    let server = MockServer::start().await;
    mount_thread_message_run(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/v1/threads/thread_1/runs/run_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body("completed")))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/threads/thread_1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": "msg_answer",
                "role": "assistant",
                "content": [{ "type": "text", "text": { "value": "Sure." } }]
            }]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    adapter.generate("first", "user-1").await.unwrap();
    adapter.generate("second", "user-1").await.unwrap();
}

#[tokio::test]
async fn test_failed_run_surfaces_last_error() {
    let server = MockServer::start().await;
    mount_thread_message_run(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/v1/threads/thread_1/runs/run_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "run_1",
            "thread_id": "thread_1",
            "status": "failed",
            "last_error": { "code": "rate_limit_exceeded", "message": "Rate limit reached" }
        })))
        .mount(&server)
        .await;

    let err = adapter_for(&server)
        .generate("hi", "user-1")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Rate limit reached"));
}

#[tokio::test]
async fn test_chat_sends_stored_history_on_the_next_turn() {
    use assistant_relay::agent::PromptStore;
    use assistant_relay::commands::media::run_chat;
    use assistant_relay::config::Config;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": " Pong " },
                "finish_reason": "stop"
            }]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let mut config = Config::default();
    config.openai.api_key = Some("sk-test".to_string());
    config.openai.base_url = server.uri();

    let prompts = PromptStore::new();
    run_chat(&config, &prompts, "user-1", "Ping", Some("be brief"), None)
        .await
        .unwrap();
    run_chat(&config, &prompts, "user-1", "Again", None, None)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let second: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
    assert_eq!(
        second["messages"],
        json!([
            { "role": "system", "content": "be brief" },
            { "role": "user", "content": "Ping" },
            { "role": "assistant", "content": "Pong" },
            { "role": "user", "content": "Again" }
        ])
    );
    assert_eq!(prompts.get_prompt("user-1").await.len(), 5);
}
