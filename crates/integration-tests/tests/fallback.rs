mod harness;

use axon_config::MessageFormat;
use axon_llm::{ConversationTurn, ErrorKind, MessageOptions, StreamEvent, UsageSummary};
use axum::http::StatusCode;
use futures_util::StreamExt;
use harness::config::ConfigBuilder;
use harness::mock_llm::{MockLlm, Script};

async fn events_for(mock: &MockLlm) -> Vec<StreamEvent> {
    ConfigBuilder::new(&mock.base_url())
        .handler()
        .create_message("S", &[ConversationTurn::user("hi")], &MessageOptions::default())
        .collect()
        .await
}

#[tokio::test]
async fn unframed_document_is_recovered() {
    let body = r#"{"choices":[{"message":{"content":"hi"}}],"usage":{"prompt_tokens":5,"completion_tokens":2}}"#;
    let mock = MockLlm::start(Script::split(body, 16)).await.unwrap();

    let events = events_for(&mock).await;
    assert_eq!(
        events,
        [
            StreamEvent::content("hi"),
            StreamEvent::Usage(UsageSummary {
                input_tokens: 5,
                output_tokens: 2,
                ..UsageSummary::default()
            }),
            StreamEvent::Done,
        ]
    );
}

#[tokio::test]
async fn pretty_printed_document_is_recovered() {
    let body = "{\n  \"message\": {\n    \"role\": \"assistant\",\n    \"content\": \"from ollama\"\n  }\n}\n";
    let mock = MockLlm::start(Script::body(body)).await.unwrap();

    let events = events_for(&mock).await;
    assert_eq!(events, [StreamEvent::content("from ollama"), StreamEvent::Done]);
}

#[tokio::test]
async fn error_document_is_protocol_error() {
    let mock = MockLlm::start(Script::body(r#"{"error":{"message":"bad key"}}"#)).await.unwrap();

    let events = events_for(&mock).await;
    assert_eq!(events, [StreamEvent::error(ErrorKind::Protocol, "bad key")]);
}

#[tokio::test]
async fn error_status_is_protocol_error() {
    let mock = MockLlm::start(Script::status(
        StatusCode::TOO_MANY_REQUESTS,
        r#"{"error":{"message":"slow down","type":"rate_limit"}}"#,
    ))
    .await
    .unwrap();

    let events = events_for(&mock).await;
    assert_eq!(events, [StreamEvent::error(ErrorKind::Protocol, "HTTP 429: slow down")]);
}

#[tokio::test]
async fn error_status_with_partial_stream_shows_no_content() {
    let body = "data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}\n";
    let mock = MockLlm::start(Script::status(StatusCode::BAD_GATEWAY, body)).await.unwrap();

    let events = events_for(&mock).await;
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], StreamEvent::Error { kind: ErrorKind::Protocol, .. }));
}

#[tokio::test]
async fn html_body_is_no_content() {
    let mock = MockLlm::start(Script::body("<html><body>502 Bad Gateway</body></html>")).await.unwrap();

    let events = events_for(&mock).await;
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], StreamEvent::Error { kind: ErrorKind::NoContent, .. }));
}

#[tokio::test]
async fn reasoner_is_asked_not_to_stream() {
    let body = r#"{"choices":[{"message":{"content":"thought"}}]}"#;
    let mock = MockLlm::start(Script::body(body)).await.unwrap();

    let handler = ConfigBuilder::new(&mock.base_url()).with_model("deepseek-reasoner").handler();
    let history = [
        ConversationTurn::user("a"),
        ConversationTurn::user("b"),
        ConversationTurn::assistant("c"),
        ConversationTurn::user("d"),
    ];
    let events: Vec<_> = handler
        .create_message("S", &history, &MessageOptions::default())
        .collect()
        .await;
    assert_eq!(events, [StreamEvent::content("thought"), StreamEvent::Done]);

    let request = &mock.requests()[0];
    assert_eq!(request["stream"], false);
    assert_eq!(
        request["messages"],
        serde_json::json!([
            {"role": "user", "content": "S\na\nb"},
            {"role": "assistant", "content": "c"},
            {"role": "user", "content": "d"}
        ])
    );
}

#[tokio::test]
async fn explicit_format_and_stream_overrides() {
    let mock = MockLlm::start(Script::body("data: {\"choices\":[{\"text\":\"ok\"}]}\n")).await.unwrap();

    let handler = ConfigBuilder::new(&mock.base_url())
        .with_model("deepseek-reasoner")
        .with_format(MessageFormat::Developer)
        .with_stream(true)
        .handler();
    let events: Vec<_> = handler
        .create_message("S", &[ConversationTurn::user("q")], &MessageOptions::default())
        .collect()
        .await;
    assert_eq!(events, [StreamEvent::content("ok"), StreamEvent::Done]);

    let request = &mock.requests()[0];
    assert_eq!(request["stream"], true);
    assert_eq!(request["messages"][0]["role"], "developer");
}
