mod harness;

use std::time::Duration;

use axon_llm::{ConversationTurn, ErrorKind, LlmError, MessageOptions, StreamEvent};
use bytes::Bytes;
use futures_util::StreamExt;
use harness::config::ConfigBuilder;
use harness::mock_llm::{MockLlm, Script};

const FIRST: &str = "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n";

#[tokio::test]
async fn refused_connection_is_transport_error() {
    let handler = ConfigBuilder::new("http://127.0.0.1:1/v1").handler();

    let events: Vec<_> = handler
        .create_message("", &[ConversationTurn::user("hi")], &MessageOptions::default())
        .collect()
        .await;

    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], StreamEvent::Error { kind: ErrorKind::Transport, .. }));
}

#[tokio::test]
async fn timeout_mid_body_keeps_earlier_content() {
    let mock = MockLlm::start(Script::timed(&[(0, FIRST), (2_000, "data: [DONE]\n")]))
        .await
        .unwrap();
    let handler = ConfigBuilder::new(&mock.base_url()).with_timeout_ms(300).handler();

    let events: Vec<_> = handler
        .create_message("", &[ConversationTurn::user("hi")], &MessageOptions::default())
        .collect()
        .await;

    assert_eq!(events.len(), 2, "{events:?}");
    assert_eq!(events[0], StreamEvent::content("a"));
    assert!(matches!(events[1], StreamEvent::Error { kind: ErrorKind::Transport, .. }));
}

#[tokio::test]
async fn timeout_on_silent_body() {
    let mock = MockLlm::start(Script::open_ended(&[])).await.unwrap();
    let handler = ConfigBuilder::new(&mock.base_url()).with_timeout_ms(200).handler();

    // headers arrive immediately; the empty open body then runs out the clock
    let events: Vec<_> = handler
        .create_message("", &[ConversationTurn::user("hi")], &MessageOptions::default())
        .collect()
        .await;

    assert_eq!(events.len(), 1, "{events:?}");
    assert!(matches!(events[0], StreamEvent::Error { kind: ErrorKind::Transport, .. }));
}

#[tokio::test]
async fn abandoning_the_stream_closes_the_connection() {
    let mock = MockLlm::start(Script::open_ended(&[FIRST])).await.unwrap();
    let handler = ConfigBuilder::new(&mock.base_url()).handler();

    let mut events = handler.create_message("", &[ConversationTurn::user("hi")], &MessageOptions::default());
    assert_eq!(events.next().await, Some(StreamEvent::content("a")));

    let sender = mock.open_sender().expect("body is open");
    drop(events);

    // once the client hangs up, the server drops the body and the channel closes
    let closed = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let chunk = Bytes::from_static(b"data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n");
            if sender.send(chunk).await.is_err() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;

    assert!(closed.is_ok(), "server kept writing to an abandoned connection");
}

#[tokio::test]
async fn complete_prompt_error_names_provider() {
    let mock = MockLlm::start(Script::body(r#"{"error":{"message":"bad key"}}"#)).await.unwrap();
    let handler = ConfigBuilder::new(&mock.base_url()).handler();

    let err = handler.complete_prompt("P").await.unwrap_err();
    assert!(matches!(
        &err,
        LlmError::Completion { provider, kind: ErrorKind::Protocol, message }
            if provider == "openai_compatible" && message == "bad key"
    ));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn empty_conversation_never_connects() {
    let mock = MockLlm::start(Script::body("data: [DONE]\n")).await.unwrap();
    let handler = ConfigBuilder::new(&mock.base_url()).handler();

    let events: Vec<_> = handler
        .create_message("S", &[ConversationTurn::assistant("only me")], &MessageOptions::default())
        .collect()
        .await;

    assert!(matches!(events[..], [StreamEvent::Error { kind: ErrorKind::Format, .. }]));
    assert_eq!(mock.completion_count(), 0);
}
