mod common;

use std::sync::Arc;

use copydesk_stream::{CancellationToken, GenerationClient, StreamError};
use copydesk_types::{
    AgentStatus, CustomerProfileRequest, GenerationEvent, SharedCredentials, StaticCredentials,
};
use mockito::Matcher;
use serde_json::json;

use common::{chunk, frame, spawn_chunked_server};

fn sse_body(frames: &[&str]) -> String {
    frames.iter().map(|f| frame(f)).collect()
}

#[tokio::test]
async fn test_persona_stream_with_bearer_token() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/generate-customer-profile")
        .match_header("content-type", "application/json")
        .match_header("authorization", "Bearer test-token")
        .match_body(Matcher::Json(json!({
            "brandIdentityId": "bi_123",
            "language": "English"
        })))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(sse_body(&[
            r#"{"type":"status","status":"fetching_brand"}"#,
            r#"{"type":"status","status":"analyzing"}"#,
            r#"{"type":"chunk","content":"{\"personaName\":\"Test\"}"}"#,
            r#"{"type":"done","personaName":"Test"}"#,
        ]))
        .create_async()
        .await;

    let client = GenerationClient::builder()
        .base_url(server.url())
        .credentials(Arc::new(StaticCredentials::new("test-token")))
        .build()
        .unwrap();

    let mut events = Vec::new();
    client
        .generate(
            &CustomerProfileRequest::new("bi_123"),
            |event| events.push(event),
            None,
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(events.len(), 4);
    assert_eq!(events[0], GenerationEvent::status(AgentStatus::FetchingBrand));
    assert_eq!(events[1], GenerationEvent::status(AgentStatus::Analyzing));
    assert_eq!(events[2], GenerationEvent::chunk(r#"{"personaName":"Test"}"#));
    match &events[3] {
        GenerationEvent::Done { payload } => assert_eq!(payload["personaName"], json!("Test")),
        other => panic!("Expected Done, got {:?}", other),
    }
}

#[tokio::test]
async fn test_no_authorization_header_without_session() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/generate-worksheet")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body(sse_body(&[r#"{"type":"done","content":"Worksheet"}"#]))
        .create_async()
        .await;

    let credentials = SharedCredentials::new();
    let client = GenerationClient::builder()
        .base_url(server.url())
        .credentials(Arc::new(credentials))
        .build()
        .unwrap();

    let mut count = 0;
    client
        .run_generation(
            "generate-worksheet",
            &json!({"brandIdentityId": "bi_1"}),
            |_| count += 1,
            None,
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_non_success_status_is_request_failed() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/generate-brand-identity")
        .with_status(500)
        .with_body("agent crashed")
        .create_async()
        .await;

    let client = GenerationClient::new(server.url()).unwrap();
    let mut events = Vec::new();
    let result = client
        .run_generation(
            "generate-brand-identity",
            &json!({"workspaceId": "ws_1"}),
            |e| events.push(e),
            None,
        )
        .await;

    match result {
        Err(StreamError::RequestFailed { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body.as_deref(), Some("agent crashed"));
        }
        other => panic!("Expected RequestFailed, got {:?}", other),
    }
    assert!(events.is_empty());
}

#[tokio::test]
async fn test_malformed_frame_between_good_frames() {
    let mut server = mockito::Server::new_async().await;
    let body = format!(
        "{}data: {{oops\n\n{}",
        frame(r#"{"type":"chunk","content":"one"}"#),
        frame(r#"{"type":"chunk","content":"two"}"#),
    );
    let _mock = server
        .mock("POST", "/generate-social-content")
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let client = GenerationClient::new(server.url()).unwrap();
    let mut events = Vec::new();
    client
        .run_generation("generate-social-content", &json!({}), |e| events.push(e), None)
        .await
        .unwrap();

    assert_eq!(
        events,
        vec![GenerationEvent::chunk("one"), GenerationEvent::chunk("two")]
    );
}

#[tokio::test]
async fn test_frames_split_across_network_chunks() {
    let url = spawn_chunked_server(
        vec![
            chunk(0, "data: {\"type\":\"chunk\",\"con"),
            chunk(20, "tent\":\"Hello \"}\n"),
            chunk(20, "\ndata: {\"type\":\"chunk\",\"content\":\"world\"}\n\ndata: {\"type\":\"do"),
            chunk(20, "ne\",\"text\":\"Hello world\"}\n\n"),
        ],
        false,
    )
    .await;

    let client = GenerationClient::new(url).unwrap();
    let mut text = String::new();
    let mut done = None;
    client
        .run_generation(
            "generate-worksheet",
            &json!({"brandIdentityId": "bi_1"}),
            |event| match event {
                GenerationEvent::Chunk { content } => text.push_str(&content),
                GenerationEvent::Done { payload } => done = Some(payload),
                _ => {}
            },
            None,
        )
        .await
        .unwrap();

    assert_eq!(text, "Hello world");
    assert_eq!(done.unwrap()["text"], json!("Hello world"));
}

#[tokio::test]
async fn test_cancel_before_any_frame() {
    let url = spawn_chunked_server(
        vec![chunk(500, frame(r#"{"type":"chunk","content":"too late"}"#))],
        true,
    )
    .await;

    let client = GenerationClient::new(url).unwrap();
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let mut events = Vec::new();
    let result = client
        .run_generation("generate-worksheet", &json!({}), |e| events.push(e), Some(&token))
        .await;

    assert!(matches!(result, Err(StreamError::Cancelled)));
    assert!(events.is_empty());
}

#[tokio::test]
async fn test_already_cancelled_token_sends_nothing() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/generate-worksheet")
        .expect(0)
        .create_async()
        .await;

    let client = GenerationClient::new(server.url()).unwrap();
    let token = CancellationToken::new();
    token.cancel();

    let mut events = Vec::new();
    let result = client
        .run_generation("generate-worksheet", &json!({}), |e| events.push(e), Some(&token))
        .await;

    assert!(result.unwrap_err().is_cancelled());
    assert!(events.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_cancel_after_partial_chunks_stops_delivery() {
    let url = spawn_chunked_server(
        vec![
            chunk(0, frame(r#"{"type":"chunk","content":"a"}"#)),
            chunk(0, frame(r#"{"type":"chunk","content":"b"}"#)),
            chunk(100, frame(r#"{"type":"chunk","content":"c"}"#)),
            chunk(0, frame(r#"{"type":"done","text":"abc"}"#)),
        ],
        true,
    )
    .await;

    let client = GenerationClient::new(url).unwrap();
    let token = CancellationToken::new();
    let mut events = Vec::new();

    let result = client
        .run_generation(
            "generate-worksheet",
            &json!({}),
            |event| {
                events.push(event);
                if events.len() == 2 {
                    token.cancel();
                }
            },
            Some(&token),
        )
        .await;

    assert!(matches!(result, Err(StreamError::Cancelled)));
    assert_eq!(
        events,
        vec![GenerationEvent::chunk("a"), GenerationEvent::chunk("b")]
    );
}
