//! Session-level tests: framing, protocol errors, independent sessions

use std::sync::Arc;
use std::time::Duration;

use coinscope_protocol::{JsonRpcError, JsonRpcResponse};
use serde_json::{json, Value};
use tokio::sync::mpsc;

use super::*;
use crate::config::ApiKey;
use crate::fetchers::{MentionFetcher, PriceFetcher};
use crate::testing::{DelayedRequester, StaticRequester};
use crate::upstream::Requester;

fn dispatcher(requester: Arc<dyn Requester>) -> Arc<Dispatcher> {
    Arc::new(Dispatcher::new(
        FetcherSet::default()
            .with_price(PriceFetcher::new("http://mock/api/v3"))
            .with_mentions(MentionFetcher::new("http://mock", ApiKey::new("k"))),
        requester,
    ))
}

fn session() -> Session {
    Session::new(dispatcher(Arc::new(StaticRequester::ok(
        r#"{"bitcoin":{"usd":42.5}}"#,
    ))))
}

fn request(id: u64, method: &str, params: Value) -> String {
    json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}).to_string()
}

fn error_code(response: &JsonRpcResponse) -> i32 {
    response.error.as_ref().map(|e| e.code).unwrap()
}

#[tokio::test]
async fn test_initialize() {
    let mut session = session();

    let response = session
        .handle_frame(&request(1, "initialize", json!({})))
        .await
        .unwrap();

    let result = response.result.unwrap();
    assert_eq!(result["protocolVersion"], "2024-11-05");
    assert!(result["capabilities"]["tools"].is_object());
    assert_eq!(result["serverInfo"]["name"], "coinscope");
    assert!(session.is_initialized());
}

#[tokio::test]
async fn test_initialized_notification_has_no_response() {
    let mut session = session();
    let frame = json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string();

    assert!(session.handle_frame(&frame).await.is_none());
}

#[tokio::test]
async fn test_ping() {
    let response = session()
        .handle_frame(&request(9, "ping", Value::Null))
        .await
        .unwrap();

    assert_eq!(response.id, json!(9));
    assert_eq!(response.result, Some(json!({})));
}

#[tokio::test]
async fn test_tools_list() {
    let response = session()
        .handle_frame(&request(2, "tools/list", json!({})))
        .await
        .unwrap();

    let tools = response.result.unwrap()["tools"].clone();
    assert_eq!(tools[0]["name"], "get_coin_price");
    assert_eq!(tools[0]["inputSchema"]["required"][0], "coin_id");
    assert_eq!(tools[1]["name"], "search_twitter_mentions");
}

#[tokio::test]
async fn test_tools_call() {
    let response = session()
        .handle_frame(&request(
            3,
            "tools/call",
            json!({"name": "get_coin_price", "arguments": {"coin_id": "bitcoin"}}),
        ))
        .await
        .unwrap();

    let result = response.result.unwrap();
    assert_eq!(result["content"][0]["type"], "text");
    assert_eq!(result["content"][0]["text"], r#"{"price":42.5}"#);
    assert!(result.get("isError").is_none());
}

#[tokio::test]
async fn test_tools_call_missing_argument() {
    let response = session()
        .handle_frame(&request(
            4,
            "tools/call",
            json!({"name": "get_coin_price", "arguments": {}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.id, json!(4));
    assert_eq!(error_code(&response), JsonRpcError::INVALID_PARAMS);
}

#[tokio::test]
async fn test_tools_call_unknown_tool() {
    let response = session()
        .handle_frame(&request(5, "tools/call", json!({"name": "get_weather"})))
        .await
        .unwrap();

    assert_eq!(error_code(&response), JsonRpcError::METHOD_NOT_FOUND);
}

#[tokio::test]
async fn test_tools_call_without_params() {
    let response = session()
        .handle_frame(&request(6, "tools/call", Value::Null))
        .await
        .unwrap();

    assert_eq!(error_code(&response), JsonRpcError::INVALID_PARAMS);
}

#[tokio::test]
async fn test_parse_error_has_null_id() {
    let response = session().handle_frame("{not json").await.unwrap();

    assert_eq!(response.id, Value::Null);
    assert_eq!(error_code(&response), JsonRpcError::PARSE_ERROR);
}

#[tokio::test]
async fn test_null_id_call_is_answered() {
    let requester = Arc::new(StaticRequester::ok(r#"{"bitcoin":{"usd":42.5}}"#));
    let mut session = Session::new(dispatcher(requester.clone()));
    let frame = json!({
        "jsonrpc": "2.0",
        "id": null,
        "method": "tools/call",
        "params": {"name": "get_coin_price", "arguments": {"coin_id": "bitcoin"}}
    })
    .to_string();

    let response = session.handle_frame(&frame).await.unwrap();

    assert_eq!(response.id, Value::Null);
    assert_eq!(response.result.unwrap()["content"][0]["text"], r#"{"price":42.5}"#);
    assert_eq!(requester.calls(), 1);
}

#[tokio::test]
async fn test_non_request_json_is_invalid_request() {
    let response = session()
        .handle_frame(r#"{"jsonrpc":"2.0","id":12}"#)
        .await
        .unwrap();

    assert_eq!(response.id, json!(12));
    assert_eq!(error_code(&response), JsonRpcError::INVALID_REQUEST);
}

#[tokio::test]
async fn test_wrong_version() {
    let frame = json!({"jsonrpc": "1.0", "id": 7, "method": "ping"}).to_string();
    let response = session().handle_frame(&frame).await.unwrap();

    assert_eq!(error_code(&response), JsonRpcError::INVALID_REQUEST);
}

#[tokio::test]
async fn test_unknown_method() {
    let mut session = session();

    let response = session
        .handle_frame(&request(8, "resources/list", json!({})))
        .await
        .unwrap();
    assert_eq!(error_code(&response), JsonRpcError::METHOD_NOT_FOUND);

    let notification = json!({"jsonrpc": "2.0", "method": "resources/list"}).to_string();
    assert!(session.handle_frame(&notification).await.is_none());
}

#[tokio::test]
async fn test_errors_do_not_end_session() {
    let (in_tx, in_rx) = mpsc::channel(8);
    let (out_tx, mut out_rx) = mpsc::channel(8);
    let task = tokio::spawn(session().run(in_rx, out_tx));

    in_tx.send("garbage".to_string()).await.unwrap();
    in_tx
        .send(request(1, "tools/list", json!({})))
        .await
        .unwrap();

    let first = out_rx.recv().await.unwrap();
    assert!(first.is_error());
    let second = out_rx.recv().await.unwrap();
    assert_eq!(second.id, json!(1));
    assert!(!second.is_error());

    drop(in_tx);
    task.await.unwrap();
}

#[tokio::test]
async fn test_session_ends_when_outbound_closes() {
    let (_in_tx, in_rx) = mpsc::channel::<String>(8);
    let (out_tx, out_rx) = mpsc::channel(8);
    let task = tokio::spawn(session().run(in_rx, out_tx));

    drop(out_rx);
    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("session did not stop")
        .unwrap();
}

#[tokio::test]
async fn test_concurrent_sessions_interleave() {
    let requester = Arc::new(DelayedRequester::new(
        Duration::from_millis(100),
        r#"{"x":{"usd":1}}"#,
    ));
    let shared = dispatcher(requester.clone());

    let mut outputs = Vec::new();
    let mut inputs = Vec::new();
    let mut tasks = Vec::new();
    for _ in 0..2 {
        let (in_tx, in_rx) = mpsc::channel(8);
        let (out_tx, out_rx) = mpsc::channel(8);
        tasks.push(tokio::spawn(Session::new(shared.clone()).run(in_rx, out_tx)));
        inputs.push(in_tx);
        outputs.push(out_rx);
    }

    for (i, coin) in ["a", "b"].iter().enumerate() {
        inputs[i]
            .send(request(
                1,
                "tools/call",
                json!({"name": "get_coin_price", "arguments": {"coin_id": coin}}),
            ))
            .await
            .unwrap();
    }

    for output in &mut outputs {
        let response = output.recv().await.unwrap();
        assert!(!response.is_error());
    }

    // Both upstream calls were in flight before either finished
    let events = requester.events();
    assert_eq!(events.len(), 4);
    assert!(events[0].starts_with("start:"));
    assert!(events[1].starts_with("start:"));

    drop(inputs);
    for task in tasks {
        task.await.unwrap();
    }
}
