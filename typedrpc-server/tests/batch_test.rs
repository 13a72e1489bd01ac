//! Batch request tests

use serde_json::{json, Value};
use typedrpc_core::{codes, Codec, Error, JsonCodec, JsonRpcResponse, MethodSignature, Result, TypeDescriptor};
use typedrpc_server::{from_fn, from_typed_fn, BatchMode, Dispatcher, DispatcherBuilder};

/// JSON codec that refuses to encode one particular result
struct PickyCodec;

impl Codec for PickyCodec {
    fn decode(&self, data: &str) -> Result<Value> {
        JsonCodec.decode(data)
    }

    fn encode(&self, response: &JsonRpcResponse) -> Result<String> {
        if response.result == Some(json!("unencodable")) {
            return Err(Error::Serialization("refusing to encode".to_string()));
        }
        JsonCodec.encode(response)
    }
}

/// JSON codec that cannot encode any error response
struct ErrorBlindCodec;

impl Codec for ErrorBlindCodec {
    fn decode(&self, data: &str) -> Result<Value> {
        JsonCodec.decode(data)
    }

    fn encode(&self, response: &JsonRpcResponse) -> Result<String> {
        if response.is_error() {
            return Err(Error::Serialization("errors are not encodable".to_string()));
        }
        JsonCodec.encode(response)
    }
}

fn builder() -> DispatcherBuilder {
    Dispatcher::builder()
        .method(
            "add",
            from_typed_fn(|(a, b): (i64, i64)| async move { Ok(a + b) }),
            MethodSignature::builder()
                .param("a", TypeDescriptor::Integer)
                .param("b", TypeDescriptor::Integer)
                .returns(TypeDescriptor::Integer)
                .build()
                .unwrap(),
        )
        .method(
            "opaque",
            from_fn(|_, _| async { Ok(json!("unencodable")) }),
            MethodSignature::nullary(TypeDescriptor::String),
        )
}

async fn handle_batch(dispatcher: &Dispatcher, request: &str) -> Vec<Value> {
    let response = dispatcher.handle(request).await.expect("expected a response");
    let mut entries: Vec<Value> = serde_json::from_str(&response).unwrap();
    entries.sort_by_key(|entry| entry["id"].as_i64());
    entries
}

#[tokio::test]
async fn test_two_adds() {
    let dispatcher = builder().build().unwrap();
    let entries = handle_batch(
        &dispatcher,
        r#"[
            {"jsonrpc":"2.0","method":"add","params":[5,7],"id":1},
            {"jsonrpc":"2.0","method":"add","params":[678,701],"id":2}
        ]"#,
    )
    .await;

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["result"], json!(12));
    assert_eq!(entries[1]["result"], json!(1379));
}

#[tokio::test]
async fn test_sequential_mode() {
    let dispatcher = builder().batch_mode(BatchMode::Sequential).build().unwrap();
    let entries = handle_batch(
        &dispatcher,
        r#"[
            {"jsonrpc":"2.0","method":"add","params":[1,1],"id":1},
            {"jsonrpc":"2.0","method":"add","params":[2,2],"id":2},
            {"jsonrpc":"2.0","method":"add","params":[3,3],"id":3}
        ]"#,
    )
    .await;

    let results: Vec<Value> = entries.iter().map(|e| e["result"].clone()).collect();
    assert_eq!(results, vec![json!(2), json!(4), json!(6)]);
}

#[tokio::test]
async fn test_single_element_batch_stays_array() {
    let dispatcher = builder().build().unwrap();
    let response = dispatcher
        .handle(r#"[{"jsonrpc":"2.0","method":"add","params":[1,2],"id":1}]"#)
        .await
        .unwrap();

    let value: Value = serde_json::from_str(&response).unwrap();
    assert!(value.is_array());
    assert_eq!(value[0]["result"], json!(3));
}

#[tokio::test]
async fn test_empty_batch_is_single_error() {
    let dispatcher = builder().build().unwrap();
    let response = dispatcher.handle("[]").await.unwrap();

    let value: Value = serde_json::from_str(&response).unwrap();
    assert!(value.is_object());
    assert_eq!(value["error"]["code"], json!(codes::INVALID_REQUEST));
    assert_eq!(value["id"], Value::Null);
}

#[tokio::test]
async fn test_all_notifications_yield_nothing() {
    let dispatcher = builder().build().unwrap();
    let response = dispatcher
        .handle(
            r#"[
                {"jsonrpc":"2.0","method":"add","params":[1,2]},
                {"jsonrpc":"2.0","method":"add","params":[3,4]}
            ]"#,
        )
        .await;

    assert!(response.is_none());
}

#[tokio::test]
async fn test_mixed_batch() {
    let dispatcher = builder().build().unwrap();
    let response = dispatcher
        .handle(
            r#"[
                {"jsonrpc":"2.0","method":"add","params":[1,2],"id":1},
                {"jsonrpc":"2.0","method":"add","params":[1,2]},
                {"jsonrpc":"2.0","method":"nope","id":2},
                1
            ]"#,
        )
        .await
        .unwrap();

    let entries: Vec<Value> = serde_json::from_str(&response).unwrap();
    assert_eq!(entries.len(), 3);

    let find = |id: Value| entries.iter().find(|e| e["id"] == id).cloned().unwrap();
    assert_eq!(find(json!(1))["result"], json!(3));
    assert_eq!(find(json!(2))["error"]["code"], json!(codes::METHOD_NOT_FOUND));
    assert_eq!(find(Value::Null)["error"]["code"], json!(codes::INVALID_REQUEST));
}

#[tokio::test]
async fn test_oversized_batch_rejected() {
    let dispatcher = builder().max_batch_size(2).build().unwrap();
    let response = dispatcher
        .handle(
            r#"[
                {"jsonrpc":"2.0","method":"add","params":[1,1],"id":1},
                {"jsonrpc":"2.0","method":"add","params":[2,2],"id":2},
                {"jsonrpc":"2.0","method":"add","params":[3,3],"id":3}
            ]"#,
        )
        .await
        .unwrap();

    let value: Value = serde_json::from_str(&response).unwrap();
    assert!(value.is_object());
    assert_eq!(value["error"]["code"], json!(codes::INVALID_REQUEST));
}

#[tokio::test]
async fn test_encode_failure_confined_to_element() {
    let dispatcher = builder().codec(PickyCodec).build().unwrap();
    let entries = handle_batch(
        &dispatcher,
        r#"[
            {"jsonrpc":"2.0","method":"opaque","id":1},
            {"jsonrpc":"2.0","method":"add","params":[2,3],"id":2}
        ]"#,
    )
    .await;

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["error"]["code"], json!(codes::INTERNAL_ERROR));
    assert!(entries[0]["error"]["data"]
        .as_str()
        .unwrap()
        .contains("refusing to encode"));
    assert_eq!(entries[1]["result"], json!(5));
}

#[tokio::test]
async fn test_encode_failure_on_single_request() {
    let dispatcher = builder().codec(PickyCodec).build().unwrap();
    let response = dispatcher
        .handle(r#"{"jsonrpc":"2.0","method":"opaque","id":"x"}"#)
        .await
        .unwrap();

    let value: Value = serde_json::from_str(&response).unwrap();
    assert_eq!(value["id"], json!("x"));
    assert_eq!(value["error"]["code"], json!(codes::INTERNAL_ERROR));
}

#[tokio::test]
async fn test_unencodable_fallback_drops_single_response() {
    let dispatcher = builder().codec(ErrorBlindCodec).build().unwrap();
    let response = dispatcher
        .handle(r#"{"jsonrpc":"2.0","method":"nope","id":1}"#)
        .await;

    assert!(response.is_none());
}

#[tokio::test]
async fn test_unencodable_fallback_drops_only_that_element() {
    let dispatcher = builder().codec(ErrorBlindCodec).build().unwrap();
    let entries = handle_batch(
        &dispatcher,
        r#"[
            {"jsonrpc":"2.0","method":"nope","id":1},
            {"jsonrpc":"2.0","method":"add","params":[2,3],"id":2}
        ]"#,
    )
    .await;

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["id"], json!(2));
    assert_eq!(entries[0]["result"], json!(5));
}
