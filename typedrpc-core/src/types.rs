//! JSON-RPC 2.0 wire types
//!
//! This module implements the wire data structures from the JSON-RPC 2.0
//! specification (https://www.jsonrpc.org/specification):
//!
//! - **Id**: request identifier, echoed verbatim in the response
//! - **Params**: by-position (array) or by-name (object) parameters
//! - **JsonRpcRequest**: a call; without an `id` it is a notification
//! - **JsonRpcResponse**: exactly one of `result` or `error`, plus the `id`
//!
//! Inbound requests are not deserialized with serde directly: the codec
//! validates the envelope by hand so it can tell a missing `id` (notification)
//! from an explicit `null` one, and report what exactly was wrong.

use crate::error::JsonRpcErrorData;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// JSON-RPC 2.0 request ID
///
/// The request identifier correlates a request with its response. Requests
/// may carry a string or an integer; the response echoes it with the same
/// type. `Null` is only used in responses whose request id could not be
/// determined.
///
/// # Examples
///
/// ```rust
/// use typedrpc_core::Id;
///
/// let id1: Id = "req-123".into();
/// let id2: Id = 42i64.into();
///
/// assert_eq!(id1.to_string(), "\"req-123\"");
/// assert_eq!(id2.to_string(), "42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    /// String identifier
    String(String),
    /// Integer identifier
    Number(i64),
    /// Integer identifier above `i64::MAX`
    Unsigned(u64),
    /// Unknown identifier (responses only)
    Null,
}

impl Id {
    /// Interpret a raw JSON value as a request id
    ///
    /// Only strings and integers are valid request ids. Floats, `null`,
    /// arrays and objects are rejected.
    pub fn from_value(value: &Value) -> Option<Id> {
        match value {
            Value::String(s) => Some(Id::String(s.clone())),
            Value::Number(n) => n
                .as_i64()
                .map(Id::Number)
                .or_else(|| n.as_u64().map(Id::Unsigned)),
            _ => None,
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::String(s) => write!(f, "\"{}\"", s),
            Id::Number(n) => write!(f, "{}", n),
            Id::Unsigned(n) => write!(f, "{}", n),
            Id::Null => write!(f, "null"),
        }
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::String(s)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::String(s.to_string())
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Number(n)
    }
}

/// Parameters of a JSON-RPC request
///
/// JSON-RPC 2.0 allows parameters by position (a JSON array) or by name (a JSON
/// object). Untagged so it serializes as the bare array or object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Params {
    /// Parameters supplied by position
    Positional(Vec<Value>),
    /// Parameters supplied by name
    Named(Map<String, Value>),
}

impl Params {
    /// Interpret a raw JSON value as request parameters
    pub fn from_value(value: Value) -> Option<Params> {
        match value {
            Value::Array(items) => Some(Params::Positional(items)),
            Value::Object(map) => Some(Params::Named(map)),
            _ => None,
        }
    }

    /// Number of supplied values
    pub fn len(&self) -> usize {
        match self {
            Params::Positional(items) => items.len(),
            Params::Named(map) => map.len(),
        }
    }

    /// Returns true if no values were supplied
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<Value>> for Params {
    fn from(items: Vec<Value>) -> Self {
        Params::Positional(items)
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Params::Named(map)
    }
}

/// JSON-RPC 2.0 request message
///
/// A request without an `id` is a notification: it is executed, but no
/// response is ever produced for it.
///
/// # Examples
///
/// ```rust
/// use typedrpc_core::{JsonRpcRequest, Id};
/// use serde_json::json;
///
/// let req = JsonRpcRequest::new(
///     "subtract",
///     Some(json!({"minuend": 42, "subtrahend": 23})),
///     Id::Number(1),
/// );
/// assert!(!req.is_notification());
///
/// let ping = JsonRpcRequest::notification("ping", None);
/// assert!(ping.is_notification());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version - always "2.0"
    pub jsonrpc: String,
    /// Name of the method to invoke
    pub method: String,
    /// Optional parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,
    /// Correlation id; `None` for notifications
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
}

impl JsonRpcRequest {
    /// Create a new JSON-RPC 2.0 request
    ///
    /// `params` must be a JSON array or object; any other value is dropped.
    pub fn new(method: impl Into<String>, params: Option<Value>, id: Id) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params: params.and_then(Params::from_value),
            id: Some(id),
        }
    }

    /// Create a notification (a request without an id)
    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params: params.and_then(Params::from_value),
            id: None,
        }
    }

    /// Returns true if this request carries no id
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC 2.0 response message
///
/// Contains either a result (success) or an error (failure), never both.
/// The mutual exclusion is enforced by the `success` and `error`
/// constructors.
///
/// # Examples
///
/// ```rust
/// use typedrpc_core::{JsonRpcResponse, JsonRpcErrorData, Id};
/// use serde_json::json;
///
/// let success = JsonRpcResponse::success(json!(12), Id::from("foo"));
/// assert_eq!(
///     serde_json::to_string(&success).unwrap(),
///     r#"{"jsonrpc":"2.0","id":"foo","result":12}"#
/// );
///
/// let error = JsonRpcResponse::error(
///     JsonRpcErrorData::method_not_found("unknownMethod"),
///     Id::Number(2),
/// );
/// assert!(error.is_error());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version - always "2.0"
    pub jsonrpc: String,
    /// Request id echoed from the request, `Id::Null` if it couldn't be determined
    pub id: Id,
    /// The result of the method invocation (present only on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error information (present only on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorData>,
}

impl JsonRpcResponse {
    /// Create a successful response
    ///
    /// A `null` result is kept on the wire as `"result": null`.
    pub fn success(result: Value, id: Id) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(error: JsonRpcErrorData, id: Id) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Check if the response represents a successful result
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Check if the response represents an error
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_display() {
        assert_eq!(Id::String("test".to_string()).to_string(), "\"test\"");
        assert_eq!(Id::Number(42).to_string(), "42");
        assert_eq!(Id::Null.to_string(), "null");
    }

    #[test]
    fn test_id_from_value() {
        assert_eq!(Id::from_value(&json!("abc")), Some(Id::from("abc")));
        assert_eq!(Id::from_value(&json!(7)), Some(Id::Number(7)));
        assert_eq!(
            Id::from_value(&json!(u64::MAX)),
            Some(Id::Unsigned(18446744073709551615))
        );
        assert_eq!(Id::from_value(&json!(4.0)), None);
        assert_eq!(Id::from_value(&json!(null)), None);
        assert_eq!(Id::from_value(&json!([1, 2, 3])), None);
    }

    #[test]
    fn test_id_serialization_preserves_type() {
        assert_eq!(serde_json::to_value(Id::from("1")).unwrap(), json!("1"));
        assert_eq!(serde_json::to_value(Id::Number(1)).unwrap(), json!(1));
        assert_eq!(
            serde_json::to_string(&Id::Unsigned(u64::MAX)).unwrap(),
            "18446744073709551615"
        );
        assert_eq!(serde_json::to_value(Id::Null).unwrap(), json!(null));
    }

    #[test]
    fn test_request_serialization() {
        let req = JsonRpcRequest::new("test", Some(json!([1, 2])), Id::Number(1));
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({"jsonrpc": "2.0", "method": "test", "params": [1, 2], "id": 1})
        );
    }

    #[test]
    fn test_notification_serialization() {
        let notif = JsonRpcRequest::notification("notify", None);
        let json = serde_json::to_string(&notif).unwrap();
        assert!(json.contains("\"method\":\"notify\""));
        assert!(!json.contains("\"id\""));
        assert!(!json.contains("\"params\""));
    }

    #[test]
    fn test_response_success_with_null_result() {
        let resp = JsonRpcResponse::success(Value::Null, Id::Number(1));
        assert!(resp.is_success());
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({"jsonrpc": "2.0", "id": 1, "result": null})
        );
    }

    #[test]
    fn test_response_error() {
        let resp = JsonRpcResponse::error(
            JsonRpcErrorData::internal_error("test error"),
            Id::Number(1),
        );
        assert!(!resp.is_success());
        assert!(resp.is_error());
        let value = serde_json::to_value(&resp).unwrap();
        assert!(value.get("result").is_none());
        assert_eq!(value["error"]["code"], -32603);
    }

    #[test]
    fn test_params_from_value() {
        assert!(matches!(
            Params::from_value(json!([1])),
            Some(Params::Positional(_))
        ));
        assert!(matches!(
            Params::from_value(json!({"a": 1})),
            Some(Params::Named(_))
        ));
        assert!(Params::from_value(json!("x")).is_none());
        assert!(Params::from_value(json!(null)).is_none());
    }
}
