//! Codec for JSON-RPC message serialization and deserialization
//!
//! The dispatcher never touches serde_json directly for wire text. It goes
//! through a [`Codec`], so callers can plug in an encoder that knows how to
//! render their own payloads (or one that refuses some of them).
//!
//! # Responsibilities
//!
//! - **Codec trait**: raw text to a JSON value, and a response to raw text
//! - **Envelope validation**: [`parse_request`] turns a decoded value into a
//!   [`JsonRpcRequest`] or a [`RejectedRequest`] carrying the error to send
//! - **Batch assembly**: [`encode_batch`] joins individually encoded
//!   responses into one JSON array
//!
//! Responses are encoded one at a time so a single unencodable result only
//! affects its own batch slot.
//!
//! # Examples
//!
//! ```rust
//! use typedrpc_core::codec::{self, Codec, JsonCodec};
//!
//! let codec = JsonCodec;
//! let value = codec.decode(r#"{"jsonrpc":"2.0","method":"ping","id":1}"#).unwrap();
//! let request = codec::parse_request(value).unwrap();
//! assert_eq!(request.method, "ping");
//! assert!(!request.is_notification());
//! ```

use crate::error::{Error, JsonRpcErrorData, Result};
use crate::types::{Id, JsonRpcRequest, JsonRpcResponse, Params};
use serde_json::{Map, Value};

/// Pluggable wire codec
///
/// `decode` failures become `-32700` responses. `encode` failures trigger the
/// dispatcher's per-item fallback to an internal error.
pub trait Codec: Send + Sync + 'static {
    /// Parse raw inbound text into a JSON value
    fn decode(&self, data: &str) -> Result<Value>;

    /// Render a single response as text
    fn encode(&self, response: &JsonRpcResponse) -> Result<String>;
}

/// Default codec backed by serde_json
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn decode(&self, data: &str) -> Result<Value> {
        serde_json::from_str(data).map_err(|e| Error::Parse(e.to_string()))
    }

    fn encode(&self, response: &JsonRpcResponse) -> Result<String> {
        serde_json::to_string(response).map_err(|e| Error::Serialization(e.to_string()))
    }
}

/// A message that failed envelope validation
///
/// `id` is the request id when it could be read and was valid; the response
/// uses `null` otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRequest {
    /// Id to echo in the error response
    pub id: Option<Id>,
    /// Error to send back
    pub error: JsonRpcErrorData,
}

impl RejectedRequest {
    fn new(id: Option<Id>, detail: impl Into<String>) -> Self {
        Self {
            id,
            error: JsonRpcErrorData::invalid_request(detail),
        }
    }

    /// Build the error response for this rejection
    pub fn into_response(self) -> JsonRpcResponse {
        JsonRpcResponse::error(self.error, self.id.unwrap_or(Id::Null))
    }
}

/// Validate a decoded JSON value as a single JSON-RPC request
///
/// Checks run in a fixed order: the value is an object, `jsonrpc` is present
/// and equals `"2.0"`, `method` is a string, `id` (when present) is a string
/// or an integer, `params` (when present) is an array or object.
///
/// Only a valid envelope without `id` is a notification. A rejected envelope
/// without a usable `id` is still answered, with a `null` id.
pub fn parse_request(value: Value) -> std::result::Result<JsonRpcRequest, RejectedRequest> {
    let mut object = match value {
        Value::Object(object) => object,
        other => {
            return Err(RejectedRequest::new(
                None,
                format!("Request must be an object, got {}", json_kind(&other)),
            ))
        }
    };

    // A present-but-invalid id is reported with a null id
    let (id, id_error) = match object.remove("id") {
        None => (None, None),
        Some(raw) => match Id::from_value(&raw) {
            Some(id) => (Some(id), None),
            None => (
                None,
                Some(format!("Invalid request id {}", raw)),
            ),
        },
    };

    match object.get("jsonrpc") {
        None => return Err(RejectedRequest::new(id, "Missing 'jsonrpc' member")),
        Some(Value::String(v)) if v == "2.0" => {}
        Some(other) => {
            return Err(RejectedRequest::new(
                id,
                format!("Unsupported JSON-RPC version {}", other),
            ))
        }
    }

    let method = match object.remove("method") {
        Some(Value::String(method)) => method,
        Some(other) => {
            return Err(RejectedRequest::new(
                id,
                format!("Method name must be a string, got {}", json_kind(&other)),
            ))
        }
        None => return Err(RejectedRequest::new(id, "Missing 'method' member")),
    };

    if let Some(detail) = id_error {
        return Err(RejectedRequest::new(None, detail));
    }

    let params = match object.remove("params") {
        None => None,
        Some(raw) => {
            let kind = json_kind(&raw);
            match Params::from_value(raw) {
                Some(params) => Some(params),
                None => {
                    return Err(RejectedRequest::new(
                        id,
                        format!("Params must be an array or object, got {}", kind),
                    ))
                }
            }
        }
    };

    Ok(JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method,
        params,
        id,
    })
}

/// Join individually encoded responses into a JSON array
pub fn encode_batch(parts: &[String]) -> String {
    let mut out = String::with_capacity(parts.iter().map(|p| p.len() + 1).sum::<usize>() + 2);
    out.push('[');
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(part);
    }
    out.push(']');
    out
}

/// Name of a JSON value's kind for diagnostics
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Build a request object from its parts, mostly useful for tests and clients
pub fn request_value(method: &str, params: Option<Value>, id: Option<Value>) -> Value {
    let mut object = Map::new();
    object.insert("jsonrpc".to_string(), Value::String("2.0".to_string()));
    object.insert("method".to_string(), Value::String(method.to_string()));
    if let Some(params) = params {
        object.insert("params".to_string(), params);
    }
    if let Some(id) = id {
        object.insert("id".to_string(), id);
    }
    Value::Object(object)
}
