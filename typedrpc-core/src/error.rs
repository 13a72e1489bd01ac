//! Error types for typedrpc
//!
//! This module provides the error taxonomy shared by every typedrpc crate.
//! It defines two main error types:
//!
//! - **Error**: Internal failure conditions (uses thiserror)
//! - **JsonRpcErrorData**: Wire-format errors as sent to clients
//!
//! `Error::to_error_data` is the single place where an internal failure is
//! turned into a wire error object.
//!
//! # Reserved Error Codes
//!
//! JSON-RPC 2.0 defines standard error codes:
//! - `-32700`: Parse error (invalid JSON)
//! - `-32600`: Invalid request (bad envelope, wrong shape, empty batch)
//! - `-32601`: Method not found
//! - `-32602`: Invalid params
//! - `-32603`: Internal error
//! - `-32000 to -32099`: Server error (implementation-defined)
//!
//! Any other code is free for application errors raised by handlers.
//!
//! # Examples
//!
//! ```rust
//! use typedrpc_core::{Error, JsonRpcErrorData};
//!
//! let error = Error::MethodNotFound("unknownMethod".into());
//! let wire = error.to_error_data();
//! assert_eq!(wire.code, -32601);
//! assert_eq!(wire.message, "Method not found");
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Reserved JSON-RPC 2.0 error codes
pub mod codes {
    /// Invalid JSON was received
    pub const PARSE_ERROR: i32 = -32700;
    /// The JSON sent is not a valid request object
    pub const INVALID_REQUEST: i32 = -32600;
    /// The method does not exist
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid method parameters
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal JSON-RPC error
    pub const INTERNAL_ERROR: i32 = -32603;

    /// Returns true if `code` lies in the range reserved by JSON-RPC 2.0
    pub fn is_reserved(code: i32) -> bool {
        (-32768..=-32000).contains(&code)
    }
}

/// Result type for typedrpc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Details of a rejected argument list
///
/// Carried by `Error::InvalidParams` and serialized as the `data` member of
/// the resulting `-32602` error object, so clients can see which parameter
/// was at fault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamsViolation {
    /// Human-readable reason
    pub reason: String,
    /// Offending parameter name, when one can be singled out
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    /// Declared type of the parameter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// JSON text of the supplied value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl ParamsViolation {
    /// A violation with a reason only
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            parameter: None,
            expected: None,
            actual: None,
        }
    }

    /// A violation attributed to one parameter
    pub fn for_parameter(reason: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self {
            parameter: Some(parameter.into()),
            ..Self::new(reason)
        }
    }

    /// A type mismatch on one parameter
    pub fn type_mismatch(
        parameter: impl Into<String>,
        expected: impl Into<String>,
        actual: &Value,
    ) -> Self {
        let parameter = parameter.into();
        let expected = expected.into();
        let actual = actual.to_string();
        Self {
            reason: format!(
                "Value {} for parameter '{}' is not of expected type {}",
                actual, parameter, expected
            ),
            parameter: Some(parameter),
            expected: Some(expected),
            actual: Some(actual),
        }
    }
}

impl fmt::Display for ParamsViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Internal error type for typedrpc operations
///
/// Every failure the dispatcher can observe is one of these variants. The
/// variants map onto the JSON-RPC error taxonomy through `to_error_data`.
///
/// # Error Categories
///
/// - **Protocol errors**: Parse, InvalidRequest, MethodNotFound, InvalidParams
/// - **Server faults**: Internal, InvalidReturnType, Serialization
/// - **Application errors**: JsonRpc (passed through verbatim)
/// - **Setup errors**: Configuration (never sent on the wire)
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Error already in wire format
    ///
    /// Handlers return this variant to signal a domain-specific failure with
    /// their own code, message and data. It is passed through to the client
    /// unchanged.
    #[error("JSON-RPC error: {0}")]
    JsonRpc(#[from] JsonRpcErrorData),

    /// The inbound text is not valid JSON
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization or deserialization error
    ///
    /// Occurs when converting between Rust types and JSON, or when a codec
    /// refuses to encode a response.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid JSON-RPC request envelope
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No method registered under the requested name
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Supplied arguments do not match the method signature
    #[error("Invalid params: {0}")]
    InvalidParams(ParamsViolation),

    /// A handler produced a value that does not satisfy its declared return type
    ///
    /// This is a server-side contract violation, reported to clients as an
    /// internal error.
    #[error("Invalid return type: {0}")]
    InvalidReturnType(String),

    /// Unexpected failure during method execution
    #[error("Internal error: {0}")]
    Internal(String),

    /// Invalid method registration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Batch request size exceeded the configured limit
    #[error("Batch size limit exceeded: limit={limit}, actual={actual}")]
    BatchSizeExceeded {
        /// The maximum allowed batch size
        limit: usize,
        /// The actual batch size that was rejected
        actual: usize,
    },
}

impl Error {
    /// Shorthand for an `InvalidParams` error carrying only a reason
    pub fn invalid_params(reason: impl Into<String>) -> Self {
        Error::InvalidParams(ParamsViolation::new(reason))
    }

    /// The diagnostic text without the variant prefix
    pub fn detail(&self) -> String {
        match self {
            Error::JsonRpc(data) => data.message.clone(),
            Error::Parse(msg)
            | Error::Serialization(msg)
            | Error::InvalidRequest(msg)
            | Error::MethodNotFound(msg)
            | Error::InvalidReturnType(msg)
            | Error::Internal(msg)
            | Error::Configuration(msg) => msg.clone(),
            Error::InvalidParams(violation) => violation.reason.clone(),
            Error::BatchSizeExceeded { .. } => self.to_string(),
        }
    }

    /// Convert this error into the JSON-RPC error object sent to clients
    ///
    /// Application errors pass through unchanged, protocol errors keep their
    /// reserved codes, and everything else becomes `-32603`.
    pub fn to_error_data(&self) -> JsonRpcErrorData {
        match self {
            Error::JsonRpc(data) => data.clone(),
            Error::Parse(msg) => JsonRpcErrorData::parse_error(msg.clone()),
            Error::InvalidRequest(msg) => JsonRpcErrorData::invalid_request(msg.clone()),
            Error::BatchSizeExceeded { limit, actual } => {
                JsonRpcErrorData::batch_size_exceeded(*limit, *actual)
            }
            Error::MethodNotFound(method) => JsonRpcErrorData::method_not_found(method.clone()),
            Error::InvalidParams(violation) => JsonRpcErrorData::invalid_params(violation),
            Error::InvalidReturnType(msg)
            | Error::Internal(msg)
            | Error::Serialization(msg)
            | Error::Configuration(msg) => JsonRpcErrorData::internal_error(msg.clone()),
        }
    }

    /// Short label for the error kind, used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Error::JsonRpc(_) => "application",
            Error::Parse(_) => "parse_error",
            Error::InvalidRequest(_) | Error::BatchSizeExceeded { .. } => "invalid_request",
            Error::MethodNotFound(_) => "method_not_found",
            Error::InvalidParams(_) => "invalid_params",
            Error::InvalidReturnType(_)
            | Error::Internal(_)
            | Error::Serialization(_)
            | Error::Configuration(_) => "internal_error",
        }
    }
}

/// JSON-RPC 2.0 error object
///
/// This structure represents the exact wire format for JSON-RPC errors.
/// It appears in the `error` member of a `JsonRpcResponse`.
///
/// The factory methods for the reserved codes use the fixed messages from
/// the JSON-RPC 2.0 standard and put the diagnostic into `data`.
///
/// # Examples
///
/// ```rust
/// use typedrpc_core::JsonRpcErrorData;
/// use serde_json::json;
///
/// let error = JsonRpcErrorData::method_not_found("calculate");
/// assert_eq!(error.code, -32601);
/// assert_eq!(error.data, Some(json!("calculate")));
///
/// // Application error with additional data
/// let custom = JsonRpcErrorData::with_data(
///     1001,
///     "Insufficient funds",
///     json!({"balance": 50, "required": 100})
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorData {
    /// Numeric error code indicating the error type
    ///
    /// Negative codes from -32768 to -32000 are reserved by JSON-RPC 2.0.
    pub code: i32,

    /// Short description of the error
    pub message: String,

    /// Optional additional error information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcErrorData {
    /// Create a new JSON-RPC error with code and message
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create a new JSON-RPC error with additional data
    pub fn with_data(code: i32, message: impl Into<String>, data: Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Create a parse error (-32700)
    ///
    /// JSON-RPC 2.0: "Invalid JSON was received by the server."
    pub fn parse_error(detail: impl Into<String>) -> Self {
        Self::with_data(codes::PARSE_ERROR, "Parse error", Value::String(detail.into()))
    }

    /// Create an invalid request error (-32600)
    ///
    /// JSON-RPC 2.0: "The JSON sent is not a valid Request object."
    pub fn invalid_request(detail: impl Into<String>) -> Self {
        Self::with_data(
            codes::INVALID_REQUEST,
            "Invalid request",
            Value::String(detail.into()),
        )
    }

    /// Create a method not found error (-32601)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use typedrpc_core::JsonRpcErrorData;
    ///
    /// let error = JsonRpcErrorData::method_not_found("calculateFoo");
    /// assert_eq!(error.message, "Method not found");
    /// ```
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::with_data(
            codes::METHOD_NOT_FOUND,
            "Method not found",
            Value::String(method.into()),
        )
    }

    /// Create an invalid params error (-32602)
    ///
    /// The violation is serialized into `data`, so the offending parameter
    /// name is visible to the client.
    pub fn invalid_params(violation: &ParamsViolation) -> Self {
        let data = serde_json::to_value(violation)
            .unwrap_or_else(|_| Value::String(violation.reason.clone()));
        Self::with_data(codes::INVALID_PARAMS, "Invalid params", data)
    }

    /// Create an internal error (-32603)
    ///
    /// JSON-RPC 2.0: "Internal JSON-RPC error."
    pub fn internal_error(detail: impl Into<String>) -> Self {
        Self::with_data(
            codes::INTERNAL_ERROR,
            "Internal error",
            Value::String(detail.into()),
        )
    }

    /// Create a batch size exceeded error (-32600)
    pub fn batch_size_exceeded(limit: usize, actual: usize) -> Self {
        Self::invalid_request(format!(
            "Batch size limit exceeded: limit={}, actual={}",
            limit, actual
        ))
    }

    /// Returns true if the code is not one of the reserved protocol codes
    pub fn is_application_error(&self) -> bool {
        !codes::is_reserved(self.code)
    }
}

impl fmt::Display for JsonRpcErrorData {
    /// Formats as "[code] message", e.g. "[-32601] Method not found"
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for JsonRpcErrorData {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_jsonrpc_error_with_data() {
        let error = JsonRpcErrorData::with_data(
            -32602,
            "Invalid params",
            json!({"missing": ["username", "password"]}),
        );

        assert_eq!(error.code, -32602);
        assert_eq!(error.message, "Invalid params");

        if let Some(data) = error.data {
            assert_eq!(data["missing"][0], "username");
            assert_eq!(data["missing"][1], "password");
        } else {
            panic!("Expected data");
        }
    }

    #[test]
    fn test_jsonrpc_error_display() {
        let error = JsonRpcErrorData::method_not_found("unknownMethod");
        let display = format!("{}", error);

        assert!(display.contains("-32601"));
        assert!(display.contains("Method not found"));
    }

    #[test]
    fn test_all_jsonrpc_error_codes() {
        let errors = vec![
            (JsonRpcErrorData::parse_error("bad"), -32700, "Parse error"),
            (JsonRpcErrorData::invalid_request("test"), -32600, "Invalid request"),
            (JsonRpcErrorData::method_not_found("test"), -32601, "Method not found"),
            (
                JsonRpcErrorData::invalid_params(&ParamsViolation::new("test")),
                -32602,
                "Invalid params",
            ),
            (JsonRpcErrorData::internal_error("test"), -32603, "Internal error"),
        ];

        for (error, expected_code, expected_message) in errors {
            assert_eq!(error.code, expected_code);
            assert_eq!(error.message, expected_message);
            assert!(error.data.is_some());
        }
    }

    #[test]
    fn test_batch_size_exceeded_creation() {
        let error = JsonRpcErrorData::batch_size_exceeded(100, 150);

        assert_eq!(error.code, -32600);
        let data = error.data.unwrap();
        assert!(data.as_str().unwrap().contains("100"));
        assert!(data.as_str().unwrap().contains("150"));
    }

    #[test]
    fn test_invalid_params_data_names_parameter() {
        let violation = ParamsViolation::type_mismatch("b", "integer", &json!("hello"));
        let error = Error::InvalidParams(violation).to_error_data();

        assert_eq!(error.code, -32602);
        let data = error.data.unwrap();
        assert_eq!(data["parameter"], "b");
        assert_eq!(data["expected"], "integer");
        assert_eq!(data["actual"], "\"hello\"");
    }

    #[test]
    fn test_application_error_passes_through() {
        let app = JsonRpcErrorData::with_data(1001, "Insufficient funds", json!({"balance": 5}));
        let error: Error = app.clone().into();

        assert_eq!(error.to_error_data(), app);
        assert!(app.is_application_error());
        assert_eq!(error.kind(), "application");
    }

    #[test]
    fn test_server_faults_map_to_internal_error() {
        let faults = vec![
            Error::Internal("boom".into()),
            Error::InvalidReturnType("expected integer".into()),
            Error::Serialization("cannot encode".into()),
        ];

        for fault in faults {
            let data = fault.to_error_data();
            assert_eq!(data.code, codes::INTERNAL_ERROR);
            assert_eq!(data.data, Some(json!(fault.detail())));
        }
    }

    #[test]
    fn test_reserved_range() {
        assert!(codes::is_reserved(-32700));
        assert!(codes::is_reserved(-32000));
        assert!(!codes::is_reserved(-31999));
        assert!(!codes::is_reserved(1001));
    }

    #[test]
    fn test_error_deserialization() {
        let json = r#"{"code":-32601,"message":"Method not found"}"#;
        let error: JsonRpcErrorData = serde_json::from_str(json).unwrap();

        assert_eq!(error.code, -32601);
        assert_eq!(error.message, "Method not found");
        assert!(error.data.is_none());
    }

    #[test]
    fn test_error_serialization_skips_missing_data() {
        let error = JsonRpcErrorData::new(-32000, "Custom error");
        let serialized = serde_json::to_string(&error).unwrap();

        assert_eq!(serialized, r#"{"code":-32000,"message":"Custom error"}"#);
    }

    #[test]
    fn test_error_display_formatting() {
        let error = Error::MethodNotFound("testMethod".to_string());
        let display = format!("{}", error);

        assert!(display.contains("testMethod"));
        assert_eq!(error.detail(), "testMethod");
    }
}
