//! Request dispatcher
//!
//! The [`Dispatcher`] turns raw JSON-RPC text into response text. For each
//! inbound call it:
//!
//! 1. decodes the text through the configured [`Codec`] (failure: Parse error)
//! 2. splits batches from single requests
//! 3. validates each envelope (failure: Invalid Request)
//! 4. resolves the method in the [`Registry`] (failure: Method not found)
//! 5. binds and type-checks the arguments (failure: Invalid params)
//! 6. runs middleware and the handler, catching panics (failure: Internal error)
//! 7. checks the result against the declared return type (failure: Internal error)
//! 8. encodes each response individually
//!
//! Notifications are executed but never answered. A batch whose elements
//! are all notifications yields no body at all.
//!
//! # Examples
//!
//! ```rust
//! use typedrpc_server::{from_typed_fn, Dispatcher};
//! use typedrpc_core::{MethodSignature, TypeDescriptor};
//!
//! # #[tokio::main]
//! # async fn main() -> typedrpc_core::Result<()> {
//! let dispatcher = Dispatcher::builder()
//!     .method(
//!         "add",
//!         from_typed_fn(|(a, b): (i64, i64)| async move { Ok(a + b) }),
//!         MethodSignature::builder()
//!             .param("a", TypeDescriptor::Integer)
//!             .param("b", TypeDescriptor::Integer)
//!             .returns(TypeDescriptor::Integer)
//!             .build()?,
//!     )
//!     .build()?;
//!
//! let response = dispatcher
//!     .handle(r#"{"jsonrpc":"2.0","method":"add","params":{"a":5,"b":7},"id":"foo"}"#)
//!     .await;
//! assert_eq!(response.as_deref(), Some(r#"{"jsonrpc":"2.0","id":"foo","result":12}"#));
//! # Ok(())
//! # }
//! ```

use crate::batch::BatchProcessor;
use crate::builder::DispatcherBuilder;
use crate::context::RequestContext;
use crate::handler::Handler;
use crate::metrics::DispatchMetrics;
use crate::middleware::{panic_message, MiddlewareChain};
use crate::registry::Registry;
use futures::FutureExt;
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use typedrpc_core::codec::{self, Codec, JsonCodec};
use typedrpc_core::{
    checker, CallArguments, Error, Id, JsonRpcErrorData, JsonRpcRequest, JsonRpcResponse,
    MethodSignature, Result,
};

struct DispatcherInner {
    registry: Registry,
    middleware: MiddlewareChain,
    batch: BatchProcessor,
    codec: Arc<dyn Codec>,
    metrics: Option<DispatchMetrics>,
}

/// Typed JSON-RPC 2.0 dispatcher
///
/// Cheap to clone; clones share the registry and configuration.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

impl Dispatcher {
    /// Dispatcher over `registry` with default settings
    pub fn new(registry: Registry) -> Self {
        Self::from_parts(
            registry,
            MiddlewareChain::new(),
            BatchProcessor::default(),
            Arc::new(JsonCodec),
            None,
        )
    }

    /// Start configuring a dispatcher
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    pub(crate) fn from_parts(
        registry: Registry,
        middleware: MiddlewareChain,
        batch: BatchProcessor,
        codec: Arc<dyn Codec>,
        metrics: Option<DispatchMetrics>,
    ) -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                registry,
                middleware,
                batch,
                codec,
                metrics,
            }),
        }
    }

    /// The method registry
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Register or replace a method
    pub fn register(
        &self,
        name: impl Into<String>,
        handler: Box<dyn Handler>,
        signature: MethodSignature,
    ) -> Result<()> {
        self.inner.registry.register(name, handler, signature)
    }

    /// Describe every registered method
    pub fn describe(&self) -> Value {
        self.inner.registry.describe()
    }

    /// Handle one inbound transport message
    ///
    /// Returns `None` when nothing should be sent back: a notification, or a
    /// batch made only of notifications.
    pub async fn handle(&self, raw: &str) -> Option<String> {
        let value = match self.inner.codec.decode(raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(error = %e, "Failed to decode request");
                self.record_error("parse_error");
                let response =
                    JsonRpcResponse::error(JsonRpcErrorData::parse_error(e.detail()), Id::Null);
                return self.encode_response(response);
            }
        };

        match value {
            Value::Array(items) => self.handle_batch(items).await,
            single => {
                let response = self.process_value(single).await?;
                self.encode_response(response)
            }
        }
    }

    /// Handle one inbound message given as bytes
    ///
    /// Bytes that are not valid UTF-8 are answered with a Parse error.
    pub async fn handle_bytes(&self, raw: &[u8]) -> Option<Vec<u8>> {
        match std::str::from_utf8(raw) {
            Ok(text) => self.handle(text).await.map(String::into_bytes),
            Err(e) => {
                self.record_error("parse_error");
                let response = JsonRpcResponse::error(
                    JsonRpcErrorData::parse_error(format!("Invalid UTF-8: {}", e)),
                    Id::Null,
                );
                self.encode_response(response).map(String::into_bytes)
            }
        }
    }

    /// Dispatch an already parsed request
    ///
    /// Returns `None` for notifications.
    #[tracing::instrument(skip(self, request), fields(method = %request.method, id = ?request.id))]
    pub async fn dispatch(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let started = Instant::now();
        let ctx = RequestContext::new(request.method.clone(), request.id.clone());
        let result = self
            .execute(ctx, &request.method, request.params.into())
            .await;

        if let Some(metrics) = &self.inner.metrics {
            let status = if result.is_ok() { "success" } else { "error" };
            metrics.record_request(&request.method, status, started.elapsed().as_secs_f64());
        }

        if let Err(e) = &result {
            self.record_error(e.kind());
            match e {
                Error::Internal(_) | Error::InvalidReturnType(_) | Error::Serialization(_) => {
                    tracing::error!(kind = e.kind(), error = %e, "Request failed")
                }
                _ => tracing::debug!(kind = e.kind(), error = %e, "Request failed"),
            }
        }

        let id = request.id?;
        Some(match result {
            Ok(value) => JsonRpcResponse::success(value, id),
            Err(e) => JsonRpcResponse::error(e.to_error_data(), id),
        })
    }

    /// Invoke a registered method in-process
    ///
    /// Goes through the same argument validation, middleware, and return
    /// checking as a wire request.
    pub async fn call(&self, method: &str, args: CallArguments) -> Result<Value> {
        let ctx = RequestContext::new(method, None);
        self.execute(ctx, method, args).await
    }

    /// Run a decoded single request through the pipeline
    pub(crate) async fn process_value(&self, value: Value) -> Option<JsonRpcResponse> {
        match codec::parse_request(value) {
            Ok(request) => self.dispatch(request).await,
            Err(rejected) => {
                tracing::debug!(error = %rejected.error, "Rejected request envelope");
                self.record_error("invalid_request");
                Some(rejected.into_response())
            }
        }
    }

    async fn handle_batch(&self, items: Vec<Value>) -> Option<String> {
        if let Some(metrics) = &self.inner.metrics {
            metrics.record_batch(items.len() as u64, self.inner.batch.mode().as_str());
        }

        let responses = match self.inner.batch.process_batch(items, self).await {
            Ok(responses) => responses,
            Err(e) => {
                self.record_error(e.kind());
                return self.encode_response(JsonRpcResponse::error(e.to_error_data(), Id::Null));
            }
        };

        let parts: Vec<String> = responses
            .into_iter()
            .filter_map(|response| self.encode_response(response))
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(codec::encode_batch(&parts))
        }
    }

    async fn execute(&self, ctx: RequestContext, method: &str, args: CallArguments) -> Result<Value> {
        let entry = self.inner.registry.lookup(method)?;
        let args = checker::validate_arguments(entry.signature(), args)?;

        let invocation = self
            .inner
            .middleware
            .execute(ctx, args, |ctx, args| entry.handler().call(ctx, args));

        // Handler panics are caught inside the chain; this catches middleware
        let value = AssertUnwindSafe(invocation)
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(Error::Internal(format!(
                    "Middleware for '{}' panicked: {}",
                    method,
                    panic_message(panic.as_ref())
                )))
            })
            .map_err(contain_invocation_error)?;

        checker::validate_return(entry.signature(), &value)?;
        Ok(value)
    }

    fn encode_response(&self, response: JsonRpcResponse) -> Option<String> {
        let error = match self.inner.codec.encode(&response) {
            Ok(text) => return Some(text),
            Err(e) => e,
        };

        tracing::error!(id = %response.id, error = %error, "Failed to encode response");
        self.record_error("internal_error");
        let fallback =
            JsonRpcResponse::error(JsonRpcErrorData::internal_error(error.detail()), response.id);

        match self.inner.codec.encode(&fallback) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::error!(id = %fallback.id, error = %e, "Dropping response that cannot be encoded");
                None
            }
        }
    }

    fn record_error(&self, kind: &str) {
        if let Some(metrics) = &self.inner.metrics {
            metrics.record_error(kind);
        }
    }
}

/// Keep protocol codes for failures the dispatcher itself detected
///
/// Errors raised while a method runs are server faults unless they are an
/// application error or an argument conversion failure.
fn contain_invocation_error(error: Error) -> Error {
    match error {
        Error::JsonRpc(_)
        | Error::InvalidParams(_)
        | Error::InvalidReturnType(_)
        | Error::Internal(_) => error,
        other => Error::Internal(other.to_string()),
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.inner.registry)
            .field("middleware", &self.inner.middleware.len())
            .field("batch", &self.inner.batch)
            .finish_non_exhaustive()
    }
}
