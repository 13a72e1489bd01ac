//! Typed JSON-RPC 2.0 method registry and dispatcher
//!
//! This crate executes JSON-RPC 2.0 requests against methods registered with
//! a declared [`MethodSignature`](typedrpc_core::MethodSignature). Parameters
//! are checked against the signature before a handler runs, and results are
//! checked against the declared return type before they are answered.
//!
//! # Core Features
//!
//! - **Method Registry**: thread-safe registration and lookup, with built-in
//!   `rpc.describe` introspection
//! - **Typed Handlers**: plain async closures or tuple-typed functions
//! - **Batch Processing**: parallel or sequential, with an optional size limit
//! - **Middleware**: pre/post hooks with short-circuiting
//! - **Panic Isolation**: a panicking handler becomes an Internal error
//! - **Observability**: OpenTelemetry metrics and tracing spans
//!
//! # Quick Start
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
//!     .handle(r#"{"jsonrpc":"2.0","method":"add","params":[5,7],"id":"foo"}"#)
//!     .await;
//! assert_eq!(
//!     response.as_deref(),
//!     Some(r#"{"jsonrpc":"2.0","id":"foo","result":12}"#)
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Request Pipeline
//!
//! Every request, standalone or inside a batch, goes through the same steps:
//!
//! 1. Envelope validation
//! 2. Method lookup
//! 3. Argument binding and type checking
//! 4. Middleware and handler execution
//! 5. Return type check
//! 6. Encoding, with a per-item fallback to an Internal error
//!
//! Notifications run the same pipeline but never produce a response.

mod batch;
mod builder;
mod context;
mod dispatcher;
mod handler;
mod metrics;
mod middleware;
mod registry;

pub use batch::{BatchMode, BatchProcessor};
pub use builder::DispatcherBuilder;
pub use context::RequestContext;
pub use dispatcher::Dispatcher;
pub use handler::{from_fn, from_typed_fn, AsyncHandler, FromArguments, Handler, HandlerResult, Named};
pub use metrics::DispatchMetrics;
pub use middleware::{
    LoggingMiddleware, MetricsMiddleware, Middleware, MiddlewareAction, MiddlewareChain,
    SyncMiddleware, TracingMiddleware,
};
pub use registry::{Registry, RegistryEntry, DESCRIBE_METHOD};
