//! typedrpc - typed JSON-RPC 2.0 dispatching
//!
//! This is the convenience crate that re-exports the typedrpc sub-crates.
//! Use it if you want a single dependency for both the wire types and the
//! dispatcher.
//!
//! # Architecture
//!
//! - **typedrpc-core**: wire types, codec, errors, type descriptors,
//!   signatures, the parameter checker, observability
//! - **typedrpc-server**: method registry, handlers, middleware, batch
//!   processing and the dispatcher
//!
//! The crates do not open sockets. A transport hands each inbound message to
//! [`Dispatcher::handle`] and writes back whatever it returns.
//!
//! # Quick Start
//!
//! ```rust
//! use typedrpc::{from_typed_fn, Dispatcher, MethodSignature, TypeDescriptor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = Dispatcher::builder()
//!         .method(
//!             "subtract",
//!             from_typed_fn(|(minuend, subtrahend): (i64, i64)| async move {
//!                 Ok(minuend - subtrahend)
//!             }),
//!             MethodSignature::builder()
//!                 .param("minuend", TypeDescriptor::Integer)
//!                 .param("subtrahend", TypeDescriptor::Integer)
//!                 .returns(TypeDescriptor::Integer)
//!                 .build()?,
//!         )
//!         .build()?;
//!
//!     let reply = dispatcher
//!         .handle(r#"{"jsonrpc":"2.0","method":"subtract","params":{"subtrahend":23,"minuend":42},"id":3}"#)
//!         .await;
//!     assert_eq!(reply.as_deref(), Some(r#"{"jsonrpc":"2.0","id":3,"result":19}"#));
//!     Ok(())
//! }
//! ```

pub use typedrpc_core as core;
pub use typedrpc_server as server;

// Most commonly used types, reachable as `typedrpc::Dispatcher` etc.
pub use typedrpc_core::{
    CallArguments, Error, Id, JsonRpcErrorData, JsonRpcRequest, JsonRpcResponse,
    MethodSignature, ObservabilityConfig, Result, TypeDescriptor,
};
pub use typedrpc_server::{
    from_fn, from_typed_fn, BatchMode, Dispatcher, DispatcherBuilder, Handler, Registry,
    RequestContext,
};
