//! Core JSON-RPC 2.0 types and type checking for typedrpc
//!
//! This crate holds everything the dispatcher needs that does not involve
//! executing a method:
//!
//! - **Types**: wire structures for requests and responses
//! - **Codec**: pluggable decode/encode plus envelope validation
//! - **Error handling**: the internal error enum and its wire mapping
//! - **Type descriptors and signatures**: the declared shape of a method
//! - **Checker**: binding call arguments to a signature and checking types
//! - **Observability**: OpenTelemetry and tracing bootstrap
//!
//! The crate is transport-agnostic. `typedrpc-server` builds the method
//! registry and request dispatcher on top of it.
//!
//! # Example
//!
//! ```rust
//! use typedrpc_core::{checker, CallArguments, MethodSignature, TypeDescriptor};
//! use serde_json::json;
//!
//! let signature = MethodSignature::builder()
//!     .param("a", TypeDescriptor::Integer)
//!     .param("b", TypeDescriptor::Integer)
//!     .returns(TypeDescriptor::Integer)
//!     .build()
//!     .unwrap();
//!
//! let args = checker::validate_arguments(
//!     &signature,
//!     CallArguments::positional(vec![json!(5), json!(7)]),
//! )
//! .unwrap();
//! assert_eq!(args.get("b"), Some(&json!(7)));
//! ```

pub mod checker;
pub mod codec;
pub mod error;
pub mod observability;
pub mod signature;
pub mod type_descriptor;
pub mod types;

pub use checker::{Arguments, CallArguments};
pub use codec::{Codec, JsonCodec, RejectedRequest};
pub use error::{codes, Error, JsonRpcErrorData, ParamsViolation, Result};
pub use observability::{init_observability, shutdown_observability, ObservabilityConfig};
pub use signature::{MethodSignature, Parameter, SignatureBuilder};
pub use type_descriptor::TypeDescriptor;
pub use types::{Id, JsonRpcRequest, JsonRpcResponse, Params};
