//! Handler traits and adapters for registered methods
//!
//! A [`Handler`] receives the [`RequestContext`] and the already validated
//! [`Arguments`] of a call and produces a JSON value. Handlers never see raw
//! wire params: binding and type checking happen before they are invoked.
//!
//! # Creating Handlers
//!
//! 1. **from_fn**: wrap an async closure over the context and raw arguments
//! 2. **from_typed_fn**: wrap an async closure over a typed argument list;
//!    the conversion is driven by [`FromArguments`]
//!
//! Handlers built from tuples report their arity, which the registry checks
//! against the signature at registration time.
//!
//! # Examples
//!
//! ```rust
//! use typedrpc_server::{from_fn, from_typed_fn, Handler, Named};
//! use serde::Deserialize;
//!
//! let ping = from_fn(|_ctx, _args| async { Ok(serde_json::json!("pong")) });
//! assert_eq!(ping.arity(), None);
//!
//! let add = from_typed_fn(|(a, b): (i64, i64)| async move { Ok(a + b) });
//! assert_eq!(add.arity(), Some(2));
//!
//! #[derive(Deserialize)]
//! struct Transfer { from: String, to: String, amount: f64 }
//!
//! let transfer = from_typed_fn(|Named(t): Named<Transfer>| async move {
//!     Ok(format!("{} -> {}: {}", t.from, t.to, t.amount))
//! });
//! assert_eq!(transfer.arity(), None);
//! ```

use crate::context::RequestContext;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use typedrpc_core::{Arguments, Error, ParamsViolation, Result};

/// Boxed future returned by every handler
pub type HandlerResult = Pin<Box<dyn Future<Output = Result<Value>> + Send>>;

/// A registered method implementation
///
/// Errors map onto the wire as follows: `Error::JsonRpc` is sent verbatim
/// (application error), `Error::InvalidParams` becomes `-32602`, and every
/// other variant becomes `-32603`.
pub trait Handler: Send + Sync {
    /// Execute the method
    fn call(&self, ctx: RequestContext, args: Arguments) -> HandlerResult;

    /// Number of declared parameters this handler expects, if fixed
    ///
    /// `None` means the handler accepts whatever the signature declares.
    fn arity(&self) -> Option<usize> {
        None
    }
}

/// Adapter from an async closure to [`Handler`]
pub struct AsyncHandler<F> {
    func: F,
    arity: Option<usize>,
}

impl<F, Fut> AsyncHandler<F>
where
    F: Fn(RequestContext, Arguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    /// Wrap `func` without an arity
    pub fn new(func: F) -> Self {
        Self { func, arity: None }
    }

    fn with_arity(func: F, arity: Option<usize>) -> Self {
        Self { func, arity }
    }
}

impl<F, Fut> Handler for AsyncHandler<F>
where
    F: Fn(RequestContext, Arguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    fn call(&self, ctx: RequestContext, args: Arguments) -> HandlerResult {
        Box::pin((self.func)(ctx, args))
    }

    fn arity(&self) -> Option<usize> {
        self.arity
    }
}

/// Create a handler over the request context and raw validated arguments
///
/// ```rust
/// use typedrpc_server::from_fn;
///
/// let handler = from_fn(|ctx, args| async move {
///     Ok(serde_json::json!({"method": ctx.method(), "argc": args.len()}))
/// });
/// ```
pub fn from_fn<F, Fut>(func: F) -> Box<dyn Handler>
where
    F: Fn(RequestContext, Arguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    Box::new(AsyncHandler::new(func))
}

/// Create a handler with typed arguments and a serializable result
///
/// Argument conversion failures become `Error::InvalidParams` naming the
/// parameter; a result that cannot be serialized becomes
/// `Error::Serialization`.
pub fn from_typed_fn<A, R, F, Fut>(func: F) -> Box<dyn Handler>
where
    A: FromArguments,
    R: Serialize + Send + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
{
    let func = Arc::new(func);

    Box::new(AsyncHandler::with_arity(
        move |_ctx: RequestContext, args: Arguments| {
            let func = Arc::clone(&func);
            async move {
                let args = A::from_arguments(args)?;
                let result = func(args).await?;
                serde_json::to_value(result).map_err(|e| Error::Serialization(e.to_string()))
            }
        },
        A::ARITY,
    ))
}

/// Conversion from validated arguments into a handler's typed input
pub trait FromArguments: Sized + Send + 'static {
    /// Number of declared parameters consumed, if fixed
    const ARITY: Option<usize>;

    /// Perform the conversion
    fn from_arguments(args: Arguments) -> Result<Self>;
}

impl FromArguments for () {
    const ARITY: Option<usize> = Some(0);

    fn from_arguments(_args: Arguments) -> Result<Self> {
        Ok(())
    }
}

impl FromArguments for Arguments {
    const ARITY: Option<usize> = None;

    fn from_arguments(args: Arguments) -> Result<Self> {
        Ok(args)
    }
}

/// Declared parameters deserialized as one struct, keyed by name
#[derive(Debug, Clone, PartialEq)]
pub struct Named<T>(pub T);

impl<T> FromArguments for Named<T>
where
    T: DeserializeOwned + Send + 'static,
{
    const ARITY: Option<usize> = None;

    fn from_arguments(args: Arguments) -> Result<Self> {
        serde_json::from_value(Value::Object(args.to_object()))
            .map(Named)
            .map_err(|e| Error::invalid_params(format!("Cannot convert arguments: {}", e)))
    }
}

fn convert<T: DeserializeOwned>(value: Value, name: &str) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        Error::InvalidParams(ParamsViolation::for_parameter(
            format!("Cannot convert parameter '{}': {}", name, e),
            name,
        ))
    })
}

macro_rules! impl_from_arguments_for_tuple {
    ($count:expr; $($ty:ident),+) => {
        impl<$($ty),+> FromArguments for ($($ty,)+)
        where
            $($ty: DeserializeOwned + Send + 'static),+
        {
            const ARITY: Option<usize> = Some($count);

            fn from_arguments(args: Arguments) -> Result<Self> {
                let names = args.names().to_vec();
                let mut bound = args.into_values().into_iter().zip(names);
                Ok(($(
                    {
                        let (value, name) = bound.next().ok_or_else(|| {
                            Error::Internal(format!(
                                "Handler expects {} arguments",
                                $count
                            ))
                        })?;
                        convert::<$ty>(value, &name)?
                    },
                )+))
            }
        }
    };
}

impl_from_arguments_for_tuple!(1; A1);
impl_from_arguments_for_tuple!(2; A1, A2);
impl_from_arguments_for_tuple!(3; A1, A2, A3);
impl_from_arguments_for_tuple!(4; A1, A2, A3, A4);
impl_from_arguments_for_tuple!(5; A1, A2, A3, A4, A5);
impl_from_arguments_for_tuple!(6; A1, A2, A3, A4, A5, A6);
impl_from_arguments_for_tuple!(7; A1, A2, A3, A4, A5, A6, A7);
impl_from_arguments_for_tuple!(8; A1, A2, A3, A4, A5, A6, A7, A8);
