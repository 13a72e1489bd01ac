//! Middleware around method invocation
//!
//! Middleware runs after a request's arguments have been validated and
//! around the handler call. Each middleware can:
//! - inspect the request context and the bound arguments
//! - attach metadata for later middleware and the handler
//! - short-circuit with a value, skipping the handler
//! - observe the handler's result
//!
//! A short-circuited value is still checked against the method's declared
//! return type by the dispatcher.
//!
//! # Built-in Middleware
//!
//! - **LoggingMiddleware**: logs every invocation through `tracing`
//! - **MetricsMiddleware**: counts invocations
//! - **TracingMiddleware**: records a span per invocation
//!
//! # Examples
//!
//! ```rust
//! use typedrpc_server::{MiddlewareChain, LoggingMiddleware};
//!
//! let mut chain = MiddlewareChain::new();
//! chain.add_sync(LoggingMiddleware);
//! assert_eq!(chain.len(), 1);
//! ```

use crate::context::RequestContext;
use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use typedrpc_core::{Arguments, Error, Result};

/// Action to take after middleware pre-processing
#[derive(Debug, Clone)]
pub enum MiddlewareAction {
    /// Continue to next middleware/handler
    Continue,
    /// Skip the handler and use this value as its result
    ShortCircuit(Value),
}

/// Trait for async middleware
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Called before handler execution
    ///
    /// An error aborts the call and is reported like a handler error.
    async fn pre_handle(&self, ctx: &mut RequestContext, args: &Arguments)
        -> Result<MiddlewareAction>;

    /// Called after handler execution
    async fn post_handle(&self, ctx: &mut RequestContext, result: &Result<Value>) -> Result<()>;
}

/// Trait for synchronous middleware
pub trait SyncMiddleware: Send + Sync {
    /// Called before handler execution
    fn pre_handle(&self, ctx: &mut RequestContext, args: &Arguments) -> Result<MiddlewareAction>;

    /// Called after handler execution
    fn post_handle(&self, ctx: &mut RequestContext, result: &Result<Value>) -> Result<()>;
}

struct SyncMiddlewareAdapter<T: SyncMiddleware> {
    inner: T,
}

#[async_trait]
impl<T: SyncMiddleware + 'static> Middleware for SyncMiddlewareAdapter<T> {
    async fn pre_handle(
        &self,
        ctx: &mut RequestContext,
        args: &Arguments,
    ) -> Result<MiddlewareAction> {
        self.inner.pre_handle(ctx, args)
    }

    async fn post_handle(&self, ctx: &mut RequestContext, result: &Result<Value>) -> Result<()> {
        self.inner.post_handle(ctx, result)
    }
}

/// Ordered list of middleware
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an async middleware
    pub fn add(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    /// Append a sync middleware
    pub fn add_sync<T: SyncMiddleware + 'static>(&mut self, middleware: T) {
        self.middlewares
            .push(Arc::new(SyncMiddlewareAdapter { inner: middleware }));
    }

    /// Run the chain around `handler`
    ///
    /// `pre_handle` runs in order and `post_handle` in reverse. When a
    /// middleware short-circuits, only the middleware that already ran get
    /// their `post_handle`. Errors from `post_handle` are logged and ignored.
    /// A panicking handler becomes `Error::Internal` before the chain
    /// unwinds, so every entered middleware sees the failure.
    pub async fn execute<F, Fut>(
        &self,
        mut ctx: RequestContext,
        args: Arguments,
        handler: F,
    ) -> Result<Value>
    where
        F: FnOnce(RequestContext, Arguments) -> Fut + Send,
        Fut: std::future::Future<Output = Result<Value>> + Send,
    {
        let mut entered = 0;
        let mut short_circuit = None;

        for middleware in &self.middlewares {
            let action = match middleware.pre_handle(&mut ctx, &args).await {
                Ok(action) => action,
                Err(e) => {
                    let result = Err(e);
                    self.unwind(&mut ctx, entered, &result).await;
                    return result;
                }
            };
            entered += 1;
            if let MiddlewareAction::ShortCircuit(value) = action {
                short_circuit = Some(value);
                break;
            }
        }

        let result = match short_circuit {
            Some(value) => Ok(value),
            None => {
                let handler_ctx = ctx.clone();
                AssertUnwindSafe(async move { handler(handler_ctx, args).await })
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| {
                        Err(Error::Internal(format!(
                            "Method '{}' panicked: {}",
                            ctx.method(),
                            panic_message(panic.as_ref())
                        )))
                    })
            }
        };

        self.unwind(&mut ctx, entered, &result).await;
        result
    }

    async fn unwind(&self, ctx: &mut RequestContext, entered: usize, result: &Result<Value>) {
        for middleware in self.middlewares[..entered].iter().rev() {
            if let Err(e) = middleware.post_handle(ctx, result).await {
                tracing::warn!(method = %ctx.method(), error = %e, "Middleware post_handle failed");
            }
        }
    }

    /// Number of middleware in the chain
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    /// Returns true if the chain is empty
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }
}

/// Text of a caught panic payload
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Logs each invocation and its outcome
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingMiddleware;

impl LoggingMiddleware {
    pub fn new() -> Self {
        Self
    }
}

impl SyncMiddleware for LoggingMiddleware {
    fn pre_handle(&self, ctx: &mut RequestContext, args: &Arguments) -> Result<MiddlewareAction> {
        tracing::info!(
            method = %ctx.method(),
            id = ?ctx.id(),
            argc = args.len(),
            "Invoking method"
        );
        Ok(MiddlewareAction::Continue)
    }

    fn post_handle(&self, ctx: &mut RequestContext, result: &Result<Value>) -> Result<()> {
        let elapsed_ms = ctx.elapsed().as_secs_f64() * 1000.0;
        match result {
            Ok(_) => tracing::info!(method = %ctx.method(), elapsed_ms, "Method succeeded"),
            Err(e) => tracing::warn!(
                method = %ctx.method(),
                elapsed_ms,
                kind = e.kind(),
                error = %e,
                "Method failed"
            ),
        }
        Ok(())
    }
}

/// Counts invocations and failures
#[derive(Debug, Default)]
pub struct MetricsMiddleware {
    request_count: AtomicU64,
    error_count: AtomicU64,
}

impl MetricsMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invocations seen so far
    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Failed invocations seen so far
    pub fn error_count(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Middleware for MetricsMiddleware {
    async fn pre_handle(
        &self,
        _ctx: &mut RequestContext,
        _args: &Arguments,
    ) -> Result<MiddlewareAction> {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        Ok(MiddlewareAction::Continue)
    }

    async fn post_handle(&self, ctx: &mut RequestContext, result: &Result<Value>) -> Result<()> {
        if result.is_err() {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }
        tracing::debug!(
            method = %ctx.method(),
            duration_ms = ctx.elapsed().as_millis() as u64,
            "Invocation recorded"
        );
        Ok(())
    }
}

/// Records a span around each invocation
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMiddleware;

impl TracingMiddleware {
    pub fn new() -> Self {
        Self
    }

    fn span(ctx: &RequestContext) -> tracing::Span {
        tracing::info_span!(
            "rpc_request",
            method = %ctx.method(),
            request_id = ?ctx.id(),
            notification = ctx.is_notification(),
        )
    }
}

#[async_trait]
impl Middleware for TracingMiddleware {
    async fn pre_handle(
        &self,
        ctx: &mut RequestContext,
        _args: &Arguments,
    ) -> Result<MiddlewareAction> {
        let span = Self::span(ctx);
        span.in_scope(|| tracing::debug!("Request started"));
        Ok(MiddlewareAction::Continue)
    }

    async fn post_handle(&self, ctx: &mut RequestContext, result: &Result<Value>) -> Result<()> {
        let span = Self::span(ctx);
        span.in_scope(|| match result {
            Ok(_) => tracing::info!("Request completed successfully"),
            Err(e) => tracing::error!(error = %e, "Request failed"),
        });
        Ok(())
    }
}
