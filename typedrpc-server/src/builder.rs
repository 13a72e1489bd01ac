//! Builder for configuring a [`Dispatcher`]
//!
//! The builder gathers everything a dispatcher needs before it starts
//! taking requests:
//! - the registry and the methods to register in it
//! - batch mode and size limit
//! - the wire codec
//! - middleware
//! - observability and metrics
//!
//! # Examples
//!
//! ```rust
//! use typedrpc_server::{from_fn, BatchMode, Dispatcher, LoggingMiddleware};
//! use typedrpc_core::{MethodSignature, TypeDescriptor};
//!
//! # fn main() -> typedrpc_core::Result<()> {
//! let dispatcher = Dispatcher::builder()
//!     .method(
//!         "ping",
//!         from_fn(|_ctx, _args| async { Ok(serde_json::json!("pong")) }),
//!         MethodSignature::nullary(TypeDescriptor::String),
//!     )
//!     .batch_mode(BatchMode::Sequential)
//!     .max_batch_size(100)
//!     .use_sync_middleware(LoggingMiddleware)
//!     .build()?;
//!
//! assert!(dispatcher.registry().contains("ping"));
//! # Ok(())
//! # }
//! ```

use crate::{
    BatchMode, BatchProcessor, DispatchMetrics, Dispatcher, Handler, Middleware,
    MiddlewareChain, Registry, SyncMiddleware,
};
use std::sync::Arc;
use typedrpc_core::{Codec, JsonCodec, MethodSignature, ObservabilityConfig, Result};

struct PendingMethod {
    name: String,
    handler: Box<dyn Handler>,
    signature: MethodSignature,
}

/// Fluent configuration for a [`Dispatcher`]
pub struct DispatcherBuilder {
    registry: Option<Registry>,
    methods: Vec<PendingMethod>,
    batch_mode: BatchMode,
    max_batch_size: Option<usize>,
    codec: Arc<dyn Codec>,
    middleware_chain: MiddlewareChain,
    observability_config: Option<ObservabilityConfig>,
    service_name: Option<String>,
    metrics: bool,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self {
            registry: None,
            methods: Vec::new(),
            batch_mode: BatchMode::default(),
            max_batch_size: None,
            codec: Arc::new(JsonCodec),
            middleware_chain: MiddlewareChain::new(),
            observability_config: None,
            service_name: None,
            metrics: false,
        }
    }

    /// Use an existing registry instead of a fresh one
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Register a method when the dispatcher is built
    pub fn method(
        mut self,
        name: impl Into<String>,
        handler: Box<dyn Handler>,
        signature: MethodSignature,
    ) -> Self {
        self.methods.push(PendingMethod {
            name: name.into(),
            handler,
            signature,
        });
        self
    }

    pub fn batch_mode(mut self, mode: BatchMode) -> Self {
        self.batch_mode = mode;
        self
    }

    /// Reject batches with more than `max_size` elements
    pub fn max_batch_size(mut self, max_size: usize) -> Self {
        self.max_batch_size = Some(max_size);
        self
    }

    /// Replace the default JSON codec
    pub fn codec(mut self, codec: impl Codec) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    pub fn use_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware_chain.add(middleware);
        self
    }

    pub fn use_sync_middleware<T: SyncMiddleware + 'static>(mut self, middleware: T) -> Self {
        self.middleware_chain.add_sync(middleware);
        self
    }

    /// Initialize observability on build; implies metrics
    pub fn with_observability(mut self, config: ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self.metrics = true;
        self
    }

    pub fn with_default_observability(self) -> Self {
        self.with_observability(ObservabilityConfig::default())
    }

    /// Service name for observability and metrics
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Record dispatch metrics on the global meter
    pub fn with_metrics(mut self) -> Self {
        self.metrics = true;
        self
    }

    /// Build the dispatcher
    ///
    /// Pending methods are registered in order; the first registration
    /// error aborts the build. Observability is initialized last.
    pub fn build(self) -> Result<Dispatcher> {
        let registry = self.registry.unwrap_or_default();
        for pending in self.methods {
            registry.register(pending.name, pending.handler, pending.signature)?;
        }

        let mut service_name = self
            .service_name
            .clone()
            .unwrap_or_else(|| "typedrpc".to_string());

        if let Some(mut config) = self.observability_config {
            match &self.service_name {
                Some(name) => config.service_name = name.clone(),
                None => service_name = config.service_name.clone(),
            }
            typedrpc_core::init_observability(config)?;
        }

        let metrics = self.metrics.then(|| DispatchMetrics::new(service_name.clone()));

        tracing::info!(
            service_name = %service_name,
            methods = registry.len(),
            batch_mode = self.batch_mode.as_str(),
            max_batch_size = ?self.max_batch_size,
            middleware = self.middleware_chain.len(),
            "Dispatcher ready"
        );

        Ok(Dispatcher::from_parts(
            registry,
            self.middleware_chain,
            BatchProcessor::with_limit(self.batch_mode, self.max_batch_size),
            self.codec,
            metrics,
        ))
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
