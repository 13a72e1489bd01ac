//! OpenTelemetry and tracing bootstrap
//!
//! The dispatcher logs through `tracing` and records metrics through the
//! global OpenTelemetry meter. Nothing is exported until a process installs
//! a pipeline, which is what [`init_observability`] does:
//!
//! - an OTLP/gRPC span exporter behind a batch processor
//! - an OTLP/gRPC metric exporter read every 30 seconds
//! - a `tracing-subscriber` registry with an `EnvFilter` and a JSON fmt layer,
//!   plus the `tracing-opentelemetry` bridge when traces are enabled
//!
//! ```rust,no_run
//! use typedrpc_core::ObservabilityConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ObservabilityConfig::new("billing-rpc")
//!         .with_endpoint("http://localhost:4317")
//!         .with_log_level("debug");
//!
//!     typedrpc_core::init_observability(config).expect("observability");
//!     // ... serve requests ...
//!     typedrpc_core::shutdown_observability();
//! }
//! ```
//!
//! Defaults come from `OTEL_EXPORTER_OTLP_ENDPOINT` and `RUST_LOG`.

use crate::error::{Error, Result};
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const METRIC_EXPORT_INTERVAL: Duration = Duration::from_secs(30);

// Handles kept so shutdown can flush what the global providers buffered
static TRACER_PROVIDER: Mutex<Option<SdkTracerProvider>> = Mutex::new(None);
static METER_PROVIDER: Mutex<Option<SdkMeterProvider>> = Mutex::new(None);

fn keep_provider<T>(slot: &Mutex<Option<T>>, provider: T) {
    *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(provider);
}

fn take_provider<T>(slot: &Mutex<Option<T>>) -> Option<T> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).take()
}

/// Telemetry settings
///
/// Traces, metrics and local logs can be toggled independently.
///
/// ```rust
/// use typedrpc_core::ObservabilityConfig;
///
/// let config = ObservabilityConfig::new("inventory")
///     .with_endpoint("http://collector:4317")
///     .with_version("1.2.3")
///     .with_metrics(false);
/// assert_eq!(config.service_name, "inventory");
/// ```
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Reported as `service.name`
    pub service_name: String,
    /// Reported as `service.version`
    pub service_version: String,
    /// OTLP gRPC collector endpoint
    pub otlp_endpoint: String,
    /// Export spans
    pub enable_traces: bool,
    /// Export metrics
    pub enable_metrics: bool,
    /// Emit JSON logs to stdout
    pub enable_logs: bool,
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "typedrpc".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            otlp_endpoint: std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:4317".to_string()),
            enable_traces: true,
            enable_metrics: true,
            enable_logs: true,
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

impl ObservabilityConfig {
    /// Defaults with a custom service name
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// Set the OTLP collector endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = endpoint.into();
        self
    }

    /// Set the fallback log filter
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the reported service version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    /// Toggle span export
    pub fn with_traces(mut self, enable: bool) -> Self {
        self.enable_traces = enable;
        self
    }

    /// Toggle metric export
    pub fn with_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    /// Toggle local JSON logs
    pub fn with_logs(mut self, enable: bool) -> Self {
        self.enable_logs = enable;
        self
    }

    fn resource(&self) -> Resource {
        Resource::builder_empty()
            .with_attributes(vec![
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_NAME,
                    self.service_name.clone(),
                ),
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
                    self.service_version.clone(),
                ),
            ])
            .build()
    }
}

/// Install the telemetry pipeline described by `config`
///
/// Call once per process. A second call fails with `Error::Configuration`
/// because the global subscriber is already set.
pub fn init_observability(config: ObservabilityConfig) -> Result<()> {
    let tracer = if config.enable_traces {
        Some(init_tracer(&config)?)
    } else {
        None
    };

    if config.enable_metrics {
        init_metrics(&config)?;
    }

    init_tracing_subscriber(&config, tracer)?;

    tracing::info!(
        service_name = %config.service_name,
        otlp_endpoint = %config.otlp_endpoint,
        traces = config.enable_traces,
        metrics = config.enable_metrics,
        logs = config.enable_logs,
        "Observability initialized"
    );

    Ok(())
}

fn init_tracer(config: &ObservabilityConfig) -> Result<opentelemetry_sdk::trace::Tracer> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler};

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()
        .map_err(|e| Error::Configuration(format!("span exporter: {}", e)))?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(config.resource())
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .build();

    // The subscriber layer needs the tracer before the provider goes global
    let tracer = provider.tracer(config.service_name.clone());
    keep_provider(&TRACER_PROVIDER, provider.clone());
    global::set_tracer_provider(provider);

    Ok(tracer)
}

fn init_metrics(config: &ObservabilityConfig) -> Result<()> {
    use opentelemetry_sdk::metrics::PeriodicReader;

    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()
        .map_err(|e| Error::Configuration(format!("metric exporter: {}", e)))?;

    let reader = PeriodicReader::builder(exporter)
        .with_interval(METRIC_EXPORT_INTERVAL)
        .build();

    let provider = SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(config.resource())
        .build();

    keep_provider(&METER_PROVIDER, provider.clone());
    global::set_meter_provider(provider);
    Ok(())
}

fn init_tracing_subscriber(
    config: &ObservabilityConfig,
    tracer: Option<opentelemetry_sdk::trace::Tracer>,
) -> Result<()> {
    if tracer.is_none() && !config.enable_logs {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| Error::Configuration(format!("log filter: {}", e)))?;

    let fmt_layer = config.enable_logs.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .json()
    });
    let telemetry_layer = tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    tracing_subscriber::registry()
        .with(telemetry_layer)
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| Error::Configuration(format!("tracing subscriber: {}", e)))
}

/// Flush and tear down the telemetry pipeline
///
/// Shuts down the tracer and meter providers installed by
/// [`init_observability`], exporting whatever they still buffer. Safe to
/// call more than once; later calls find nothing to shut down.
pub fn shutdown_observability() {
    tracing::info!("Shutting down observability");

    if let Some(provider) = take_provider(&TRACER_PROVIDER) {
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = %e, "Tracer provider shutdown failed");
        }
    }

    if let Some(provider) = take_provider(&METER_PROVIDER) {
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = %e, "Meter provider shutdown failed");
        }
    }
}
