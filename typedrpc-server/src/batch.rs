//! Batch processing for JSON-RPC requests
//!
//! JSON-RPC 2.0 allows several requests to be sent as one JSON array. Each
//! element runs through the same single-request pipeline as a standalone
//! request, so a failure in one element never affects its siblings.
//!
//! # Batch Modes
//!
//! - **Parallel**: one Tokio task per element
//! - **Sequential**: elements run one after another, in array order
//!
//! Response order is not part of the protocol; clients correlate by id.
//!
//! # Size Limiting
//!
//! An empty batch is always rejected. A maximum size can be configured;
//! exceeding it rejects the whole batch with a single Invalid Request error.
//!
//! # Examples
//!
//! ```rust
//! use typedrpc_server::{BatchMode, BatchProcessor};
//!
//! let processor = BatchProcessor::with_limit(BatchMode::Parallel, Some(100));
//! assert_eq!(processor.max_size(), Some(100));
//!
//! let sequential = BatchProcessor::new(BatchMode::Sequential);
//! assert_eq!(sequential.mode(), BatchMode::Sequential);
//! ```

use crate::dispatcher::Dispatcher;
use serde_json::Value;
use typedrpc_core::{Error, Id, JsonRpcErrorData, JsonRpcResponse, Result};

/// How the elements of a batch are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
    /// Run all elements concurrently
    #[default]
    Parallel,
    /// Run elements in array order, one at a time
    Sequential,
}

impl BatchMode {
    /// Label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchMode::Parallel => "parallel",
            BatchMode::Sequential => "sequential",
        }
    }
}

/// Executes the elements of a batch request
#[derive(Debug, Clone, Default)]
pub struct BatchProcessor {
    mode: BatchMode,
    max_size: Option<usize>,
}

impl BatchProcessor {
    /// Processor without a size limit
    pub fn new(mode: BatchMode) -> Self {
        Self {
            mode,
            max_size: None,
        }
    }

    /// Processor with an optional size limit
    pub fn with_limit(mode: BatchMode, max_size: Option<usize>) -> Self {
        Self { mode, max_size }
    }

    /// Execution mode
    pub fn mode(&self) -> BatchMode {
        self.mode
    }

    /// Maximum accepted batch size
    pub fn max_size(&self) -> Option<usize> {
        self.max_size
    }

    /// Run every element of `items` through `dispatcher`
    ///
    /// Returns the responses of the elements that produced one; notifications
    /// contribute nothing. An empty or oversized batch is rejected as a whole.
    #[tracing::instrument(skip(self, items, dispatcher), fields(batch_size = items.len(), mode = ?self.mode))]
    pub async fn process_batch(
        &self,
        items: Vec<Value>,
        dispatcher: &Dispatcher,
    ) -> Result<Vec<JsonRpcResponse>> {
        if items.is_empty() {
            tracing::debug!("Rejecting empty batch");
            return Err(Error::InvalidRequest("Batch must not be empty".to_string()));
        }

        if let Some(max_size) = self.max_size {
            if items.len() > max_size {
                tracing::warn!(
                    batch_size = items.len(),
                    max_size = max_size,
                    "Batch size exceeded"
                );
                return Err(Error::BatchSizeExceeded {
                    limit: max_size,
                    actual: items.len(),
                });
            }
        }

        let responses = match self.mode {
            BatchMode::Parallel => self.process_parallel(items, dispatcher).await,
            BatchMode::Sequential => self.process_sequential(items, dispatcher).await,
        };

        tracing::debug!(response_count = responses.len(), "Batch processing completed");
        Ok(responses)
    }

    async fn process_parallel(
        &self,
        items: Vec<Value>,
        dispatcher: &Dispatcher,
    ) -> Vec<JsonRpcResponse> {
        let mut tasks = Vec::with_capacity(items.len());

        for item in items {
            // Needed to answer the element if its task dies
            let id = item.get("id").and_then(Id::from_value);
            let dispatcher = dispatcher.clone();
            tasks.push((
                id,
                tokio::spawn(async move { dispatcher.process_value(item).await }),
            ));
        }

        let mut responses = Vec::with_capacity(tasks.len());
        for (id, task) in tasks {
            match task.await {
                Ok(Some(response)) => responses.push(response),
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(error = %e, id = ?id, "Batch element task failed");
                    if let Some(id) = id {
                        responses.push(JsonRpcResponse::error(
                            JsonRpcErrorData::internal_error(e.to_string()),
                            id,
                        ));
                    }
                }
            }
        }

        responses
    }

    async fn process_sequential(
        &self,
        items: Vec<Value>,
        dispatcher: &Dispatcher,
    ) -> Vec<JsonRpcResponse> {
        let mut responses = Vec::with_capacity(items.len());

        for item in items {
            if let Some(response) = dispatcher.process_value(item).await {
                responses.push(response);
            }
        }

        responses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::from_fn;
    use crate::registry::Registry;
    use serde_json::json;
    use typedrpc_core::{codec, MethodSignature, TypeDescriptor};

    fn dispatcher() -> Dispatcher {
        let registry = Registry::without_introspection();
        registry
            .register(
                "test",
                from_fn(|_, _| async { Ok(json!({"result": "ok"})) }),
                MethodSignature::nullary(TypeDescriptor::Object),
            )
            .unwrap();
        Dispatcher::new(registry)
    }

    fn request(id: i64) -> Value {
        codec::request_value("test", None, Some(json!(id)))
    }

    #[tokio::test]
    async fn test_parallel_batch() {
        let processor = BatchProcessor::new(BatchMode::Parallel);
        let responses = processor
            .process_batch(vec![request(1), request(2)], &dispatcher())
            .await
            .unwrap();

        assert_eq!(responses.len(), 2);
        assert!(responses.iter().all(|r| r.is_success()));
    }

    #[tokio::test]
    async fn test_sequential_batch_keeps_order() {
        let processor = BatchProcessor::new(BatchMode::Sequential);
        let responses = processor
            .process_batch(vec![request(1), request(2), request(3)], &dispatcher())
            .await
            .unwrap();

        let ids: Vec<Id> = responses.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![Id::Number(1), Id::Number(2), Id::Number(3)]);
    }

    #[tokio::test]
    async fn test_batch_with_notification() {
        let processor = BatchProcessor::new(BatchMode::Parallel);
        let notification = codec::request_value("test", None, None);

        let responses = processor
            .process_batch(vec![request(1), notification], &dispatcher())
            .await
            .unwrap();

        assert_eq!(responses.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_batch_rejected() {
        let processor = BatchProcessor::default();
        let err = processor
            .process_batch(Vec::new(), &dispatcher())
            .await
            .unwrap_err();
        assert_eq!(err.to_error_data().code, -32600);
    }

    #[tokio::test]
    async fn test_batch_size_limit_within() {
        let processor = BatchProcessor::with_limit(BatchMode::Parallel, Some(3));
        let responses = processor
            .process_batch(vec![request(1), request(2)], &dispatcher())
            .await
            .unwrap();

        assert_eq!(responses.len(), 2);
        assert!(responses[0].error.is_none());
        assert!(responses[1].error.is_none());
    }

    #[tokio::test]
    async fn test_batch_size_limit_exceeded() {
        let processor = BatchProcessor::with_limit(BatchMode::Parallel, Some(2));
        let err = processor
            .process_batch(vec![request(1), request(2), request(3)], &dispatcher())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::BatchSizeExceeded { limit: 2, actual: 3 }));
        let data = err.to_error_data();
        assert_eq!(data.code, -32600);
        assert!(data.data.unwrap().as_str().unwrap().contains("Batch size limit exceeded"));
    }

    #[tokio::test]
    async fn test_batch_size_unlimited() {
        let processor = BatchProcessor::with_limit(BatchMode::Parallel, None);
        let batch: Vec<Value> = (0..100).map(request).collect();

        let responses = processor.process_batch(batch, &dispatcher()).await.unwrap();
        assert_eq!(responses.len(), 100);
    }

    #[tokio::test]
    async fn test_invalid_element_confined() {
        let processor = BatchProcessor::new(BatchMode::Sequential);
        let responses = processor
            .process_batch(vec![json!(1), request(7)], &dispatcher())
            .await
            .unwrap();

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].id, Id::Null);
        assert_eq!(responses[0].error.as_ref().unwrap().code, -32600);
        assert!(responses[1].is_success());
    }
}
