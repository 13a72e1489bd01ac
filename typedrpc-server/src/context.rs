//! Per-request context
//!
//! A [`RequestContext`] is created for every dispatched request and handed
//! explicitly to middleware and to the handler. It is never stored in
//! ambient or thread-local state, so concurrent requests on the same task
//! or thread cannot observe each other.

use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use typedrpc_core::Id;

/// Information about the request being dispatched
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: String,
    id: Option<Id>,
    metadata: HashMap<String, Value>,
    started: Instant,
}

impl RequestContext {
    /// Context for a request; `id` is `None` for notifications
    pub fn new(method: impl Into<String>, id: Option<Id>) -> Self {
        Self {
            method: method.into(),
            id,
            metadata: HashMap::new(),
            started: Instant::now(),
        }
    }

    /// The method being called
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The request id, if the request has one
    pub fn id(&self) -> Option<&Id> {
        self.id.as_ref()
    }

    /// Returns true if no response will be sent for this request
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Attach metadata visible to later middleware and the handler
    pub fn insert_metadata(&mut self, key: impl Into<String>, value: Value) {
        self.metadata.insert(key.into(), value);
    }

    /// Read metadata by key
    pub fn get_metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// All metadata
    pub fn metadata(&self) -> &HashMap<String, Value> {
        &self.metadata
    }

    /// Time since the context was created
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_notification_context() {
        let ctx = RequestContext::new("update", None);
        assert!(ctx.is_notification());
        assert_eq!(ctx.method(), "update");
    }

    #[test]
    fn test_metadata() {
        let mut ctx = RequestContext::new("add", Some(Id::Number(1)));
        ctx.insert_metadata("user", json!("alice"));

        assert_eq!(ctx.get_metadata("user"), Some(&json!("alice")));
        assert!(ctx.get_metadata("missing").is_none());
        assert_eq!(ctx.id(), Some(&Id::Number(1)));
        assert_eq!(ctx.metadata().len(), 1);
    }
}
