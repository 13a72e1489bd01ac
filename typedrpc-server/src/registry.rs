//! Method registry
//!
//! The registry maps method names to a [`RegistryEntry`]: the declared
//! [`MethodSignature`] plus the [`Handler`] that implements it. Entries are
//! immutable and `Arc`-shared; re-registering a name replaces the entry
//! wholesale, last writer wins.
//!
//! # Concurrency
//!
//! A single `RwLock` guards the map. Lookups clone the entry's `Arc` and
//! release the lock immediately, so no lock is held while a handler runs.
//!
//! # Introspection
//!
//! [`Registry::new`] registers the built-in `rpc.describe` method, which
//! returns [`Registry::describe`]. It holds only a weak handle to the map,
//! so the registry does not keep itself alive.
//!
//! ```rust
//! use typedrpc_server::{from_typed_fn, Registry};
//! use typedrpc_core::{MethodSignature, TypeDescriptor};
//!
//! let registry = Registry::new();
//! registry
//!     .register(
//!         "add",
//!         from_typed_fn(|(a, b): (i64, i64)| async move { Ok(a + b) }),
//!         MethodSignature::builder()
//!             .param("a", TypeDescriptor::Integer)
//!             .param("b", TypeDescriptor::Integer)
//!             .returns(TypeDescriptor::Integer)
//!             .build()
//!             .unwrap(),
//!     )
//!     .unwrap();
//!
//! assert!(registry.contains("add"));
//! assert!(registry.contains("rpc.describe"));
//! ```

use crate::context::RequestContext;
use crate::handler::{Handler, HandlerResult};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use typedrpc_core::{Arguments, Error, MethodSignature, Result, TypeDescriptor};

/// Name of the built-in introspection method
pub const DESCRIBE_METHOD: &str = "rpc.describe";

type EntryMap = HashMap<String, Arc<RegistryEntry>>;

/// A registered method
pub struct RegistryEntry {
    name: String,
    signature: MethodSignature,
    handler: Box<dyn Handler>,
}

impl RegistryEntry {
    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared signature
    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    /// Implementation
    pub fn handler(&self) -> &dyn Handler {
        self.handler.as_ref()
    }

    fn describe(&self) -> Value {
        let params: Vec<Value> = self
            .signature
            .parameters()
            .iter()
            .map(|p| json!({"name": p.name, "type": p.ty.name()}))
            .collect();

        json!({
            "name": self.name,
            "params": params,
            "returns": self.signature.return_type().name(),
            "description": self.signature.description(),
        })
    }
}

impl std::fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Shared, cloneable method registry
#[derive(Clone)]
pub struct Registry {
    entries: Arc<RwLock<EntryMap>>,
}

impl Registry {
    /// Create a registry with `rpc.describe` already registered
    pub fn new() -> Self {
        let registry = Self::without_introspection();
        let entry = RegistryEntry {
            name: DESCRIBE_METHOD.to_string(),
            signature: describe_signature(),
            handler: Box::new(DescribeHandler {
                entries: Arc::downgrade(&registry.entries),
            }),
        };
        registry
            .write()
            .insert(DESCRIBE_METHOD.to_string(), Arc::new(entry));
        registry
    }

    /// Create an empty registry
    pub fn without_introspection() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register or replace a method
    ///
    /// Fails with `Error::Configuration` when the handler reports a fixed
    /// arity that differs from the number of declared parameters.
    pub fn register(
        &self,
        name: impl Into<String>,
        handler: Box<dyn Handler>,
        signature: MethodSignature,
    ) -> Result<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::Configuration("Method name must not be empty".to_string()));
        }

        if let Some(arity) = handler.arity() {
            let declared = signature.parameters().len();
            if arity != declared {
                return Err(Error::Configuration(format!(
                    "Handler for '{}' takes {} arguments but the signature declares {}",
                    name, arity, declared
                )));
            }
        }

        let entry = Arc::new(RegistryEntry {
            name: name.clone(),
            signature,
            handler,
        });
        if self.write().insert(name.clone(), entry).is_some() {
            tracing::debug!(method = %name, "Replaced registered method");
        } else {
            tracing::debug!(method = %name, "Registered method");
        }
        Ok(())
    }

    /// Look up a method
    pub fn lookup(&self, name: &str) -> Result<Arc<RegistryEntry>> {
        self.read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::MethodNotFound(name.to_string()))
    }

    /// Returns true if a method is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Registered names, sorted
    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered methods
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns true if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Describe every registered method, sorted by name
    pub fn describe(&self) -> Value {
        describe_entries(&self.read())
    }

    fn read(&self) -> RwLockReadGuard<'_, EntryMap> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, EntryMap> {
        self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("methods", &self.method_names())
            .finish()
    }
}

fn describe_entries(entries: &EntryMap) -> Value {
    let mut sorted: Vec<&Arc<RegistryEntry>> = entries.values().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let mut document = Map::new();
    document.insert(
        "methods".to_string(),
        Value::Array(sorted.into_iter().map(|entry| entry.describe()).collect()),
    );
    Value::Object(document)
}

fn describe_signature() -> MethodSignature {
    MethodSignature::nullary(TypeDescriptor::Object)
        .with_description("Describe every registered method")
}

struct DescribeHandler {
    entries: Weak<RwLock<EntryMap>>,
}

impl Handler for DescribeHandler {
    fn call(&self, _ctx: RequestContext, _args: Arguments) -> HandlerResult {
        let described = match self.entries.upgrade() {
            Some(entries) => {
                let guard = entries.read().unwrap_or_else(|poisoned| poisoned.into_inner());
                Ok(describe_entries(&guard))
            }
            None => Err(Error::Internal("Registry is no longer available".to_string())),
        };
        Box::pin(async move { described })
    }

    fn arity(&self) -> Option<usize> {
        Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{from_fn, from_typed_fn};
    use typedrpc_core::CallArguments;

    fn add_signature() -> MethodSignature {
        MethodSignature::builder()
            .param("a", TypeDescriptor::Integer)
            .param("b", TypeDescriptor::Integer)
            .returns(TypeDescriptor::Integer)
            .description("Add two integers")
            .build()
            .unwrap()
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = Registry::without_introspection();
        registry
            .register(
                "add",
                from_typed_fn(|(a, b): (i64, i64)| async move { Ok(a + b) }),
                add_signature(),
            )
            .unwrap();

        let entry = registry.lookup("add").unwrap();
        assert_eq!(entry.name(), "add");
        assert_eq!(entry.signature().parameters().len(), 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_missing() {
        let registry = Registry::without_introspection();
        let err = registry.lookup("nope").unwrap_err();
        assert!(matches!(err, Error::MethodNotFound(ref m) if m == "nope"));
    }

    #[test]
    fn test_arity_mismatch_rejected() {
        let registry = Registry::without_introspection();
        let err = registry
            .register(
                "add",
                from_typed_fn(|(a,): (i64,)| async move { Ok(a) }),
                add_signature(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(!registry.contains("add"));
    }

    #[test]
    fn test_last_writer_wins() {
        let registry = Registry::without_introspection();
        let first = MethodSignature::builder()
            .returns(TypeDescriptor::String)
            .build()
            .unwrap();
        registry
            .register("m", from_fn(|_, _| async { Ok(Value::Null) }), first)
            .unwrap();
        registry
            .register("m", from_fn(|_, _| async { Ok(Value::Null) }), add_signature())
            .unwrap();

        let entry = registry.lookup("m").unwrap();
        assert_eq!(entry.signature().return_type(), TypeDescriptor::Integer);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_describe_sorted() {
        let registry = Registry::new();
        registry
            .register("zeta", from_fn(|_, _| async { Ok(json!(1)) }), add_signature())
            .unwrap();
        registry
            .register("alpha", from_fn(|_, _| async { Ok(json!(1)) }), add_signature())
            .unwrap();

        let document = registry.describe();
        let names: Vec<&str> = document["methods"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["alpha", DESCRIBE_METHOD, "zeta"]);

        let alpha = &document["methods"][0];
        assert_eq!(alpha["params"], json!([{"name": "a", "type": "integer"}, {"name": "b", "type": "integer"}]));
        assert_eq!(alpha["returns"], "integer");
        assert_eq!(alpha["description"], "Add two integers");
    }

    #[tokio::test]
    async fn test_describe_method_reflects_live_state() {
        let registry = Registry::new();
        let describe = registry.lookup(DESCRIBE_METHOD).unwrap();

        registry
            .register("late", from_fn(|_, _| async { Ok(json!(1)) }), add_signature())
            .unwrap();

        let args = typedrpc_core::checker::validate_arguments(
            describe.signature(),
            CallArguments::new(),
        )
        .unwrap();
        let result = describe
            .handler()
            .call(RequestContext::new(DESCRIBE_METHOD, None), args)
            .await
            .unwrap();
        assert_eq!(result, registry.describe());
        assert_eq!(result["methods"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_describe_handler_after_registry_dropped() {
        let registry = Registry::new();
        let describe = registry.lookup(DESCRIBE_METHOD).unwrap();
        drop(registry);

        // The entry still holds its handler; the map itself is gone.
        let result = describe
            .handler()
            .call(RequestContext::new(DESCRIBE_METHOD, None), Arguments::default())
            .await;
        assert!(result.is_err());
    }
}
