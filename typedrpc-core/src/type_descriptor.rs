//! Declared types for method parameters and return values
//!
//! A [`TypeDescriptor`] is the static type attached to each parameter and to
//! the return value of a registered method. Matching is done against the
//! JSON value as it arrived on the wire, with one widening rule: an integer
//! satisfies `Float`. The reverse is never true, and booleans are never
//! numbers.
//!
//! ```rust
//! use typedrpc_core::TypeDescriptor;
//! use serde_json::json;
//!
//! assert!(TypeDescriptor::Float.matches(&json!(3)));
//! assert!(!TypeDescriptor::Integer.matches(&json!(3.5)));
//! assert!(!TypeDescriptor::Integer.matches(&json!(true)));
//! assert_eq!(TypeDescriptor::Integer.name(), "integer");
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Static type of a parameter or return value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeDescriptor {
    /// JSON string
    String,
    /// JSON number without fraction or exponent
    Integer,
    /// Any JSON number
    Float,
    /// JSON `true` / `false`
    Boolean,
    /// JSON `null`, the only value of a void return
    Null,
    /// JSON array, elements unchecked
    Array,
    /// JSON object, members unchecked
    Object,
    /// Every value, `null` included
    Any,
}

impl TypeDescriptor {
    /// Returns true if `value` satisfies this descriptor
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (TypeDescriptor::Any, _) => true,
            (TypeDescriptor::String, Value::String(_)) => true,
            (TypeDescriptor::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (TypeDescriptor::Float, Value::Number(_)) => true,
            (TypeDescriptor::Boolean, Value::Bool(_)) => true,
            (TypeDescriptor::Null, Value::Null) => true,
            (TypeDescriptor::Array, Value::Array(_)) => true,
            (TypeDescriptor::Object, Value::Object(_)) => true,
            _ => false,
        }
    }

    /// Stable lowercase wire name
    pub fn name(&self) -> &'static str {
        match self {
            TypeDescriptor::String => "string",
            TypeDescriptor::Integer => "integer",
            TypeDescriptor::Float => "float",
            TypeDescriptor::Boolean => "boolean",
            TypeDescriptor::Null => "null",
            TypeDescriptor::Array => "array",
            TypeDescriptor::Object => "object",
            TypeDescriptor::Any => "any",
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integer_widens_to_float() {
        assert!(TypeDescriptor::Float.matches(&json!(5)));
        assert!(TypeDescriptor::Float.matches(&json!(5.5)));
        assert!(TypeDescriptor::Integer.matches(&json!(5)));
        assert!(TypeDescriptor::Integer.matches(&json!(u64::MAX)));
        assert!(!TypeDescriptor::Integer.matches(&json!(5.0)));
    }

    #[test]
    fn test_boolean_is_not_a_number() {
        assert!(!TypeDescriptor::Integer.matches(&json!(true)));
        assert!(!TypeDescriptor::Float.matches(&json!(false)));
        assert!(TypeDescriptor::Boolean.matches(&json!(false)));
    }

    #[test]
    fn test_null_only_matches_null_and_any() {
        let null = Value::Null;
        for descriptor in [
            TypeDescriptor::String,
            TypeDescriptor::Integer,
            TypeDescriptor::Float,
            TypeDescriptor::Boolean,
            TypeDescriptor::Array,
            TypeDescriptor::Object,
        ] {
            assert!(!descriptor.matches(&null), "{} matched null", descriptor);
        }
        assert!(TypeDescriptor::Null.matches(&null));
        assert!(TypeDescriptor::Any.matches(&null));
        assert!(!TypeDescriptor::Null.matches(&json!(0)));
    }

    #[test]
    fn test_containers() {
        assert!(TypeDescriptor::Array.matches(&json!([1, "a"])));
        assert!(!TypeDescriptor::Array.matches(&json!({"a": 1})));
        assert!(TypeDescriptor::Object.matches(&json!({"a": 1})));
        assert!(TypeDescriptor::Any.matches(&json!([])));
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_value(TypeDescriptor::Float).unwrap(), json!("float"));
        assert_eq!(TypeDescriptor::Any.to_string(), "any");
        let parsed: TypeDescriptor = serde_json::from_value(json!("boolean")).unwrap();
        assert_eq!(parsed, TypeDescriptor::Boolean);
    }
}
