//! Method signatures
//!
//! A [`MethodSignature`] declares the ordered parameters of a method, their
//! types and defaults, the return type, and whether surplus positional or
//! named arguments are accepted. Signatures are built with
//! [`SignatureBuilder`], which enforces the structural rules once so the
//! checker can rely on them afterwards.
//!
//! # Examples
//!
//! ```rust
//! use typedrpc_core::{MethodSignature, TypeDescriptor};
//! use serde_json::json;
//!
//! let signature = MethodSignature::builder()
//!     .param("a", TypeDescriptor::Integer)
//!     .param_with_default("b", TypeDescriptor::Integer, json!(1))
//!     .returns(TypeDescriptor::Integer)
//!     .description("Add two integers")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(signature.parameters().len(), 2);
//! assert_eq!(signature.return_type(), TypeDescriptor::Integer);
//! ```

use crate::error::{Error, Result};
use crate::type_descriptor::TypeDescriptor;
use serde_json::Value;
use std::collections::HashSet;

/// A declared parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Parameter name, unique within its signature
    pub name: String,
    /// Declared type
    pub ty: TypeDescriptor,
    /// Value used when the caller omits the parameter
    pub default: Option<Value>,
}

impl Parameter {
    /// A required parameter
    pub fn required(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }

    /// A parameter with a default value
    pub fn with_default(name: impl Into<String>, ty: TypeDescriptor, default: Value) -> Self {
        Self {
            name: name.into(),
            ty,
            default: Some(default),
        }
    }

    /// Returns true if the caller may omit this parameter
    pub fn is_optional(&self) -> bool {
        self.default.is_some()
    }
}

/// Declared shape of a registered method
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSignature {
    parameters: Vec<Parameter>,
    return_type: TypeDescriptor,
    accepts_extra_positional: bool,
    accepts_extra_named: bool,
    description: Option<String>,
}

impl MethodSignature {
    /// Start building a signature
    pub fn builder() -> SignatureBuilder {
        SignatureBuilder::new()
    }

    /// A signature without parameters
    ///
    /// Infallible: a parameterless signature cannot break any of the
    /// builder's rules.
    pub fn nullary(return_type: TypeDescriptor) -> Self {
        Self {
            parameters: Vec::new(),
            return_type,
            accepts_extra_positional: false,
            accepts_extra_named: false,
            description: None,
        }
    }

    /// Replace the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declared parameters in order
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Look up a parameter by name
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Declared return type
    pub fn return_type(&self) -> TypeDescriptor {
        self.return_type
    }

    /// Whether surplus positional arguments are captured instead of rejected
    pub fn accepts_extra_positional(&self) -> bool {
        self.accepts_extra_positional
    }

    /// Whether unknown named arguments are captured instead of rejected
    pub fn accepts_extra_named(&self) -> bool {
        self.accepts_extra_named
    }

    /// Human-readable description shown by introspection
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Number of parameters without a default
    pub fn required_count(&self) -> usize {
        self.parameters.iter().filter(|p| !p.is_optional()).count()
    }
}

/// Builder for [`MethodSignature`]
#[derive(Debug, Default)]
pub struct SignatureBuilder {
    parameters: Vec<Parameter>,
    return_type: Option<TypeDescriptor>,
    accepts_extra_positional: bool,
    accepts_extra_named: bool,
    description: Option<String>,
}

impl SignatureBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a required parameter
    pub fn param(mut self, name: impl Into<String>, ty: TypeDescriptor) -> Self {
        self.parameters.push(Parameter::required(name, ty));
        self
    }

    /// Append a parameter with a default value
    pub fn param_with_default(
        mut self,
        name: impl Into<String>,
        ty: TypeDescriptor,
        default: Value,
    ) -> Self {
        self.parameters
            .push(Parameter::with_default(name, ty, default));
        self
    }

    /// Append a prebuilt parameter
    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Set the return type
    pub fn returns(mut self, ty: TypeDescriptor) -> Self {
        self.return_type = Some(ty);
        self
    }

    /// Capture surplus positional arguments
    pub fn accept_extra_positional(mut self) -> Self {
        self.accepts_extra_positional = true;
        self
    }

    /// Capture unknown named arguments
    pub fn accept_extra_named(mut self) -> Self {
        self.accepts_extra_named = true;
        self
    }

    /// Set the description shown by introspection
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Validate and build the signature
    ///
    /// Fails with `Error::Configuration` when a parameter name is empty or
    /// repeated, the return type was never set, or a required parameter
    /// follows one with a default.
    pub fn build(self) -> Result<MethodSignature> {
        let return_type = self
            .return_type
            .ok_or_else(|| Error::Configuration("Return type must be declared".to_string()))?;

        let mut seen = HashSet::new();
        let mut defaulted: Option<&str> = None;
        for parameter in &self.parameters {
            if parameter.name.is_empty() {
                return Err(Error::Configuration(
                    "Parameter names must not be empty".to_string(),
                ));
            }
            if !seen.insert(parameter.name.as_str()) {
                return Err(Error::Configuration(format!(
                    "Duplicate parameter name '{}'",
                    parameter.name
                )));
            }
            match (&parameter.default, defaulted) {
                (Some(_), None) => defaulted = Some(&parameter.name),
                (None, Some(previous)) => {
                    return Err(Error::Configuration(format!(
                        "Required parameter '{}' follows parameter '{}' which has a default",
                        parameter.name, previous
                    )))
                }
                _ => {}
            }
        }

        Ok(MethodSignature {
            parameters: self.parameters,
            return_type,
            accepts_extra_positional: self.accepts_extra_positional,
            accepts_extra_named: self.accepts_extra_named,
            description: self.description,
        })
    }
}
