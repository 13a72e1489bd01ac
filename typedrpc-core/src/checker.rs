//! Parameter checker
//!
//! Binds the arguments of a call to a [`MethodSignature`] and checks each
//! bound value against its declared [`TypeDescriptor`]. The result is a
//! normalized [`Arguments`] value: declared parameters in declaration order
//! with defaults filled in, plus whatever extras the signature captures.
//!
//! Every rejection is an `Error::InvalidParams` carrying a
//! [`ParamsViolation`] that names the parameter at fault. Return values are
//! checked separately by [`validate_return`], whose failures are server
//! faults rather than caller mistakes.
//!
//! [`TypeDescriptor`]: crate::TypeDescriptor

use crate::error::{Error, ParamsViolation, Result};
use crate::signature::MethodSignature;
use crate::types::Params;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Raw arguments of a call, before binding
///
/// Wire requests carry either positional or named values. In-process callers
/// may supply both at once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArguments {
    /// Values supplied by position
    pub positional: Vec<Value>,
    /// Values supplied by name
    pub named: Map<String, Value>,
}

impl CallArguments {
    /// No arguments
    pub fn new() -> Self {
        Self::default()
    }

    /// Only positional arguments
    pub fn positional(values: Vec<Value>) -> Self {
        Self {
            positional: values,
            named: Map::new(),
        }
    }

    /// Only named arguments
    pub fn named(values: Map<String, Value>) -> Self {
        Self {
            positional: Vec::new(),
            named: values,
        }
    }

    /// Append a positional argument
    pub fn arg(mut self, value: Value) -> Self {
        self.positional.push(value);
        self
    }

    /// Add a named argument
    pub fn kwarg(mut self, name: impl Into<String>, value: Value) -> Self {
        self.named.insert(name.into(), value);
        self
    }
}

impl From<Params> for CallArguments {
    fn from(params: Params) -> Self {
        match params {
            Params::Positional(values) => CallArguments::positional(values),
            Params::Named(values) => CallArguments::named(values),
        }
    }
}

impl From<Option<Params>> for CallArguments {
    fn from(params: Option<Params>) -> Self {
        params.map(CallArguments::from).unwrap_or_default()
    }
}

/// Arguments bound to a signature and type-checked
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    names: Vec<String>,
    values: Vec<Value>,
    extra_positional: Vec<Value>,
    extra_named: Map<String, Value>,
}

impl Arguments {
    /// Value of a declared parameter
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|index| &self.values[index])
    }

    /// Value of a declared parameter, deserialized into `T`
    ///
    /// Conversion failures are reported as invalid params naming the
    /// parameter.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let value = self.get(name).ok_or_else(|| {
            Error::InvalidParams(ParamsViolation::for_parameter(
                format!("Missing required parameter '{}'", name),
                name,
            ))
        })?;
        serde_json::from_value(value.clone()).map_err(|e| {
            Error::InvalidParams(ParamsViolation::for_parameter(
                format!("Cannot convert parameter '{}': {}", name, e),
                name,
            ))
        })
    }

    /// Declared parameter values in declaration order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Declared parameter names in declaration order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of declared parameter values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no declared parameters were bound
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Surplus positional values, unchecked
    pub fn extra_positional(&self) -> &[Value] {
        &self.extra_positional
    }

    /// Unknown named values, unchecked
    pub fn extra_named(&self) -> &Map<String, Value> {
        &self.extra_named
    }

    /// Declared parameters as a JSON object
    pub fn to_object(&self) -> Map<String, Value> {
        self.names
            .iter()
            .cloned()
            .zip(self.values.iter().cloned())
            .collect()
    }

    /// Consume into the declared values
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Bind `args` to `signature` and type-check every supplied value
///
/// # Examples
///
/// ```rust
/// use typedrpc_core::{checker, CallArguments, MethodSignature, TypeDescriptor};
/// use serde_json::json;
///
/// let signature = MethodSignature::builder()
///     .param("a", TypeDescriptor::Integer)
///     .param("b", TypeDescriptor::Integer)
///     .returns(TypeDescriptor::Integer)
///     .build()
///     .unwrap();
///
/// let args = checker::validate_arguments(
///     &signature,
///     CallArguments::new().arg(json!(5)).kwarg("b", json!(7)),
/// )
/// .unwrap();
/// assert_eq!(args.values(), &[json!(5), json!(7)]);
///
/// let bad = checker::validate_arguments(
///     &signature,
///     CallArguments::new().kwarg("a", json!(5)).kwarg("b", json!("hello")),
/// );
/// assert!(bad.is_err());
/// ```
pub fn validate_arguments(signature: &MethodSignature, args: CallArguments) -> Result<Arguments> {
    let CallArguments {
        positional,
        mut named,
    } = args;
    let declared = signature.parameters();

    if positional.len() > declared.len() && !signature.accepts_extra_positional() {
        return Err(Error::InvalidParams(ParamsViolation::new(format!(
            "Too many positional parameters: expected at most {}, got {}",
            declared.len(),
            positional.len()
        ))));
    }

    let mut positional = positional.into_iter();
    let mut bound = Arguments {
        names: Vec::with_capacity(declared.len()),
        values: Vec::with_capacity(declared.len()),
        ..Arguments::default()
    };

    for parameter in declared {
        let by_position = positional.next();
        let by_name = named.remove(&parameter.name);

        let value = match (by_position, by_name) {
            (Some(_), Some(_)) => {
                return Err(Error::InvalidParams(ParamsViolation::for_parameter(
                    format!(
                        "Parameter '{}' supplied both by position and by name",
                        parameter.name
                    ),
                    parameter.name.clone(),
                )))
            }
            (Some(value), None) | (None, Some(value)) => {
                if !parameter.ty.matches(&value) {
                    return Err(Error::InvalidParams(ParamsViolation::type_mismatch(
                        parameter.name.clone(),
                        parameter.ty.name(),
                        &value,
                    )));
                }
                value
            }
            (None, None) => match &parameter.default {
                Some(default) => default.clone(),
                None => {
                    return Err(Error::InvalidParams(ParamsViolation::for_parameter(
                        format!("Missing required parameter '{}'", parameter.name),
                        parameter.name.clone(),
                    )))
                }
            },
        };

        bound.names.push(parameter.name.clone());
        bound.values.push(value);
    }

    bound.extra_positional = positional.collect();

    if !named.is_empty() {
        if !signature.accepts_extra_named() {
            if let Some(unexpected) = named.keys().next() {
                return Err(Error::InvalidParams(ParamsViolation::for_parameter(
                    format!("Unexpected parameter '{}'", unexpected),
                    unexpected.clone(),
                )));
            }
        }
        bound.extra_named = named;
    }

    Ok(bound)
}

/// Check a handler's result against the declared return type
///
/// A mismatch is the server's fault, so it is reported as
/// `Error::InvalidReturnType` and surfaces as an internal error.
pub fn validate_return(signature: &MethodSignature, value: &Value) -> Result<()> {
    let expected = signature.return_type();
    if expected.matches(value) {
        Ok(())
    } else {
        Err(Error::InvalidReturnType(format!(
            "Return value {} is not of expected type {}",
            value, expected
        )))
    }
}
