//! Engine-agnostic call table for host-provided functions and properties.
//!
//! A host builds a [`HostBindings`] out of named [`HostNamespace`]s; the shim
//! only ever reaches native functionality through that table.

use std::collections::BTreeMap;
use std::sync::Arc;

mod values;
pub use values::{
    BufferView, ErrorKind, JSError, JSObject, JSValue, MAX_VALUE_DEPTH, PromiseState,
    TypeDescriptor, ViewKind, iso_date, number_to_string,
};

/// A synchronous host function signature.
pub type HostFnSync = dyn Fn(Vec<JSValue>) -> Result<JSValue, JSError> + Send + Sync + 'static;

/// A single function descriptor the engine adapter can install.
#[derive(Clone)]
pub enum HostFnKind {
    /// Synchronous function.
    Sync(Arc<HostFnSync>),
}

impl HostFnKind {
    /// Invoke the function.
    ///
    /// # Errors
    /// Returns whatever error the host function raised.
    pub fn call(&self, args: Vec<JSValue>) -> Result<JSValue, JSError> {
        match self {
            Self::Sync(function) => function(args),
        }
    }
}

/// A namespaced set of functions and properties (for example, the `console` object).
#[derive(Clone, Default)]
pub struct HostNamespace {
    /// Functions to install under this namespace.
    pub functions: BTreeMap<String, HostFnKind>,
    /// Constant properties to install under this namespace.
    pub properties: BTreeMap<String, JSValue>,
}

impl HostNamespace {
    /// Create an empty namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a synchronous function.
    pub fn with_sync_fn(mut self, name: &str, function: Arc<HostFnSync>) -> Self {
        self.functions
            .insert(name.to_string(), HostFnKind::Sync(function));
        self
    }

    /// Register a constant property.
    pub fn with_property(mut self, name: &str, value: JSValue) -> Self {
        self.properties.insert(name.to_string(), value);
        self
    }
}

/// A collection of namespaces: the native call table.
#[derive(Clone, Default)]
pub struct HostBindings {
    /// Mapping from namespace name to its definitions.
    pub namespaces: BTreeMap<String, HostNamespace>,
}

impl HostBindings {
    /// Create empty bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a namespace.
    pub fn with_namespace(mut self, name: &str, namespace: HostNamespace) -> Self {
        self.namespaces.insert(name.to_string(), namespace);
        self
    }

    /// Look up `namespace.function`.
    pub fn function(&self, namespace: &str, name: &str) -> Option<&HostFnKind> {
        self.namespaces.get(namespace)?.functions.get(name)
    }

    /// Look up the constant property `namespace.name`.
    pub fn property(&self, namespace: &str, name: &str) -> Option<&JSValue> {
        self.namespaces.get(namespace)?.properties.get(name)
    }
}

/// Require argument `index` to be a string.
///
/// # Errors
/// Returns a `TypeError` naming the argument when it is missing or not a string.
pub fn parse_string(args: &[JSValue], index: usize, name: &str) -> Result<String, JSError> {
    match args.get(index) {
        Some(JSValue::String(text)) => Ok(text.clone()),
        _ => Err(JSError::TypeError(format!("{name} must be a string"))),
    }
}

/// Require argument `index` to hold bytes: an `ArrayBuffer`, a byte view, or
/// an array of numbers.
///
/// # Errors
/// Returns a `TypeError` naming the argument for any other value.
pub fn parse_bytes(args: &[JSValue], index: usize, name: &str) -> Result<Vec<u8>, JSError> {
    match args.get(index) {
        Some(JSValue::ArrayBuffer(bytes)) => Ok(bytes.clone()),
        Some(JSValue::View(view)) => Ok(view.bytes.clone()),
        Some(JSValue::Array(items)) => items
            .iter()
            .map(|item| match item {
                JSValue::Number(byte) if (0.0..=255.0).contains(byte) => Ok(*byte as u8),
                _ => Err(JSError::TypeError(format!("{name} must hold bytes"))),
            })
            .collect(),
        _ => Err(JSError::TypeError(format!("{name} must be a byte buffer"))),
    }
}

/// Read argument `index` as a string, falling back to `default` when absent.
pub fn optional_string(args: &[JSValue], index: usize, default: &str) -> String {
    match args.get(index) {
        Some(JSValue::String(text)) => text.clone(),
        _ => default.to_string(),
    }
}

/// Read argument `index` as a boolean flag using guest truthiness for the
/// common primitive cases.
pub fn optional_flag(args: &[JSValue], index: usize) -> bool {
    match args.get(index) {
        Some(JSValue::Boolean(flag)) => *flag,
        Some(JSValue::Number(number)) => *number != 0.0 && !number.is_nan(),
        Some(JSValue::String(text)) => !text.is_empty(),
        Some(JSValue::Undefined | JSValue::Null) | None => false,
        Some(_) => true,
    }
}
