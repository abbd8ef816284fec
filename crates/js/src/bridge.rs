//! Typed boundary over the injected native call table.
//!
//! The host reports failures through two channels: a host function returning
//! `Err`, and an in-band reply. Only `encoding.decode` and `encoding.atob`
//! report in-band with a `"ERROR: "` prefixed string; the url calls reply with
//! a JSON object carrying an `error` field. Both are folded into
//! [`HostFailure`] here so no other module branches on reply text.

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::bindings::{HostBindings, JSError, JSValue};

/// Prefix the host uses for in-band failures.
const ERROR_SENTINEL: &str = "ERROR: ";

/// The calls whose string replies may carry the sentinel. Every other string
/// reply is content, even when it starts with the prefix.
const SENTINEL_CALLS: &[(&str, &str)] = &[("encoding", "decode"), ("encoding", "atob")];

/// Every function the core calls, as `(namespace, function)`.
pub const REQUIRED_CALLS: &[(&str, &str)] = &[
    ("encoding", "encode"),
    ("encoding", "decode"),
    ("encoding", "decodeLossy"),
    ("encoding", "btoa"),
    ("encoding", "atob"),
    ("url", "parse"),
    ("url", "setComponent"),
    ("fetch", "start"),
    ("fetch", "poll"),
    ("console", "print"),
    ("console", "printError"),
    ("fs", "readFileSync"),
    ("fs", "readTextFileSync"),
    ("fs", "writeFileSync"),
    ("fs", "writeTextFileSync"),
    ("fs", "pathFromUrl"),
    ("fs", "existsSync"),
    ("fs", "statSync"),
    ("fs", "readdirSync"),
    ("fs", "mkdirSync"),
    ("fs", "removeSync"),
    ("fs", "copyFileSync"),
    ("process", "env"),
    ("process", "envGet"),
    ("process", "envSet"),
    ("process", "envDelete"),
    ("process", "envHas"),
    ("process", "argv"),
    ("process", "exit"),
];

/// A failed host call, whichever channel reported it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostFailure {
    /// The call that failed, as `namespace.function`.
    pub call: String,
    /// The host's message, without any sentinel prefix or error name.
    pub message: String,
    /// The error the host raised, when it was raised rather than returned in-band.
    pub raised: Option<JSError>,
}

impl HostFailure {
    fn in_band(call: String, message: &str) -> Self {
        Self {
            call,
            message: message.to_string(),
            raised: None,
        }
    }

    /// Map to a guest error, keeping host-raised internal errors as they are.
    pub fn into_error(self, wrap: impl FnOnce(String) -> JSError) -> JSError {
        match self.raised {
            Some(error @ JSError::InternalError(_)) => error,
            _ => wrap(self.message),
        }
    }
}

/// The native call table, shared by every component that needs the host.
#[derive(Clone)]
pub struct HostBridge {
    bindings: Arc<HostBindings>,
}

impl Debug for HostBridge {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostBridge")
            .field("namespaces", &self.bindings.namespaces.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl HostBridge {
    /// Wrap an injected call table.
    pub fn new(bindings: HostBindings) -> Self {
        Self {
            bindings: Arc::new(bindings),
        }
    }

    /// The underlying table.
    pub fn bindings(&self) -> &HostBindings {
        &self.bindings
    }

    /// Required calls the table does not provide, as `namespace.function`.
    pub fn missing_calls(&self) -> Vec<String> {
        REQUIRED_CALLS
            .iter()
            .filter(|(namespace, function)| self.bindings.function(namespace, function).is_none())
            .map(|(namespace, function)| format!("{namespace}.{function}"))
            .collect()
    }

    /// Invoke `namespace.function`.
    ///
    /// # Errors
    /// Returns a [`HostFailure`] when the call is missing or the host raised an error.
    pub fn call(
        &self,
        namespace: &str,
        function: &str,
        args: Vec<JSValue>,
    ) -> Result<JSValue, HostFailure> {
        let call = format!("{namespace}.{function}");
        let Some(host_fn) = self.bindings.function(namespace, function) else {
            return Err(HostFailure {
                message: format!("host call {call} is not available"),
                raised: Some(JSError::InternalError(format!("missing host call {call}"))),
                call,
            });
        };
        host_fn.call(args).map_err(|error| {
            debug!("host call {call} raised {error}");
            HostFailure {
                message: error.message(),
                raised: Some(error),
                call,
            }
        })
    }

    /// Invoke a call whose reply is a string, taken verbatim.
    ///
    /// # Errors
    /// Returns a [`HostFailure`] for raised errors and non-string replies.
    pub fn call_string(
        &self,
        namespace: &str,
        function: &str,
        args: Vec<JSValue>,
    ) -> Result<String, HostFailure> {
        match self.call(namespace, function, args)? {
            JSValue::String(text) => Ok(text),
            other => Err(unexpected_reply(format!("{namespace}.{function}"), &other)),
        }
    }

    /// Invoke a call whose reply is a byte buffer or a byte view.
    ///
    /// # Errors
    /// Returns a [`HostFailure`] for raised errors and replies that hold no bytes.
    pub fn call_bytes(
        &self,
        namespace: &str,
        function: &str,
        args: Vec<JSValue>,
    ) -> Result<Vec<u8>, HostFailure> {
        match self.call(namespace, function, args)? {
            JSValue::ArrayBuffer(bytes) => Ok(bytes),
            JSValue::View(view) => Ok(view.bytes),
            other => Err(unexpected_reply(format!("{namespace}.{function}"), &other)),
        }
    }

    /// Invoke `encoding.decode` or `encoding.atob`, whose string replies may
    /// carry the `"ERROR: "` sentinel. For any other call this is
    /// [`HostBridge::call_string`].
    ///
    /// # Errors
    /// Returns a [`HostFailure`] for raised errors, sentinel replies, and non-string replies.
    pub fn call_text(
        &self,
        namespace: &str,
        function: &str,
        args: Vec<JSValue>,
    ) -> Result<String, HostFailure> {
        let text = self.call_string(namespace, function, args)?;
        if !SENTINEL_CALLS.contains(&(namespace, function)) {
            return Ok(text);
        }
        match text.strip_prefix(ERROR_SENTINEL) {
            Some(message) => Err(HostFailure::in_band(
                format!("{namespace}.{function}"),
                message,
            )),
            None => Ok(text),
        }
    }

    /// Invoke a call whose reply is JSON text, decoding it into `T`.
    /// An object reply carrying a non-empty `error` field is a failure.
    ///
    /// # Errors
    /// Returns a [`HostFailure`] for raised errors, `{"error": ...}` replies and
    /// replies that do not decode as `T`.
    pub fn call_json<T: DeserializeOwned>(
        &self,
        namespace: &str,
        function: &str,
        args: Vec<JSValue>,
    ) -> Result<T, HostFailure> {
        let text = self.call_string(namespace, function, args)?;
        decode_json(format!("{namespace}.{function}"), &text)
    }

    /// Invoke a call that may reply with nothing (`null`, `undefined`, or `""`).
    ///
    /// # Errors
    /// Same as [`HostBridge::call_json`].
    pub fn call_json_optional<T: DeserializeOwned>(
        &self,
        namespace: &str,
        function: &str,
        args: Vec<JSValue>,
    ) -> Result<Option<T>, HostFailure> {
        let call = format!("{namespace}.{function}");
        match self.call(namespace, function, args)? {
            JSValue::Null | JSValue::Undefined => Ok(None),
            JSValue::String(text) if text.is_empty() => Ok(None),
            JSValue::String(text) => decode_json(call, &text).map(Some),
            other => Err(unexpected_reply(call, &other)),
        }
    }

    /// Invoke a call whose reply is ignored.
    ///
    /// # Errors
    /// Returns a [`HostFailure`] when the host raised an error.
    pub fn call_unit(
        &self,
        namespace: &str,
        function: &str,
        args: Vec<JSValue>,
    ) -> Result<(), HostFailure> {
        self.call(namespace, function, args).map(|_| ())
    }

    /// Read the constant property `namespace.name`.
    pub fn property(&self, namespace: &str, name: &str) -> Option<&JSValue> {
        self.bindings.property(namespace, name)
    }
}

fn decode_json<T: DeserializeOwned>(call: String, text: &str) -> Result<T, HostFailure> {
    let value: Value = serde_json::from_str(text).map_err(|error| {
        warn!("host call {call} replied with invalid JSON: {error}");
        HostFailure::in_band(call.clone(), &format!("invalid host reply: {error}"))
    })?;
    if let Some(message) = value.as_object().and_then(|object| object.get("error")) {
        let message = match message {
            Value::Null => None,
            Value::String(text) if text.is_empty() => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        };
        if let Some(message) = message {
            return Err(HostFailure::in_band(call, &message));
        }
    }
    serde_json::from_value(value)
        .map_err(|error| HostFailure::in_band(call, &format!("invalid host reply: {error}")))
}

fn unexpected_reply(call: String, reply: &JSValue) -> HostFailure {
    let message = format!("host call {call} replied with a {}", reply.type_of());
    HostFailure {
        raised: Some(JSError::InternalError(message.clone())),
        message,
        call,
    }
}
