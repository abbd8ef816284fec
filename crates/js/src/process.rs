//! The guest `process` object and environment access.

use std::collections::BTreeMap;

use crate::bindings::{JSError, JSValue};
use crate::bridge::{HostBridge, HostFailure};

/// The platform the host was built for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildInfo {
    /// `linux`, `darwin`, `windows`, ...
    pub os: String,
    /// `x86_64`, `aarch64`, ...
    pub arch: String,
}

#[derive(Clone, Debug)]
pub struct Process {
    bridge: HostBridge,
}

fn host_error(failure: HostFailure) -> JSError {
    failure.into_error(JSError::Host)
}

impl Process {
    pub fn new(bridge: HostBridge) -> Self {
        Self { bridge }
    }

    /// Snapshot of the environment.
    ///
    /// # Errors
    /// Returns a host error if the host cannot produce the environment.
    pub fn env(&self) -> Result<BTreeMap<String, String>, JSError> {
        self.bridge
            .call_json("process", "env", Vec::new())
            .map_err(host_error)
    }

    /// # Errors
    /// Returns a host error if the lookup fails.
    pub fn env_get(&self, key: &str) -> Result<Option<String>, JSError> {
        match self.bridge.call("process", "envGet", vec![JSValue::from(key)]) {
            Ok(JSValue::String(value)) => Ok(Some(value)),
            Ok(_) => Ok(None),
            Err(failure) => Err(host_error(failure)),
        }
    }

    /// # Errors
    /// Returns a host error if the host refuses the update.
    pub fn env_set(&self, key: &str, value: &str) -> Result<(), JSError> {
        self.bridge
            .call_unit("process", "envSet", vec![JSValue::from(key), JSValue::from(value)])
            .map_err(host_error)
    }

    /// # Errors
    /// Returns a host error if the host refuses the update.
    pub fn env_delete(&self, key: &str) -> Result<(), JSError> {
        self.bridge
            .call_unit("process", "envDelete", vec![JSValue::from(key)])
            .map_err(host_error)
    }

    /// # Errors
    /// Returns a host error if the lookup fails.
    pub fn env_has(&self, key: &str) -> Result<bool, JSError> {
        match self.bridge.call("process", "envHas", vec![JSValue::from(key)]) {
            Ok(JSValue::Boolean(present)) => Ok(present),
            Ok(_) => Ok(false),
            Err(failure) => Err(host_error(failure)),
        }
    }

    /// # Errors
    /// Returns a host error if the host cannot produce the arguments.
    pub fn argv(&self) -> Result<Vec<String>, JSError> {
        self.bridge
            .call_json("process", "argv", Vec::new())
            .map_err(host_error)
    }

    /// Ask the host to terminate with `code`.
    ///
    /// # Errors
    /// Returns a host error if the host handler fails instead of exiting.
    pub fn exit(&self, code: i32) -> Result<(), JSError> {
        self.bridge
            .call_unit("process", "exit", vec![JSValue::Number(f64::from(code))])
            .map_err(host_error)
    }

    /// Host OS and architecture; `unknown` for whatever the host leaves out.
    pub fn build(&self) -> BuildInfo {
        let text = |name: &str| {
            self.bridge
                .property("process", name)
                .and_then(JSValue::as_str)
                .unwrap_or("unknown")
                .to_string()
        };
        BuildInfo {
            os: text("os"),
            arch: text("arch"),
        }
    }

    /// Whether the host asked for colorless output.
    pub fn no_color(&self) -> bool {
        matches!(
            self.bridge.property("process", "noColor"),
            Some(JSValue::Boolean(true))
        )
    }
}
