//! The `process` namespace.
//!
//! The environment is an overlay snapshot taken when the host context is
//! built; guest updates never reach the real process environment.

use std::collections::BTreeMap;
use std::sync::Arc;

use js_shim::bindings::parse_string;
use js_shim::{HostFnSync, HostNamespace, JSError, JSValue};
use log::debug;

use crate::HostContext;

pub fn build_process_namespace(context: &HostContext) -> HostNamespace {
    HostNamespace::new()
        .with_sync_fn("env", build_env(context))
        .with_sync_fn("envGet", build_env_get(context))
        .with_sync_fn("envSet", build_env_set(context))
        .with_sync_fn("envDelete", build_env_delete(context))
        .with_sync_fn("envHas", build_env_has(context))
        .with_sync_fn("argv", build_argv(context))
        .with_sync_fn("exit", build_exit(context))
        .with_property("noColor", JSValue::Boolean(context.config.no_color))
        .with_property("os", JSValue::from(build_os()))
        .with_property("arch", JSValue::from(std::env::consts::ARCH))
}

/// Operating system name in the form scripts expect (`darwin`, not `macos`).
pub fn build_os() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

fn poisoned<T>(_: T) -> JSError {
    JSError::InternalError(String::from("mutex poisoned"))
}

fn build_env(context: &HostContext) -> Arc<HostFnSync> {
    let env = Arc::clone(&context.env);
    Arc::new(move |_args: Vec<JSValue>| -> Result<JSValue, JSError> {
        let snapshot: BTreeMap<String, String> = env.lock().map_err(poisoned)?.clone();
        serde_json::to_string(&snapshot)
            .map(JSValue::String)
            .map_err(|error| JSError::InternalError(error.to_string()))
    })
}

fn build_env_get(context: &HostContext) -> Arc<HostFnSync> {
    let env = Arc::clone(&context.env);
    Arc::new(move |args: Vec<JSValue>| -> Result<JSValue, JSError> {
        let key = parse_string(&args, 0, "key")?;
        Ok(env
            .lock()
            .map_err(poisoned)?
            .get(&key)
            .map_or(JSValue::Null, |value| JSValue::String(value.clone())))
    })
}

fn build_env_set(context: &HostContext) -> Arc<HostFnSync> {
    let env = Arc::clone(&context.env);
    Arc::new(move |args: Vec<JSValue>| -> Result<JSValue, JSError> {
        let key = parse_string(&args, 0, "key")?;
        let value = args
            .get(1)
            .map_or_else(String::new, JSValue::to_display_string);
        env.lock().map_err(poisoned)?.insert(key, value);
        Ok(JSValue::Undefined)
    })
}

fn build_env_delete(context: &HostContext) -> Arc<HostFnSync> {
    let env = Arc::clone(&context.env);
    Arc::new(move |args: Vec<JSValue>| -> Result<JSValue, JSError> {
        let key = parse_string(&args, 0, "key")?;
        env.lock().map_err(poisoned)?.remove(&key);
        Ok(JSValue::Undefined)
    })
}

fn build_env_has(context: &HostContext) -> Arc<HostFnSync> {
    let env = Arc::clone(&context.env);
    Arc::new(move |args: Vec<JSValue>| -> Result<JSValue, JSError> {
        let key = parse_string(&args, 0, "key")?;
        Ok(JSValue::Boolean(env.lock().map_err(poisoned)?.contains_key(&key)))
    })
}

fn build_argv(context: &HostContext) -> Arc<HostFnSync> {
    let argv = context.script_argv();
    Arc::new(move |_args: Vec<JSValue>| -> Result<JSValue, JSError> {
        serde_json::to_string(&argv)
            .map(JSValue::String)
            .map_err(|error| JSError::InternalError(error.to_string()))
    })
}

fn build_exit(context: &HostContext) -> Arc<HostFnSync> {
    let handler = Arc::clone(&context.exit_handler);
    Arc::new(move |args: Vec<JSValue>| -> Result<JSValue, JSError> {
        let code = match args.first() {
            Some(JSValue::Number(code)) if code.is_finite() => *code as i32,
            _ => 0,
        };
        debug!("guest requested exit with code {code}");
        handler(code);
        Ok(JSValue::Undefined)
    })
}
