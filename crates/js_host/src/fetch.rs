//! The `fetch` namespace: asynchronous requests polled by task id.
//!
//! `start` registers a pending entry and spawns the request on the host's
//! tokio runtime; `poll` reports `null` until the entry is terminal, hands the
//! outcome out once, and forgets the task.

use std::sync::Arc;

use js_shim::bindings::{optional_string, parse_string};
use js_shim::{HostFnSync, HostNamespace, JSError, JSValue};
use log::{debug, trace, warn};
use url::Url;

use crate::HostContext;
use crate::net::{FetchDone, FetchEntry, fetch_file, fetch_http};

pub fn build_fetch_namespace(context: &HostContext) -> HostNamespace {
    HostNamespace::new()
        .with_sync_fn("start", build_fetch_start(context.clone()))
        .with_sync_fn("poll", build_fetch_poll(context.clone()))
}

fn poisoned<T>(_: T) -> JSError {
    JSError::InternalError(String::from("mutex poisoned"))
}

/// Why a request is refused before any I/O happens.
fn refusal(context: &HostContext, url_str: &str) -> Result<Url, String> {
    let parsed = Url::parse(url_str).map_err(|error| format!("Invalid URL {url_str}: {error}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        "file" if context.config.allow_file_fetch => Ok(parsed),
        "file" => Err(String::from("Disallowed by policy")),
        scheme => Err(format!("Unsupported scheme: {scheme}")),
    }
}

fn build_fetch_start(context: HostContext) -> Arc<HostFnSync> {
    Arc::new(move |args: Vec<JSValue>| -> Result<JSValue, JSError> {
        let url_str = parse_string(&args, 0, "url")?;
        let method_upper = optional_string(&args, 1, "GET").to_ascii_uppercase();
        let headers_json = optional_string(&args, 2, "{}");
        let body = optional_string(&args, 3, "");

        let id = {
            let mut registry = context.fetch_registry.lock().map_err(poisoned)?;
            let id = registry.allocate_id();
            registry.entries.insert(id, FetchEntry::Pending);
            id
        };
        debug!("fetch task {id}: {method_upper} {url_str}");

        let parsed = match refusal(&context, &url_str) {
            Ok(parsed) => parsed,
            Err(reason) => {
                debug!("fetch task {id} refused: {reason}");
                context
                    .fetch_registry
                    .lock()
                    .map_err(poisoned)?
                    .finish(id, FetchDone::failed(reason));
                return Ok(JSValue::String(id.to_string()));
            }
        };

        let registry = Arc::clone(&context.fetch_registry);
        let client = context.client.clone();
        context.tokio_handle.spawn(async move {
            let result = match parsed.scheme() {
                "file" => fetch_file(&parsed).await,
                _ => {
                    fetch_http(&client, &method_upper, parsed.as_str(), &headers_json, &body)
                        .await
                }
            };
            let done = result.unwrap_or_else(|error| {
                warn!("fetch task {id} failed: {error}");
                FetchDone::failed(error)
            });
            match registry.lock() {
                Ok(mut registry) => registry.finish(id, done),
                Err(_) => warn!("fetch task {id} finished after the registry was poisoned"),
            }
        });

        Ok(JSValue::String(id.to_string()))
    })
}

fn build_fetch_poll(context: HostContext) -> Arc<HostFnSync> {
    Arc::new(move |args: Vec<JSValue>| -> Result<JSValue, JSError> {
        let id: u64 = match args.first() {
            Some(JSValue::String(text)) => text
                .parse()
                .map_err(|_| JSError::TypeError(format!("invalid fetch task id: {text}")))?,
            Some(JSValue::Number(number)) if *number >= 0.0 && number.fract() == 0.0 => {
                *number as u64
            }
            _ => return Err(JSError::TypeError(String::from("fetch task id must be a string"))),
        };
        let mut registry = context.fetch_registry.lock().map_err(poisoned)?;
        match registry.take_done(id) {
            None => Err(JSError::TypeError(format!("unknown fetch task {id}"))),
            Some(FetchEntry::Pending) => {
                trace!("fetch task {id} still pending");
                Ok(JSValue::Null)
            }
            Some(FetchEntry::Done(done)) => {
                debug!("fetch task {id} finished with status {}", done.status);
                Ok(JSValue::String(done.to_reply().to_string()))
            }
        }
    })
}
