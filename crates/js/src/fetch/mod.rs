//! `fetch`, `Response` and `Headers`.
//!
//! `fetch` starts a host task synchronously and hands back a [`FetchTask`]
//! future that polls the host until the task reaches a terminal outcome.

mod headers;
mod response;
mod task;

pub use headers::Headers;
pub use response::{FetchReply, Response, ResponseInit};
pub use task::{FetchState, FetchTask};

use log::debug;

use crate::bindings::{JSError, JSValue};
use crate::bridge::HostBridge;

/// Request options accepted by [`Fetch::fetch`].
#[derive(Clone, Debug, Default)]
pub struct FetchOptions {
    /// Defaults to `GET`; always sent upper-cased.
    pub method: Option<String>,
    pub headers: Headers,
    /// Opaque string body.
    pub body: Option<String>,
}

impl FetchOptions {
    pub fn method(mut self, method: &str) -> Self {
        self.method = Some(method.to_string());
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.set(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// The `fetch` global.
#[derive(Clone, Debug)]
pub struct Fetch {
    bridge: HostBridge,
}

impl Fetch {
    pub fn new(bridge: HostBridge) -> Self {
        Self { bridge }
    }

    /// Start a request. A request the host refuses to start yields a task
    /// that resolves to a network error on its first poll.
    pub fn fetch(&self, url: &str, options: FetchOptions) -> FetchTask {
        let method = options
            .method
            .as_deref()
            .unwrap_or("GET")
            .to_ascii_uppercase();
        let started = self.bridge.call(
            "fetch",
            "start",
            vec![
                JSValue::from(url),
                JSValue::from(method.as_str()),
                JSValue::String(options.headers.to_json()),
                JSValue::String(options.body.unwrap_or_default()),
            ],
        );
        match started {
            Ok(JSValue::String(id)) => {
                debug!("fetch {method} {url} started as task {id}");
                FetchTask::pending(self.bridge.clone(), id)
            }
            Ok(JSValue::Number(id)) => {
                let id = crate::bindings::number_to_string(id);
                debug!("fetch {method} {url} started as task {id}");
                FetchTask::pending(self.bridge.clone(), id)
            }
            Ok(other) => FetchTask::failed(
                self.bridge.clone(),
                JSError::InternalError(format!("fetch.start returned a {}", other.type_of())),
            ),
            Err(failure) => {
                debug!("fetch {method} {url} was refused: {}", failure.message);
                FetchTask::failed(self.bridge.clone(), failure.into_error(JSError::Network))
            }
        }
    }
}
