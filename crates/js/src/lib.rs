//! Host compatibility shim for an embedded single-threaded script engine.
//!
//! Guest script sees familiar objects (`URL`, `fetch`, `Response`, `Headers`,
//! `TextEncoder`, `TextDecoder`, `btoa`, `atob`, `console`) while every actual
//! parse, encode and I/O operation is performed by the native host through an
//! injected call table ([`HostBindings`]). This crate holds the engine-agnostic
//! value model and the bridging logic; engine adapters register the globals
//! through [`GlobalRegistry`].

/// Engine-agnostic values and the call-table types.
pub mod bindings;
pub use bindings::{
    BufferView, ErrorKind, HostBindings, HostFnKind, HostFnSync, HostNamespace, JSError,
    JSObject, JSValue, PromiseState, TypeDescriptor, ViewKind,
};

pub mod bridge;
pub use bridge::{HostBridge, HostFailure, REQUIRED_CALLS};

pub mod console;
pub use console::{Console, ConsoleStream};

pub mod encoding;
pub use encoding::{Base64, EncodeIntoResult, TextDecoder, TextDecoderOptions, TextEncoder};

pub mod fetch;
pub use fetch::{Fetch, FetchOptions, FetchState, FetchTask, Headers, Response, ResponseInit};

/// Console value formatting.
pub mod format;
pub use format::{format_args, format_value};

pub mod globals;
pub use globals::{HostClass, HostFnAsync, HostObject, HostValue};

pub mod fs;
pub use fs::{Fs, FsPath, Stats, WriteFileOptions};

pub mod navigator;
pub use navigator::Navigator;

pub mod process;
pub use process::{BuildInfo, Process};

pub mod runtime;
pub use runtime::{GlobalRegistry, Runtime};

pub mod scheduler;
pub use scheduler::Scheduler;

pub mod url;
pub use url::{Url, UrlComponent, UrlRecord};
