//! The native side of the shim: a [`HostBindings`] call table whose
//! namespaces do the real parsing, encoding and I/O.
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! let runtime = tokio::runtime::Runtime::new()?;
//! let config = js_host::HostConfig::from_env();
//! let context = js_host::HostContext::new(config, runtime.handle().clone())?;
//! let shim = js_shim::Runtime::new(js_host::build_host_bindings(&context))?;
//! shim.console().log(&["ready".into()])?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::env;
use std::sync::{Arc, Mutex};

use anyhow::{Context as _, Result};
use js_shim::HostBindings;
use log::debug;
use tokio::runtime::Handle;

pub mod config;
pub mod console;
pub mod encoding;
pub mod fetch;
pub mod fs;
pub mod logger;
pub mod navigator;
pub mod net;
pub mod process;
pub mod url;
pub mod util;

pub use config::HostConfig;
pub use logger::{ConsoleLogger, HostLogger, LogLevel, StdoutLogger};
pub use net::{FetchDone, FetchEntry, FetchRegistry};

/// Called by `process.exit`.
pub type ExitHandler = dyn Fn(i32) + Send + Sync + 'static;

/// Shared state captured by every host function.
#[derive(Clone)]
pub struct HostContext {
    pub config: Arc<HostConfig>,
    /// Sink for `console.print` and `console.printError`.
    pub logger: Arc<dyn HostLogger>,
    /// Tokio runtime handle for spawning fetch tasks.
    pub tokio_handle: Handle,
    pub client: reqwest::Client,
    /// In-flight and finished fetch tasks, keyed by id.
    pub fetch_registry: Arc<Mutex<FetchRegistry>>,
    /// Environment overlay seen by the guest.
    pub env: Arc<Mutex<BTreeMap<String, String>>>,
    pub argv: Arc<Vec<String>>,
    pub exit_handler: Arc<ExitHandler>,
}

impl HostContext {
    /// Build a context that snapshots the process arguments and environment.
    ///
    /// # Errors
    /// Fails when the HTTP client cannot be constructed.
    pub fn new(config: HostConfig, tokio_handle: Handle) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .context("building the fetch client")?;
        let snapshot: BTreeMap<String, String> = env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect();
        debug!("host context with {} environment entries", snapshot.len());
        Ok(Self {
            config: Arc::new(config),
            logger: Arc::new(StdoutLogger),
            tokio_handle,
            client,
            fetch_registry: Arc::new(Mutex::new(FetchRegistry::default())),
            env: Arc::new(Mutex::new(snapshot)),
            argv: Arc::new(env::args().collect()),
            exit_handler: Arc::new(exit_process),
        })
    }

    pub fn with_logger(mut self, logger: Arc<dyn HostLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_argv(mut self, argv: Vec<String>) -> Self {
        self.argv = Arc::new(argv);
        self
    }

    /// Replace the environment overlay.
    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = Arc::new(Mutex::new(env));
        self
    }

    pub fn with_exit_handler(mut self, handler: Arc<ExitHandler>) -> Self {
        self.exit_handler = handler;
        self
    }

    /// The guest `argv`: the configured script path replaces `argv[1]`.
    pub fn script_argv(&self) -> Vec<String> {
        let mut argv = self.argv.as_ref().clone();
        if let Some(path) = &self.config.script_path {
            match argv.get_mut(1) {
                Some(slot) => slot.clone_from(path),
                None => {
                    if argv.is_empty() {
                        argv.push(String::new());
                    }
                    argv.push(path.clone());
                }
            }
        }
        argv
    }
}

fn exit_process(code: i32) {
    std::process::exit(code)
}

/// Build the complete call table over `context`.
pub fn build_host_bindings(context: &HostContext) -> HostBindings {
    HostBindings::new()
        .with_namespace("encoding", encoding::build_encoding_namespace())
        .with_namespace("url", crate::url::build_url_namespace())
        .with_namespace("fetch", fetch::build_fetch_namespace(context))
        .with_namespace("console", console::build_console_namespace(context))
        .with_namespace("fs", fs::build_fs_namespace())
        .with_namespace("process", process::build_process_namespace(context))
        .with_namespace("navigator", navigator::build_navigator_namespace(context))
}
