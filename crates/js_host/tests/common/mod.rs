//! Host fixtures shared by the integration tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use js_host::{HostConfig, HostContext, HostLogger, LogLevel, build_host_bindings};
use js_shim::Runtime;

/// Records console lines instead of printing them.
#[derive(Default)]
pub struct CaptureLogger {
    pub lines: Mutex<Vec<(LogLevel, String)>>,
}

impl HostLogger for CaptureLogger {
    fn log(&self, level: LogLevel, message: &str) {
        self.lines.lock().unwrap().push((level, message.to_string()));
    }
}

/// A real host with a private tokio runtime, captured console and exit codes.
pub struct Harness {
    pub tokio: tokio::runtime::Runtime,
    pub context: HostContext,
    pub logger: Arc<CaptureLogger>,
    pub exits: Arc<Mutex<Vec<i32>>>,
}

impl Harness {
    pub fn new(config: HostConfig) -> Self {
        init_logging();
        let tokio = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        let logger = Arc::new(CaptureLogger::default());
        let exits = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&exits);
        let env: BTreeMap<String, String> =
            [(String::from("HOME"), String::from("/home/guest"))].into_iter().collect();
        let context = HostContext::new(config, tokio.handle().clone())
            .unwrap()
            .with_logger(Arc::<CaptureLogger>::clone(&logger))
            .with_argv(vec![String::from("shim"), String::from("main.js")])
            .with_env(env)
            .with_exit_handler(Arc::new(move |code: i32| recorded.lock().unwrap().push(code)));
        Self {
            tokio,
            context,
            logger,
            exits,
        }
    }

    pub fn runtime(&self) -> Runtime {
        Runtime::new(build_host_bindings(&self.context)).unwrap()
    }

    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.logger.lines.lock().unwrap().clone()
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
