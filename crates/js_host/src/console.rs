//! The `console` namespace: formatted lines go to the host logger.

use std::sync::Arc;

use js_shim::{HostFnSync, HostNamespace, JSError, JSValue};

use crate::HostContext;
use crate::logger::LogLevel;

pub fn build_console_namespace(context: &HostContext) -> HostNamespace {
    HostNamespace::new()
        .with_sync_fn("print", make_print_fn(context, LogLevel::Info))
        .with_sync_fn("printError", make_print_fn(context, LogLevel::Error))
}

fn make_print_fn(context: &HostContext, level: LogLevel) -> Arc<HostFnSync> {
    let logger = Arc::clone(&context.logger);
    Arc::new(move |args: Vec<JSValue>| -> Result<JSValue, JSError> {
        let line = args
            .iter()
            .map(JSValue::to_display_string)
            .collect::<Vec<_>>()
            .join(" ");
        logger.log(level, &line);
        Ok(JSValue::Undefined)
    })
}
