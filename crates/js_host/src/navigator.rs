//! The `navigator` namespace: constants describing the host.

use js_shim::{HostNamespace, JSValue};

use crate::HostContext;

pub fn build_navigator_namespace(context: &HostContext) -> HostNamespace {
    let namespace = HostNamespace::new()
        .with_property("userAgent", JSValue::String(context.config.user_agent.clone()))
        .with_property(
            "hardwareConcurrency",
            JSValue::Number(num_cpus::get().max(1) as f64),
        );
    match platform() {
        Some(platform) => namespace.with_property("platform", JSValue::from(platform)),
        None => namespace,
    }
}

/// The conventional browser platform string for this build target.
pub fn platform() -> Option<&'static str> {
    if cfg!(target_os = "macos") {
        Some("MacIntel")
    } else if cfg!(target_os = "windows") {
        Some("Win32")
    } else if cfg!(all(target_os = "linux", target_arch = "x86_64")) {
        Some("Linux x86_64")
    } else if cfg!(all(target_os = "linux", target_arch = "aarch64")) {
        Some("Linux armv81")
    } else {
        None
    }
}
