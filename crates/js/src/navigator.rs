//! The guest `navigator` object, read from host-provided constants.

use crate::bindings::JSValue;
use crate::bridge::HostBridge;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Navigator {
    pub user_agent: String,
    /// `None` on platforms without a conventional platform string.
    pub platform: Option<String>,
    pub hardware_concurrency: u32,
}

impl Navigator {
    pub fn from_bridge(bridge: &HostBridge) -> Self {
        let text = |name: &str| {
            bridge
                .property("navigator", name)
                .and_then(JSValue::as_str)
                .map(str::to_string)
        };
        let hardware_concurrency = match bridge.property("navigator", "hardwareConcurrency") {
            Some(JSValue::Number(count)) if *count >= 1.0 => *count as u32,
            _ => 1,
        };
        Self {
            user_agent: text("userAgent").unwrap_or_default(),
            platform: text("platform"),
            hardware_concurrency,
        }
    }
}
