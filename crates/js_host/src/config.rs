//! Host policy, read from the process environment.

use std::env;

/// Environment variable overriding the user agent.
pub const USER_AGENT_VAR: &str = "SHIM_USER_AGENT";
/// Environment variable controlling `file:` fetches.
pub const ALLOW_FILE_FETCH_VAR: &str = "SHIM_FETCH_ALLOW_FILE";
/// Presence disables colored output.
pub const NO_COLOR_VAR: &str = "NO_COLOR";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostConfig {
    /// Sent with every fetch and exposed as `navigator.userAgent`.
    pub user_agent: String,
    /// Whether `fetch` may read `file:` URLs.
    pub allow_file_fetch: bool,
    /// Exposed as `process.noColor`.
    pub no_color: bool,
    /// Replaces `argv[1]` when set.
    pub script_path: Option<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("js_shim/{}", env!("CARGO_PKG_VERSION")),
            allow_file_fetch: true,
            no_color: false,
            script_path: None,
        }
    }
}

impl HostConfig {
    /// Defaults overridden by `SHIM_USER_AGENT`, `SHIM_FETCH_ALLOW_FILE` and `NO_COLOR`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Like [`HostConfig::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            user_agent: lookup(USER_AGENT_VAR)
                .filter(|agent| !agent.trim().is_empty())
                .unwrap_or(defaults.user_agent),
            allow_file_fetch: lookup(ALLOW_FILE_FETCH_VAR)
                .map_or(defaults.allow_file_fetch, |value| parse_flag(&value)),
            no_color: lookup(NO_COLOR_VAR).is_some(),
            script_path: None,
        }
    }

    pub fn with_script_path(mut self, path: &str) -> Self {
        self.script_path = Some(path.to_string());
        self
    }
}

fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
