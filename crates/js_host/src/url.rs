//! The `url` namespace: WHATWG parsing and component setters via `url::quirks`.

use std::sync::Arc;

use js_shim::bindings::parse_string;
use js_shim::{HostFnSync, HostNamespace, JSError, JSValue};
use serde_json::{Value, json};
use url::{Url, quirks};

pub fn build_url_namespace() -> HostNamespace {
    HostNamespace::new()
        .with_sync_fn("parse", build_parse())
        .with_sync_fn("setComponent", build_set_component())
}

fn build_parse() -> Arc<HostFnSync> {
    Arc::new(|args: Vec<JSValue>| -> Result<JSValue, JSError> {
        let input = parse_string(&args, 0, "url")?;
        let base = match args.get(1) {
            Some(JSValue::String(base)) => base.clone(),
            _ => String::new(),
        };
        let reply = match parse_with_base(&input, &base) {
            Ok(parsed) => record(&parsed),
            Err(message) => json!({ "error": message }),
        };
        Ok(JSValue::String(reply.to_string()))
    })
}

fn build_set_component() -> Arc<HostFnSync> {
    Arc::new(|args: Vec<JSValue>| -> Result<JSValue, JSError> {
        let href = parse_string(&args, 0, "href")?;
        let component = parse_string(&args, 1, "component")?;
        let value = parse_string(&args, 2, "value")?;
        let reply = match Url::parse(&href) {
            Ok(mut parsed) => match set_component(&mut parsed, &component, &value) {
                Ok(()) => record(&parsed),
                Err(message) => json!({ "error": message }),
            },
            Err(error) => json!({ "error": format!("Invalid URL: {error}") }),
        };
        Ok(JSValue::String(reply.to_string()))
    })
}

fn parse_with_base(input: &str, base: &str) -> Result<Url, String> {
    let parsed = if base.is_empty() {
        Url::parse(input)
    } else {
        let base_url = Url::parse(base).map_err(|error| format!("Invalid base URL: {error}"))?;
        base_url.join(input)
    };
    parsed.map_err(|error| format!("Invalid URL: {error}"))
}

fn set_component(target: &mut Url, component: &str, value: &str) -> Result<(), String> {
    let rejected = |_| format!("Invalid {component}: {value}");
    match component {
        "href" => quirks::set_href(target, value).map_err(|error| format!("Invalid URL: {error}")),
        "protocol" => quirks::set_protocol(target, value).map_err(rejected),
        "username" => quirks::set_username(target, value).map_err(rejected),
        "password" => quirks::set_password(target, value).map_err(rejected),
        "host" => quirks::set_host(target, value).map_err(rejected),
        "hostname" => quirks::set_hostname(target, value).map_err(rejected),
        "port" => quirks::set_port(target, value).map_err(rejected),
        "pathname" => {
            quirks::set_pathname(target, value);
            Ok(())
        }
        "search" => {
            quirks::set_search(target, value);
            Ok(())
        }
        "hash" => {
            quirks::set_hash(target, value);
            Ok(())
        }
        other => Err(format!("Unknown URL component: {other}")),
    }
}

/// The canonical decomposition sent back to the shim.
fn record(parsed: &Url) -> Value {
    json!({
        "href": quirks::href(parsed),
        "origin": quirks::origin(parsed),
        "protocol": quirks::protocol(parsed),
        "username": quirks::username(parsed),
        "password": quirks::password(parsed),
        "host": quirks::host(parsed),
        "hostname": quirks::hostname(parsed),
        "port": quirks::port(parsed),
        "pathname": quirks::pathname(parsed),
        "search": quirks::search(parsed),
        "hash": quirks::hash(parsed),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_input_needs_a_base() {
        assert!(parse_with_base("/a", "").is_err());
        let joined = parse_with_base("../c?d", "https://example.com/a/b/").unwrap();
        assert_eq!(joined.as_str(), "https://example.com/a/c?d");
    }

    #[test]
    fn opaque_origins_serialize_as_null() {
        let parsed = Url::parse("data:text/plain,hi").unwrap();
        assert_eq!(record(&parsed)["origin"], "null");
    }

    #[test]
    fn unknown_components_are_rejected() {
        let mut parsed = Url::parse("https://example.com/").unwrap();
        assert_eq!(
            set_component(&mut parsed, "query", "x"),
            Err(String::from("Unknown URL component: query"))
        );
    }
}
