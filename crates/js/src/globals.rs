//! Guest classes and the async `fetch` global.
//!
//! A class is a constructor that builds a Rust value implementing
//! [`HostObject`]. The engine adapter owns each instance and forwards property
//! reads, property writes and method calls to it; nothing is shared between
//! instances.

use std::collections::BTreeMap;
use std::fmt::{self, Debug, Formatter};

use futures::FutureExt as _;
use futures::future::LocalBoxFuture;
use serde_json::Value;

use crate::bindings::{BufferView, JSError, JSObject, JSValue, TypeDescriptor};
use crate::bridge::HostBridge;
use crate::encoding::{TextDecoder, TextDecoderOptions, TextEncoder};
use crate::fetch::{Fetch, FetchOptions, Headers, Response, ResponseInit};
use crate::url::{Url, UrlComponent};

/// What a constructor, getter or method hands back to the engine.
pub enum HostValue {
    Value(JSValue),
    /// A new host-backed instance, such as the `Response` a fetch resolves to.
    Object(Box<dyn HostObject>),
}

impl HostValue {
    /// Plain data, with host-backed instances reduced to their snapshot.
    pub fn into_value(self) -> JSValue {
        match self {
            Self::Value(value) => value,
            Self::Object(object) => object.snapshot(),
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut dyn HostObject> {
        match self {
            Self::Object(object) => Some(object.as_mut()),
            Self::Value(_) => None,
        }
    }
}

impl From<JSValue> for HostValue {
    fn from(value: JSValue) -> Self {
        Self::Value(value)
    }
}

impl Debug for HostValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Object(object) => f.debug_tuple("Object").field(&object.snapshot()).finish(),
        }
    }
}

/// A guest instance backed by a Rust value.
pub trait HostObject {
    fn class(&self) -> TypeDescriptor;

    /// Read a property. `None` when the object has no such property.
    fn property(&self, name: &str) -> Option<HostValue>;

    /// Write a property. `Ok(false)` leaves the write to the engine.
    ///
    /// # Errors
    /// Returns the error the guest assignment throws.
    fn set_property(&mut self, name: &str, value: &JSValue) -> Result<bool, JSError> {
        let _ = (name, value);
        Ok(false)
    }

    /// Call a method. Arguments are mutable so methods such as `encodeInto`
    /// can fill a guest buffer; adapters copy them back after the call.
    ///
    /// # Errors
    /// Returns the error the guest call throws.
    fn call_method(&mut self, method: &str, args: &mut [JSValue]) -> Result<HostValue, JSError>;

    /// The instance as the console formatter should see it.
    fn snapshot(&self) -> JSValue;
}

pub type HostConstructor = dyn Fn(&[JSValue]) -> Result<Box<dyn HostObject>, JSError>;
pub type HostStaticFn = dyn Fn(&[JSValue]) -> Result<HostValue, JSError>;
pub type HostFnAsync =
    dyn Fn(Vec<JSValue>) -> LocalBoxFuture<'static, Result<HostValue, JSError>>;

/// A guest class: its constructor and static functions.
pub struct HostClass {
    pub descriptor: TypeDescriptor,
    pub constructor: Box<HostConstructor>,
    pub statics: BTreeMap<String, Box<HostStaticFn>>,
}

impl Debug for HostClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostClass")
            .field("descriptor", &self.descriptor)
            .field("statics", &self.statics.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl HostClass {
    pub fn new<F>(name: &str, constructor: F) -> Self
    where
        F: Fn(&[JSValue]) -> Result<Box<dyn HostObject>, JSError> + 'static,
    {
        Self {
            descriptor: TypeDescriptor::new(name),
            constructor: Box::new(constructor),
            statics: BTreeMap::new(),
        }
    }

    pub fn with_static<F>(mut self, name: &str, function: F) -> Self
    where
        F: Fn(&[JSValue]) -> Result<HostValue, JSError> + 'static,
    {
        self.statics.insert(name.to_string(), Box::new(function));
        self
    }

    /// `new Class(...args)`.
    ///
    /// # Errors
    /// Returns whatever the constructor throws.
    pub fn construct(&self, args: &[JSValue]) -> Result<Box<dyn HostObject>, JSError> {
        (self.constructor)(args)
    }

    /// `Class.name(...args)`.
    ///
    /// # Errors
    /// Returns a `TypeError` for an unknown static, or whatever the static throws.
    pub fn call_static(&self, name: &str, args: &[JSValue]) -> Result<HostValue, JSError> {
        let function = self
            .statics
            .get(name)
            .ok_or_else(|| not_a_function(&self.descriptor.name, name))?;
        function(args)
    }
}

fn not_a_function(class: &str, name: &str) -> JSError {
    JSError::TypeError(format!("{class}.{name} is not a function"))
}

fn arg(args: &[JSValue], index: usize) -> &JSValue {
    args.get(index).unwrap_or(&JSValue::Undefined)
}

fn optional_text(value: &JSValue) -> Option<String> {
    match value {
        JSValue::Undefined | JSValue::Null => None,
        other => Some(other.to_display_string()),
    }
}

fn field<'value>(value: &'value JSValue, key: &str) -> Option<&'value JSValue> {
    match value {
        JSValue::Object(object) => object.get(key),
        _ => None,
    }
}

/// Convert a parsed JSON value into guest data.
pub fn json_to_value(value: &Value) -> JSValue {
    match value {
        Value::Null => JSValue::Null,
        Value::Bool(flag) => JSValue::Boolean(*flag),
        Value::Number(number) => JSValue::Number(number.as_f64().unwrap_or(f64::NAN)),
        Value::String(text) => JSValue::String(text.clone()),
        Value::Array(items) => JSValue::Array(items.iter().map(json_to_value).collect()),
        Value::Object(map) => JSValue::Object(map.iter().fold(
            JSObject::plain(),
            |object, (key, item)| object.with(key, json_to_value(item)),
        )),
    }
}

/// `HeadersInit`: nothing, a record of names to values, or a list of pairs.
///
/// # Errors
/// Returns a `TypeError` for anything else.
pub fn headers_from_value(init: &JSValue) -> Result<Headers, JSError> {
    let invalid = || {
        JSError::TypeError(String::from(
            "Failed to construct 'Headers': The provided value is not of type 'HeadersInit'",
        ))
    };
    match init {
        JSValue::Undefined | JSValue::Null => Ok(Headers::new()),
        JSValue::Object(object) => Ok(Headers::from_pairs(
            object
                .properties
                .iter()
                .map(|(name, value)| (name, value.to_display_string())),
        )),
        JSValue::Array(pairs) => {
            let mut headers = Headers::new();
            for pair in pairs {
                match pair {
                    JSValue::Array(entry) if entry.len() == 2 => {
                        let name = entry[0].to_display_string();
                        headers.append(&name, &entry[1].to_display_string());
                    }
                    _ => return Err(invalid()),
                }
            }
            Ok(headers)
        }
        _ => Err(invalid()),
    }
}

fn response_init_from_value(init: &JSValue) -> Result<ResponseInit, JSError> {
    let status = match field(init, "status") {
        None | Some(JSValue::Undefined) => None,
        Some(JSValue::Number(status)) if (200.0..=599.0).contains(status) => Some(*status as u16),
        Some(other) => {
            return Err(JSError::RangeError(format!(
                "The status provided ({}) is outside the range [200, 599].",
                other.to_display_string()
            )));
        }
    };
    Ok(ResponseInit {
        status,
        status_text: field(init, "statusText")
            .and_then(optional_text)
            .unwrap_or_default(),
        headers: headers_from_value(field(init, "headers").unwrap_or(&JSValue::Undefined))?,
    })
}

fn fetch_options_from_value(options: &JSValue) -> Result<FetchOptions, JSError> {
    Ok(FetchOptions {
        method: field(options, "method").and_then(optional_text),
        headers: headers_from_value(field(options, "headers").unwrap_or(&JSValue::Undefined))?,
        body: field(options, "body").and_then(optional_text),
    })
}

/// The request target: a string, or anything with an `href` such as a `URL`.
fn fetch_target(input: &JSValue) -> String {
    field(input, "href").map_or_else(|| input.to_display_string(), JSValue::to_display_string)
}

fn string_list<'item>(items: impl Iterator<Item = &'item str>) -> JSValue {
    JSValue::Array(items.map(JSValue::from).collect())
}

impl HostObject for Url {
    fn class(&self) -> TypeDescriptor {
        TypeDescriptor::new("URL")
    }

    fn property(&self, name: &str) -> Option<HostValue> {
        let record = self.record();
        let text = match name {
            "origin" => &record.origin,
            _ => match UrlComponent::from_name(name)? {
                UrlComponent::Href => &record.href,
                UrlComponent::Protocol => &record.protocol,
                UrlComponent::Username => &record.username,
                UrlComponent::Password => &record.password,
                UrlComponent::Host => &record.host,
                UrlComponent::Hostname => &record.hostname,
                UrlComponent::Port => &record.port,
                UrlComponent::Pathname => &record.pathname,
                UrlComponent::Search => &record.search,
                UrlComponent::Hash => &record.hash,
            },
        };
        Some(JSValue::from(text.as_str()).into())
    }

    fn set_property(&mut self, name: &str, value: &JSValue) -> Result<bool, JSError> {
        let Some(component) = UrlComponent::from_name(name) else {
            return Ok(false);
        };
        self.set(component, &value.to_display_string())?;
        Ok(true)
    }

    fn call_method(&mut self, method: &str, _args: &mut [JSValue]) -> Result<HostValue, JSError> {
        match method {
            "toString" | "toJSON" => Ok(JSValue::from(self.href()).into()),
            other => Err(not_a_function("URL", other)),
        }
    }

    fn snapshot(&self) -> JSValue {
        let record = self.record();
        let object = JSObject::instance_of(HostObject::class(self))
            .with("href", JSValue::from(record.href.as_str()))
            .with("origin", JSValue::from(record.origin.as_str()))
            .with("protocol", JSValue::from(record.protocol.as_str()))
            .with("username", JSValue::from(record.username.as_str()))
            .with("password", JSValue::from(record.password.as_str()))
            .with("host", JSValue::from(record.host.as_str()))
            .with("hostname", JSValue::from(record.hostname.as_str()))
            .with("port", JSValue::from(record.port.as_str()))
            .with("pathname", JSValue::from(record.pathname.as_str()))
            .with("search", JSValue::from(record.search.as_str()))
            .with("hash", JSValue::from(record.hash.as_str()));
        JSValue::Object(object)
    }
}

impl HostObject for Headers {
    fn class(&self) -> TypeDescriptor {
        TypeDescriptor::new("Headers")
    }

    fn property(&self, _name: &str) -> Option<HostValue> {
        None
    }

    fn call_method(&mut self, method: &str, args: &mut [JSValue]) -> Result<HostValue, JSError> {
        let name = arg(args, 0).to_display_string();
        let value = match method {
            "get" => self.get(&name).map_or(JSValue::Null, JSValue::from),
            "has" => JSValue::Boolean(self.has(&name)),
            "set" => {
                self.set(&name, arg(args, 1).to_display_string());
                JSValue::Undefined
            }
            "append" => {
                self.append(&name, &arg(args, 1).to_display_string());
                JSValue::Undefined
            }
            "delete" => {
                self.delete(&name);
                JSValue::Undefined
            }
            "entries" => JSValue::Array(
                self.entries()
                    .map(|(key, item)| string_list([key, item].into_iter()))
                    .collect(),
            ),
            "keys" => string_list(self.keys()),
            "values" => string_list(self.values()),
            other => return Err(not_a_function("Headers", other)),
        };
        Ok(value.into())
    }

    fn snapshot(&self) -> JSValue {
        let object = self
            .entries()
            .fold(JSObject::instance_of(HostObject::class(self)), |object, (name, value)| {
                object.with(name, JSValue::from(value))
            });
        JSValue::Object(object)
    }
}

impl HostObject for Response {
    fn class(&self) -> TypeDescriptor {
        TypeDescriptor::new("Response")
    }

    /// `headers` hands out a copy.
    fn property(&self, name: &str) -> Option<HostValue> {
        let value = match name {
            "status" => JSValue::Number(f64::from(self.status())),
            "statusText" => JSValue::from(self.status_text()),
            "ok" => JSValue::Boolean(self.ok()),
            "bodyUsed" => JSValue::Boolean(self.body_used()),
            "headers" => return Some(HostValue::Object(Box::new(self.headers().clone()))),
            _ => return None,
        };
        Some(value.into())
    }

    fn call_method(&mut self, method: &str, _args: &mut [JSValue]) -> Result<HostValue, JSError> {
        match method {
            "text" => Ok(JSValue::String(self.text()?).into()),
            "json" => Ok(json_to_value(&self.json()?).into()),
            "clone" => Ok(HostValue::Object(Box::new(self.try_clone()?))),
            other => Err(not_a_function("Response", other)),
        }
    }

    fn snapshot(&self) -> JSValue {
        let object = JSObject::instance_of(HostObject::class(self))
            .with("status", JSValue::Number(f64::from(self.status())))
            .with("statusText", JSValue::from(self.status_text()))
            .with("ok", JSValue::Boolean(self.ok()))
            .with("bodyUsed", JSValue::Boolean(self.body_used()))
            .with("headers", self.headers().snapshot());
        JSValue::Object(object)
    }
}

impl HostObject for TextEncoder {
    fn class(&self) -> TypeDescriptor {
        TypeDescriptor::new("TextEncoder")
    }

    fn property(&self, name: &str) -> Option<HostValue> {
        (name == "encoding").then(|| JSValue::from(self.encoding()).into())
    }

    fn call_method(&mut self, method: &str, args: &mut [JSValue]) -> Result<HostValue, JSError> {
        match method {
            "encode" => {
                let bytes = self.encode(arg(args, 0))?;
                Ok(JSValue::View(BufferView::uint8(bytes)).into())
            }
            "encodeInto" => {
                let source = arg(args, 0).to_display_string();
                let destination = match args.get_mut(1) {
                    Some(JSValue::View(view)) => &mut view.bytes,
                    Some(JSValue::ArrayBuffer(bytes)) => bytes,
                    _ => {
                        return Err(JSError::TypeError(String::from(
                            "The destination is not of type 'Uint8Array'",
                        )));
                    }
                };
                let result = self.encode_into(&source, destination)?;
                let object = JSObject::plain()
                    .with("read", JSValue::Number(result.read as f64))
                    .with("written", JSValue::Number(result.written as f64));
                Ok(JSValue::Object(object).into())
            }
            other => Err(not_a_function("TextEncoder", other)),
        }
    }

    fn snapshot(&self) -> JSValue {
        JSValue::Object(
            JSObject::instance_of(HostObject::class(self))
                .with("encoding", JSValue::from(self.encoding())),
        )
    }
}

impl HostObject for TextDecoder {
    fn class(&self) -> TypeDescriptor {
        TypeDescriptor::new("TextDecoder")
    }

    fn property(&self, name: &str) -> Option<HostValue> {
        let value = match name {
            "encoding" => JSValue::from(self.encoding()),
            "fatal" => JSValue::Boolean(self.fatal()),
            "ignoreBOM" => JSValue::Boolean(self.ignore_bom()),
            _ => return None,
        };
        Some(value.into())
    }

    fn call_method(&mut self, method: &str, args: &mut [JSValue]) -> Result<HostValue, JSError> {
        match method {
            "decode" => Ok(JSValue::String(self.decode(arg(args, 0))?).into()),
            other => Err(not_a_function("TextDecoder", other)),
        }
    }

    fn snapshot(&self) -> JSValue {
        JSValue::Object(
            JSObject::instance_of(HostObject::class(self))
                .with("encoding", JSValue::from(self.encoding()))
                .with("fatal", JSValue::Boolean(self.fatal()))
                .with("ignoreBOM", JSValue::Boolean(self.ignore_bom())),
        )
    }
}

fn url_args(args: &[JSValue]) -> (String, Option<String>) {
    (arg(args, 0).to_display_string(), optional_text(arg(args, 1)))
}

/// `URL`, with the static `parse` and `canParse`.
pub fn url_class(bridge: &HostBridge) -> HostClass {
    let construct = bridge.clone();
    let parse = bridge.clone();
    let can_parse = bridge.clone();
    HostClass::new("URL", move |args| {
        let (input, base) = url_args(args);
        let url = Url::parse(&construct, &input, base.as_deref())?;
        Ok(Box::new(url) as Box<dyn HostObject>)
    })
    .with_static("parse", move |args| {
        let (input, base) = url_args(args);
        Ok(Url::try_parse(&parse, &input, base.as_deref())
            .map_or(HostValue::Value(JSValue::Null), |url| HostValue::Object(Box::new(url))))
    })
    .with_static("canParse", move |args| {
        let (input, base) = url_args(args);
        Ok(JSValue::Boolean(Url::can_parse(&can_parse, &input, base.as_deref())).into())
    })
}

pub fn headers_class() -> HostClass {
    HostClass::new("Headers", |args| {
        Ok(Box::new(headers_from_value(arg(args, 0))?) as Box<dyn HostObject>)
    })
}

pub fn response_class() -> HostClass {
    HostClass::new("Response", |args| {
        let init = response_init_from_value(arg(args, 1))?;
        Ok(Box::new(Response::new(optional_text(arg(args, 0)), init)) as Box<dyn HostObject>)
    })
}

pub fn text_encoder_class(bridge: &HostBridge) -> HostClass {
    let bridge = bridge.clone();
    HostClass::new("TextEncoder", move |_args| {
        Ok(Box::new(TextEncoder::new(bridge.clone())) as Box<dyn HostObject>)
    })
}

pub fn text_decoder_class(bridge: &HostBridge) -> HostClass {
    let bridge = bridge.clone();
    HostClass::new("TextDecoder", move |args| {
        let label = optional_text(arg(args, 0));
        let flag = |key: &str| matches!(field(arg(args, 1), key), Some(JSValue::Boolean(true)));
        let options = TextDecoderOptions {
            fatal: flag("fatal"),
            ignore_bom: flag("ignoreBOM"),
        };
        let decoder = TextDecoder::new(bridge.clone(), label.as_deref(), options)?;
        Ok(Box::new(decoder) as Box<dyn HostObject>)
    })
}

/// `fetch(input, options)`: resolves to a `Response` instance.
pub fn fetch_function(bridge: &HostBridge) -> Box<HostFnAsync> {
    let fetch = Fetch::new(bridge.clone());
    Box::new(
        move |args: Vec<JSValue>| -> LocalBoxFuture<'static, Result<HostValue, JSError>> {
            let target = fetch_target(arg(&args, 0));
            let task = fetch_options_from_value(arg(&args, 1))
                .map(|options| fetch.fetch(&target, options));
            async move {
                let response = task?.await?;
                Ok::<_, JSError>(HostValue::Object(Box::new(response)))
            }
            .boxed_local()
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn headers_init_accepts_records_and_pairs() {
        let record = JSValue::Object(JSObject::plain().with("X-Id", JSValue::Number(7.0)));
        assert_eq!(headers_from_value(&record).unwrap().get("x-id"), Some("7"));
        let pairs = JSValue::Array(vec![
            JSValue::Array(vec![JSValue::from("a"), JSValue::from("1")]),
            JSValue::Array(vec![JSValue::from("A"), JSValue::from("2")]),
        ]);
        assert_eq!(headers_from_value(&pairs).unwrap().get("a"), Some("1, 2"));
        assert!(matches!(
            headers_from_value(&JSValue::Number(1.0)),
            Err(JSError::TypeError(_))
        ));
    }

    #[test]
    fn guest_headers_methods_update_the_instance() {
        let init = JSValue::Object(JSObject::plain().with("Accept", JSValue::from("*/*")));
        let mut headers = headers_class().construct(&[init]).unwrap();
        headers
            .call_method("set", &mut [JSValue::from("X-Test"), JSValue::from("1")])
            .unwrap();
        let got = headers.call_method("get", &mut [JSValue::from("x-test")]).unwrap();
        assert_eq!(got.into_value(), JSValue::from("1"));
        let missing = headers.call_method("get", &mut [JSValue::from("nope")]).unwrap();
        assert_eq!(missing.into_value(), JSValue::Null);
        assert_eq!(
            headers.call_method("keys", &mut []).unwrap().into_value(),
            JSValue::Array(vec![JSValue::from("accept"), JSValue::from("x-test")])
        );
        assert!(matches!(
            headers.call_method("forEach", &mut []),
            Err(JSError::TypeError(message)) if message == "Headers.forEach is not a function"
        ));
    }

    #[test]
    fn guest_response_reads_its_body_once() {
        let init = JSValue::Object(
            JSObject::plain()
                .with("status", JSValue::Number(201.0))
                .with(
                    "headers",
                    JSValue::Object(JSObject::plain().with("a", JSValue::from("b"))),
                ),
        );
        let mut response = response_class()
            .construct(&[JSValue::from(r#"{"n":[1,true]}"#), init])
            .unwrap();
        assert_eq!(
            response.property("status").map(HostValue::into_value),
            Some(JSValue::Number(201.0))
        );
        let body = response.call_method("json", &mut []).unwrap().into_value();
        assert_eq!(
            body,
            JSValue::Object(JSObject::plain().with(
                "n",
                JSValue::Array(vec![JSValue::Number(1.0), JSValue::Boolean(true)])
            ))
        );
        assert!(matches!(response.call_method("text", &mut []), Err(JSError::BodyUsed(_))));
        let mut headers = response.property("headers").unwrap();
        let value = headers
            .as_object_mut()
            .unwrap()
            .call_method("get", &mut [JSValue::from("A")])
            .unwrap();
        assert_eq!(value.into_value(), JSValue::from("b"));
    }

    #[test]
    fn response_status_outside_the_range_is_rejected() {
        let init = JSValue::Object(JSObject::plain().with("status", JSValue::Number(99.0)));
        let error = response_class().construct(&[JSValue::Undefined, init]).err().unwrap();
        assert_eq!(error.name(), "RangeError");
    }

    #[test]
    fn json_maps_onto_guest_values() {
        assert_eq!(
            json_to_value(&json!({"a": null, "b": "x", "c": 1.5})),
            JSValue::Object(
                JSObject::plain()
                    .with("a", JSValue::Null)
                    .with("b", JSValue::from("x"))
                    .with("c", JSValue::Number(1.5))
            )
        );
    }
}
