//! Console value formatting.
//!
//! Each argument is rendered independently and the results are joined with a
//! single space. Nested containers are bounded by [`MAX_VALUE_DEPTH`]; past
//! it the structural fallback gives up and the value is coerced to text.

use serde_json::{Map, Number, Value};

use crate::bindings::{
    BufferView, JSObject, JSValue, MAX_VALUE_DEPTH, PromiseState, TypeDescriptor, ViewKind,
    iso_date, number_to_string,
};

/// Format the arguments of one console call.
pub fn format_args(args: &[JSValue]) -> String {
    args.iter().map(format_value).collect::<Vec<_>>().join(" ")
}

/// Format a single value.
pub fn format_value(value: &JSValue) -> String {
    match value {
        JSValue::String(text) => text.clone(),
        JSValue::Null => String::from("null"),
        JSValue::Undefined => String::from("undefined"),
        JSValue::Number(number) => number_to_string(*number),
        JSValue::Boolean(flag) => flag.to_string(),
        JSValue::Class(descriptor) => format_class(descriptor),
        JSValue::Function(name) => {
            format!("[Function: {}]", name.as_deref().unwrap_or("anonymous"))
        }
        JSValue::Symbol(_) => value.to_display_string(),
        JSValue::Date(millis) => iso_date(*millis).unwrap_or_else(|| String::from("Invalid Date")),
        JSValue::Promise(state) => format_promise(state),
        JSValue::Array(items) => format_sequence(None, items),
        JSValue::View(view) if view.kind != ViewKind::DataView => format_view(view),
        JSValue::View(view) => format!("DataView {{ byteLength: {} }}", view.bytes.len()),
        JSValue::ArrayBuffer(bytes) => format!("ArrayBuffer {{ byteLength: {} }}", bytes.len()),
        JSValue::Object(object) => match &object.class {
            Some(class) if !class.name.is_empty() && class.name != "Object" => {
                format_instance(&class.name, object)
            }
            _ => format_structural(value),
        },
    }
}

fn format_class(descriptor: &TypeDescriptor) -> String {
    let name = if descriptor.name.is_empty() {
        "anonymous"
    } else {
        &descriptor.name
    };
    match descriptor.parent.as_deref() {
        Some(parent) if !parent.is_empty() => format!("[class {name} extends {parent}]"),
        _ => format!("[class {name}]"),
    }
}

fn format_promise(state: &PromiseState) -> String {
    match state {
        PromiseState::Pending => String::from("Promise { <pending> }"),
        PromiseState::Fulfilled(value) => format!("Promise {{ {} }}", format_element(value)),
        PromiseState::Rejected(reason) => {
            format!("Promise {{ <rejected> {} }}", format_element(reason))
        }
    }
}

/// An element inside a container: strings are quoted, everything else is
/// coerced to text.
fn format_element(value: &JSValue) -> String {
    match value {
        JSValue::String(text) => Value::String(text.clone()).to_string(),
        other => other.to_display_string(),
    }
}

/// Two or more elements go one per line; shorter sequences stay inline.
fn format_sequence(prefix: Option<String>, items: &[JSValue]) -> String {
    let rendered: Vec<String> = items.iter().map(format_element).collect();
    let opening = prefix.map_or_else(String::new, |name| format!("{name} "));
    match rendered.len() {
        0 => format!("{opening}[]"),
        1 => format!("{opening}[ {} ]", rendered.join(", ")),
        _ => {
            let lines: Vec<String> = rendered.iter().map(|item| format!("  {item}")).collect();
            format!("{opening}[\n{}\n]", lines.join(",\n"))
        }
    }
}

fn format_view(view: &BufferView) -> String {
    let elements: Vec<JSValue> = view.elements().into_iter().map(JSValue::Number).collect();
    format_sequence(
        Some(format!("{}({})", view.kind.name(), elements.len())),
        &elements,
    )
}

/// `TypeName {` followed by one visible property per line.
///
/// Properties whose names start with `_` and callable values are hidden;
/// string values are wrapped in plain double quotes.
fn format_instance(type_name: &str, object: &JSObject) -> String {
    let mut seen: Vec<&str> = Vec::new();
    let mut lines = Vec::new();
    for (key, value) in &object.properties {
        if key.starts_with('_') || value.is_callable() || seen.contains(&key.as_str()) {
            continue;
        }
        seen.push(key);
        let rendered = match value {
            JSValue::String(text) => format!("\"{text}\""),
            other => other.to_display_string(),
        };
        lines.push(format!("  {key}: {rendered}"));
    }
    if lines.is_empty() {
        return format!("{type_name} {{}}");
    }
    format!("{type_name} {{\n{}\n}}", lines.join(",\n"))
}

/// Why a value could not be serialized structurally.
#[derive(Debug)]
struct TooDeep;

/// JSON with two-space indentation, or textual coercion when the value is
/// nested past the depth bound or has no JSON form.
fn format_structural(value: &JSValue) -> String {
    match to_json(value, 0) {
        Ok(Some(json)) => {
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| value.to_display_string())
        }
        Ok(None) | Err(TooDeep) => value.to_display_string(),
    }
}

/// Guest `JSON.stringify` value conversion. `Ok(None)` marks values that
/// JSON omits (functions, symbols, `undefined`).
fn to_json(value: &JSValue, depth: usize) -> Result<Option<Value>, TooDeep> {
    if depth > MAX_VALUE_DEPTH {
        return Err(TooDeep);
    }
    let json = match value {
        JSValue::Undefined | JSValue::Function(_) | JSValue::Class(_) | JSValue::Symbol(_) => {
            return Ok(None)
        }
        JSValue::Null => Value::Null,
        JSValue::Boolean(flag) => Value::Bool(*flag),
        JSValue::Number(number) => number_to_json(*number),
        JSValue::String(text) => Value::String(text.clone()),
        JSValue::Date(millis) => iso_date(*millis).map_or(Value::Null, Value::String),
        JSValue::Promise(_) | JSValue::ArrayBuffer(_) => Value::Object(Map::new()),
        JSValue::Array(items) => {
            let mut array = Vec::with_capacity(items.len());
            for item in items {
                array.push(to_json(item, depth + 1)?.unwrap_or(Value::Null));
            }
            Value::Array(array)
        }
        JSValue::View(view) => Value::Object(
            view.elements()
                .into_iter()
                .enumerate()
                .map(|(index, element)| (index.to_string(), number_to_json(element)))
                .collect(),
        ),
        JSValue::Object(object) => {
            let mut map = Map::new();
            for (key, property) in &object.properties {
                if let Some(json) = to_json(property, depth + 1)? {
                    map.insert(key.clone(), json);
                }
            }
            Value::Object(map)
        }
    };
    Ok(Some(json))
}

/// Integral values serialize without a fraction, as the guest does.
fn number_to_json(number: f64) -> Value {
    if !number.is_finite() {
        return Value::Null;
    }
    if number.fract() == 0.0 && number.abs() < 9_007_199_254_740_992.0 {
        return Value::Number(Number::from(number as i64));
    }
    Number::from_f64(number).map_or(Value::Null, Value::Number)
}
