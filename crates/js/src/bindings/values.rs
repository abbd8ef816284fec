use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Nesting bound shared by every recursive walk over guest values.
///
/// Engine adapters stop converting guest object graphs at this depth, which is
/// what terminates self-referential structures.
pub const MAX_VALUE_DEPTH: usize = 64;

/// An engine-agnostic representation of guest script values.
#[derive(Clone, Debug, PartialEq)]
pub enum JSValue {
    /// The `undefined` value.
    Undefined,
    /// The `null` value.
    Null,
    /// A boolean primitive.
    Boolean(bool),
    /// A number (IEEE 754 double precision).
    Number(f64),
    /// A string value (UTF-8).
    String(String),
    /// A symbol with its optional description.
    Symbol(Option<String>),
    /// A plain callable. `None` means the function is anonymous.
    Function(Option<String>),
    /// A class constructor together with the metadata captured when it was defined.
    Class(TypeDescriptor),
    /// A date, as milliseconds since the Unix epoch (`NaN` for an invalid date).
    Date(f64),
    /// A promise and its settlement state.
    Promise(PromiseState),
    /// An array-like sequence.
    Array(Vec<JSValue>),
    /// A raw byte buffer.
    ArrayBuffer(Vec<u8>),
    /// A typed view over bytes (typed arrays and `DataView`).
    View(BufferView),
    /// Any other object.
    Object(JSObject),
}

/// Type metadata registered when a class is defined.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// Class name; empty for anonymous classes.
    pub name: String,
    /// Name of the direct supertype, if it has one.
    pub parent: Option<String>,
}

impl TypeDescriptor {
    /// Describe a class without a supertype.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
        }
    }

    /// Describe a class extending `parent`.
    pub fn extending(name: &str, parent: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: Some(parent.to_string()),
        }
    }
}

/// Settlement state of a promise at the time it was captured.
#[derive(Clone, Debug, PartialEq)]
pub enum PromiseState {
    Pending,
    Fulfilled(Box<JSValue>),
    Rejected(Box<JSValue>),
}

/// Element type of a typed view.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ViewKind {
    Int8,
    Uint8,
    Uint8Clamped,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
    Float64,
    DataView,
}

impl ViewKind {
    /// Guest-visible constructor name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int8 => "Int8Array",
            Self::Uint8 => "Uint8Array",
            Self::Uint8Clamped => "Uint8ClampedArray",
            Self::Int16 => "Int16Array",
            Self::Uint16 => "Uint16Array",
            Self::Int32 => "Int32Array",
            Self::Uint32 => "Uint32Array",
            Self::Float32 => "Float32Array",
            Self::Float64 => "Float64Array",
            Self::DataView => "DataView",
        }
    }

    /// Size in bytes of one element.
    pub const fn element_size(self) -> usize {
        match self {
            Self::Int8 | Self::Uint8 | Self::Uint8Clamped | Self::DataView => 1,
            Self::Int16 | Self::Uint16 => 2,
            Self::Int32 | Self::Uint32 | Self::Float32 => 4,
            Self::Float64 => 8,
        }
    }
}

/// The bytes visible through a typed view, copied out of the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferView {
    pub kind: ViewKind,
    pub bytes: Vec<u8>,
}

impl BufferView {
    /// A `Uint8Array` over `bytes`.
    pub fn uint8(bytes: Vec<u8>) -> Self {
        Self {
            kind: ViewKind::Uint8,
            bytes,
        }
    }

    /// Decode the view's elements as numbers (little-endian).
    /// Trailing bytes that do not fill a whole element are ignored.
    pub fn elements(&self) -> Vec<f64> {
        let size = self.kind.element_size();
        self.bytes
            .chunks_exact(size)
            .map(|chunk| match (self.kind, chunk) {
                (ViewKind::Int8, [byte]) => f64::from(*byte as i8),
                (ViewKind::Int16, [low, high]) => f64::from(i16::from_le_bytes([*low, *high])),
                (ViewKind::Uint16, [low, high]) => f64::from(u16::from_le_bytes([*low, *high])),
                (ViewKind::Int32, [b0, b1, b2, b3]) => {
                    f64::from(i32::from_le_bytes([*b0, *b1, *b2, *b3]))
                }
                (ViewKind::Uint32, [b0, b1, b2, b3]) => {
                    f64::from(u32::from_le_bytes([*b0, *b1, *b2, *b3]))
                }
                (ViewKind::Float32, [b0, b1, b2, b3]) => {
                    f64::from(f32::from_le_bytes([*b0, *b1, *b2, *b3]))
                }
                (ViewKind::Float64, bytes8) => {
                    let mut raw = [0_u8; 8];
                    raw.copy_from_slice(bytes8);
                    f64::from_le_bytes(raw)
                }
                (_, bytes_any) => bytes_any.first().map_or(0.0, |byte| f64::from(*byte)),
            })
            .collect()
    }
}

/// An ordinary object: optional constructor metadata plus the own and
/// inherited properties the engine adapter captured, in enumeration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JSObject {
    pub class: Option<TypeDescriptor>,
    pub properties: Vec<(String, JSValue)>,
}

impl JSObject {
    /// A plain `Object` with no constructor metadata.
    pub fn plain() -> Self {
        Self::default()
    }

    /// An instance of the named class.
    pub fn instance_of(class: TypeDescriptor) -> Self {
        Self {
            class: Some(class),
            properties: Vec::new(),
        }
    }

    /// Append a property.
    pub fn with(mut self, key: &str, value: JSValue) -> Self {
        self.properties.push((key.to_string(), value));
        self
    }

    /// Look up a property by name.
    pub fn get(&self, key: &str) -> Option<&JSValue> {
        self.properties
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }
}

impl JSValue {
    /// Guest `String(value)` coercion.
    pub fn to_display_string(&self) -> String {
        display_string(self, 0)
    }

    /// Guest `typeof` result.
    pub const fn type_of(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::Function(_) | Self::Class(_) => "function",
            Self::Null
            | Self::Date(_)
            | Self::Promise(_)
            | Self::Array(_)
            | Self::ArrayBuffer(_)
            | Self::View(_)
            | Self::Object(_) => "object",
        }
    }

    /// Whether the value can be called.
    pub const fn is_callable(&self) -> bool {
        matches!(self, Self::Function(_) | Self::Class(_))
    }

    /// Borrow the string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(text) => Some(text),
            _ => None,
        }
    }
}

fn display_string(value: &JSValue, depth: usize) -> String {
    match value {
        JSValue::Undefined => String::from("undefined"),
        JSValue::Null => String::from("null"),
        JSValue::Boolean(flag) => flag.to_string(),
        JSValue::Number(number) => number_to_string(*number),
        JSValue::String(text) => text.clone(),
        JSValue::Symbol(description) => {
            format!("Symbol({})", description.as_deref().unwrap_or(""))
        }
        JSValue::Function(name) => format!(
            "function {}() {{ [native code] }}",
            name.as_deref().unwrap_or("")
        ),
        JSValue::Class(descriptor) => match &descriptor.parent {
            Some(parent) => format!("class {} extends {parent} {{ }}", descriptor.name),
            None => format!("class {} {{ }}", descriptor.name),
        },
        JSValue::Date(millis) => iso_date(*millis).unwrap_or_else(|| String::from("Invalid Date")),
        JSValue::Promise(_) => String::from("[object Promise]"),
        JSValue::Array(items) => {
            if depth >= MAX_VALUE_DEPTH {
                return String::new();
            }
            items
                .iter()
                .map(|item| match item {
                    JSValue::Undefined | JSValue::Null => String::new(),
                    other => display_string(other, depth + 1),
                })
                .collect::<Vec<_>>()
                .join(",")
        }
        JSValue::ArrayBuffer(_) => String::from("[object ArrayBuffer]"),
        JSValue::View(view) => match view.kind {
            ViewKind::DataView => String::from("[object DataView]"),
            _ => view
                .elements()
                .into_iter()
                .map(number_to_string)
                .collect::<Vec<_>>()
                .join(","),
        },
        JSValue::Object(_) => String::from("[object Object]"),
    }
}

/// Render a date as ISO-8601 with millisecond precision, or `None` when the
/// timestamp is not a valid date.
pub fn iso_date(millis: f64) -> Option<String> {
    if !millis.is_finite() {
        return None;
    }
    let moment = chrono::DateTime::from_timestamp_millis(millis.trunc() as i64)?;
    Some(moment.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
}

/// Guest number-to-string conversion: shortest round-trip digits, exponent
/// form outside `[1e-6, 1e21)`.
pub fn number_to_string(number: f64) -> String {
    if number.is_nan() {
        return String::from("NaN");
    }
    if number == 0.0 {
        return String::from("0");
    }
    if number.is_infinite() {
        return String::from(if number > 0.0 { "Infinity" } else { "-Infinity" });
    }
    let sign = if number < 0.0 { "-" } else { "" };
    // `{:e}` yields the shortest round-trip digits as `d.ddde<exp>`.
    let scientific = format!("{:e}", number.abs());
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digit_count = digits.len() as i32;
    let point = exponent + 1;

    let body = if digit_count <= point && point <= 21 {
        format!("{digits}{}", "0".repeat((point - digit_count) as usize))
    } else if 0 < point && point <= 21 {
        let (whole, fraction) = digits.split_at(point as usize);
        format!("{whole}.{fraction}")
    } else if -6 < point && point <= 0 {
        format!("0.{}{digits}", "0".repeat((-point) as usize))
    } else {
        let exp_sign = if point - 1 < 0 { '-' } else { '+' };
        let magnitude = (point - 1).abs();
        let (lead, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{lead}e{exp_sign}{magnitude}")
        } else {
            format!("{lead}.{rest}e{exp_sign}{magnitude}")
        }
    };
    format!("{sign}{body}")
}

impl From<&str> for JSValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for JSValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for JSValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for JSValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// Coarse classification of guest-visible failures.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid URL, invalid encoding label, or a wrongly typed argument.
    Value,
    /// Malformed base64 or a malformed byte sequence under fatal decoding.
    DataFormat,
    /// Reading or cloning an already-consumed response body.
    State,
    /// A fetch that the host reported as failed.
    Network,
    /// A host facade operation (file system, process) that failed.
    Host,
    /// Broken invariants inside the shim or the host table.
    Internal,
}

/// Error type used by host callbacks and by every guest-visible operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JSError {
    /// A type error (for example, wrong argument types).
    TypeError(String),
    /// A range error (for example, an unsupported encoding label).
    RangeError(String),
    /// Text that was expected to be JSON and was not.
    SyntaxError(String),
    /// A URL that the host canonicalizer rejected; carries the offending input.
    InvalidUrl(String),
    /// Malformed base64 input or output that cannot be represented.
    InvalidCharacter(String),
    /// A malformed byte sequence under fatal decoding.
    Decode(String),
    /// A response body that was already read.
    BodyUsed(String),
    /// A fetch failure reported by the host.
    Network(String),
    /// A failure reported by a host facade.
    Host(String),
    /// An internal error not exposed to user code in detail.
    InternalError(String),
}

impl JSError {
    /// The error kind this failure belongs to.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::TypeError(_)
            | Self::RangeError(_)
            | Self::SyntaxError(_)
            | Self::InvalidUrl(_) => ErrorKind::Value,
            Self::InvalidCharacter(_) | Self::Decode(_) => ErrorKind::DataFormat,
            Self::BodyUsed(_) => ErrorKind::State,
            Self::Network(_) => ErrorKind::Network,
            Self::Host(_) => ErrorKind::Host,
            Self::InternalError(_) => ErrorKind::Internal,
        }
    }

    /// The guest-facing error name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TypeError(_)
            | Self::InvalidUrl(_)
            | Self::Decode(_)
            | Self::BodyUsed(_)
            | Self::Network(_) => "TypeError",
            Self::RangeError(_) => "RangeError",
            Self::SyntaxError(_) => "SyntaxError",
            Self::InvalidCharacter(_) => "InvalidCharacterError",
            Self::Host(_) => "Error",
            Self::InternalError(_) => "InternalError",
        }
    }

    /// The message without the error name.
    pub fn message(&self) -> String {
        match self {
            Self::InvalidUrl(input) => format!("Invalid URL: {input}"),
            Self::Network(message) => format!("Failed to fetch: {message}"),
            Self::TypeError(message)
            | Self::RangeError(message)
            | Self::SyntaxError(message)
            | Self::InvalidCharacter(message)
            | Self::Decode(message)
            | Self::BodyUsed(message)
            | Self::Host(message)
            | Self::InternalError(message) => message.clone(),
        }
    }
}

impl Display for JSError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}: {}", self.name(), self.message())
    }
}

impl Error for JSError {}
