//! `TextEncoder`, `TextDecoder`, `btoa` and `atob` over the host codec.

use crate::bindings::{JSError, JSValue};
use crate::bridge::HostBridge;

/// Labels (after normalization) that select the UTF-8 decoder.
const UTF8_LABELS: &[&str] = &["utf8", "unicode11utf8", "unicode20utf8", "xunicode20utf8"];

const BOM: char = '\u{feff}';

/// Result of [`TextEncoder::encode_into`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EncodeIntoResult {
    /// UTF-16 code units of the source that were fully encoded.
    pub read: usize,
    /// Bytes written to the destination.
    pub written: usize,
}

/// UTF-8 encoder.
#[derive(Clone, Debug)]
pub struct TextEncoder {
    bridge: HostBridge,
}

impl TextEncoder {
    pub fn new(bridge: HostBridge) -> Self {
        Self { bridge }
    }

    /// Always `"utf-8"`.
    pub const fn encoding(&self) -> &'static str {
        "utf-8"
    }

    /// Encode `input` (coerced to a string; `undefined` is the empty string).
    ///
    /// # Errors
    /// Returns an internal error if the host codec fails.
    pub fn encode(&self, input: &JSValue) -> Result<Vec<u8>, JSError> {
        let text = match input {
            JSValue::Undefined => String::new(),
            other => other.to_display_string(),
        };
        self.encode_str(&text)
    }

    fn encode_str(&self, text: &str) -> Result<Vec<u8>, JSError> {
        self.bridge
            .call_json::<Vec<u8>>("encoding", "encode", vec![JSValue::from(text)])
            .map_err(|failure| failure.into_error(JSError::InternalError))
    }

    /// Encode `source` into `destination`, writing only whole UTF-8 sequences.
    ///
    /// # Errors
    /// Returns an internal error if the host codec fails.
    pub fn encode_into(
        &self,
        source: &str,
        destination: &mut [u8],
    ) -> Result<EncodeIntoResult, JSError> {
        let encoded = self.encode_str(source)?;
        let mut result = EncodeIntoResult { read: 0, written: 0 };
        for character in source.chars() {
            let width = character.len_utf8();
            let end = result.written + width;
            let (Some(target), Some(bytes)) = (
                destination.get_mut(result.written..end),
                encoded.get(result.written..end),
            ) else {
                break;
            };
            target.copy_from_slice(bytes);
            result.written = end;
            result.read += character.len_utf16();
        }
        Ok(result)
    }
}

/// Construction options for [`TextDecoder`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TextDecoderOptions {
    pub fatal: bool,
    pub ignore_bom: bool,
}

/// UTF-8 decoder. Its configuration is fixed at construction.
#[derive(Clone, Debug)]
pub struct TextDecoder {
    bridge: HostBridge,
    fatal: bool,
    ignore_bom: bool,
}

impl TextDecoder {
    /// Create a decoder for `label` (default `"utf-8"`).
    ///
    /// # Errors
    /// Returns a `RangeError` when the label does not name UTF-8.
    pub fn new(
        bridge: HostBridge,
        label: Option<&str>,
        options: TextDecoderOptions,
    ) -> Result<Self, JSError> {
        let label = label.unwrap_or("utf-8");
        if !is_utf8_label(label) {
            return Err(JSError::RangeError(format!(
                "The encoding label provided ('{label}') is invalid."
            )));
        }
        Ok(Self {
            bridge,
            fatal: options.fatal,
            ignore_bom: options.ignore_bom,
        })
    }

    /// Always `"utf-8"`.
    pub const fn encoding(&self) -> &'static str {
        "utf-8"
    }

    pub const fn fatal(&self) -> bool {
        self.fatal
    }

    pub const fn ignore_bom(&self) -> bool {
        self.ignore_bom
    }

    /// Decode `input`: `undefined`, an `ArrayBuffer`, or a view over bytes.
    ///
    /// # Errors
    /// Returns a `TypeError` for any other input, and a decode error for
    /// malformed bytes when the decoder is fatal.
    pub fn decode(&self, input: &JSValue) -> Result<String, JSError> {
        let bytes: &[u8] = match input {
            JSValue::Undefined => &[],
            JSValue::ArrayBuffer(bytes) => bytes,
            JSValue::View(view) => &view.bytes,
            _ => {
                return Err(JSError::TypeError(String::from(
                    "The provided value is not of type '(ArrayBuffer or ArrayBufferView)'",
                )))
            }
        };
        self.decode_bytes(bytes)
    }

    /// Decode raw bytes.
    ///
    /// # Errors
    /// Returns a decode error for malformed bytes when the decoder is fatal.
    pub fn decode_bytes(&self, bytes: &[u8]) -> Result<String, JSError> {
        let payload = serde_json::to_string(bytes)
            .map_err(|error| JSError::InternalError(error.to_string()))?;
        let args = vec![JSValue::String(payload)];
        let decoded = if self.fatal {
            self.bridge.call_text("encoding", "decode", args)
        } else {
            self.bridge.call_string("encoding", "decodeLossy", args)
        };
        let mut text = decoded.map_err(|failure| failure.into_error(JSError::Decode))?;
        if !self.ignore_bom && text.starts_with(BOM) {
            text.drain(..BOM.len_utf8());
        }
        Ok(text)
    }
}

/// Whether `label` names UTF-8 once whitespace, `-` and `_` are ignored.
pub fn is_utf8_label(label: &str) -> bool {
    let normalized: String = label
        .trim_matches(|character: char| character.is_ascii_whitespace())
        .chars()
        .filter(|character| !matches!(*character, '-' | '_'))
        .map(|character| character.to_ascii_lowercase())
        .collect();
    UTF8_LABELS.contains(&normalized.as_str())
}

/// The `btoa`/`atob` global functions.
#[derive(Clone, Debug)]
pub struct Base64 {
    bridge: HostBridge,
}

impl Base64 {
    pub fn new(bridge: HostBridge) -> Self {
        Self { bridge }
    }

    /// Base64-encode a string of Latin-1 characters.
    ///
    /// # Errors
    /// `TypeError` for non-string input; `InvalidCharacterError` when the
    /// host rejects a character outside Latin-1.
    pub fn btoa(&self, input: &JSValue) -> Result<String, JSError> {
        let text = require_string(input, "btoa")?;
        self.bridge
            .call_string("encoding", "btoa", vec![JSValue::from(text)])
            .map_err(|failure| failure.into_error(JSError::InvalidCharacter))
    }

    /// Decode base64 into a string of Latin-1 characters.
    ///
    /// # Errors
    /// `TypeError` for non-string input; `InvalidCharacterError` for malformed base64.
    pub fn atob(&self, input: &JSValue) -> Result<String, JSError> {
        let text = require_string(input, "atob")?;
        self.bridge
            .call_text("encoding", "atob", vec![JSValue::from(text)])
            .map_err(|failure| failure.into_error(JSError::InvalidCharacter))
    }
}

fn require_string<'value>(input: &'value JSValue, function: &str) -> Result<&'value str, JSError> {
    input.as_str().ok_or_else(|| {
        JSError::TypeError(format!("{function}: argument must be a string"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_labels_normalize() {
        assert!(is_utf8_label("UTF8"));
        assert!(is_utf8_label("utf-8"));
        assert!(is_utf8_label(" Unicode-1-1-UTF-8 "));
        assert!(is_utf8_label("utf_8"));
        assert!(!is_utf8_label("utf-16"));
        assert!(!is_utf8_label("latin1"));
        assert!(!is_utf8_label(""));
    }
}
