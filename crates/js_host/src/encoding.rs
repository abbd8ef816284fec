//! The `encoding` namespace: UTF-8 and base64 primitives.

use std::sync::Arc;

use base64::Engine as _;
use base64::alphabet;
use base64::engine::DecodePaddingMode;
use base64::engine::general_purpose::{
    GeneralPurpose, GeneralPurposeConfig, STANDARD as BASE64_STANDARD,
};
use js_shim::bindings::parse_string;
use js_shim::{HostFnSync, HostNamespace, JSError, JSValue};

/// Lenient decoder for input that has already been stripped of padding.
const FORGIVING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

const INVALID_CHARACTER: &str = "ERROR: Invalid character";

pub fn build_encoding_namespace() -> HostNamespace {
    HostNamespace::new()
        .with_sync_fn("encode", build_encode())
        .with_sync_fn("decode", build_decode(false))
        .with_sync_fn("decodeLossy", build_decode(true))
        .with_sync_fn("btoa", build_btoa())
        .with_sync_fn("atob", build_atob())
}

fn build_encode() -> Arc<HostFnSync> {
    Arc::new(|args: Vec<JSValue>| -> Result<JSValue, JSError> {
        let text = parse_string(&args, 0, "text")?;
        serde_json::to_string(text.as_bytes())
            .map(JSValue::String)
            .map_err(|error| JSError::InternalError(error.to_string()))
    })
}

fn build_decode(lossy: bool) -> Arc<HostFnSync> {
    Arc::new(move |args: Vec<JSValue>| -> Result<JSValue, JSError> {
        let payload = parse_string(&args, 0, "bytes")?;
        let bytes: Vec<u8> = serde_json::from_str(&payload).map_err(|error| {
            JSError::TypeError(format!("bytes must be a JSON byte array: {error}"))
        })?;
        let text = if lossy {
            String::from_utf8_lossy(&bytes).into_owned()
        } else {
            String::from_utf8(bytes).unwrap_or_else(|error| format!("ERROR: {error}"))
        };
        Ok(JSValue::String(text))
    })
}

fn build_btoa() -> Arc<HostFnSync> {
    Arc::new(|args: Vec<JSValue>| -> Result<JSValue, JSError> {
        let text = parse_string(&args, 0, "data")?;
        let bytes = latin1_bytes(&text).ok_or_else(|| {
            JSError::InvalidCharacter(String::from(
                "The string to be encoded contains characters outside of the Latin1 range.",
            ))
        })?;
        Ok(JSValue::String(BASE64_STANDARD.encode(bytes)))
    })
}

fn build_atob() -> Arc<HostFnSync> {
    Arc::new(|args: Vec<JSValue>| -> Result<JSValue, JSError> {
        let text = parse_string(&args, 0, "data")?;
        let decoded = forgiving_decode(&text).map_or_else(
            || String::from(INVALID_CHARACTER),
            |bytes| bytes.into_iter().map(char::from).collect(),
        );
        Ok(JSValue::String(decoded))
    })
}

fn latin1_bytes(text: &str) -> Option<Vec<u8>> {
    text.chars()
        .map(|character| u8::try_from(u32::from(character)).ok())
        .collect()
}

/// Forgiving base64: ASCII whitespace is ignored and padding is optional.
fn forgiving_decode(input: &str) -> Option<Vec<u8>> {
    let mut data: String = input
        .chars()
        .filter(|character| !matches!(*character, '\t' | '\n' | '\u{c}' | '\r' | ' '))
        .collect();
    if data.len() % 4 == 0 {
        for _ in 0..2 {
            if data.ends_with('=') {
                data.pop();
            }
        }
    }
    if data.len() % 4 == 1 {
        return None;
    }
    if !data
        .bytes()
        .all(|byte| byte.is_ascii_alphanumeric() || byte == b'+' || byte == b'/')
    {
        return None;
    }
    FORGIVING.decode(data.as_bytes()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forgiving_decode_ignores_whitespace_and_padding() {
        assert_eq!(forgiving_decode("YWJj").as_deref(), Some(&b"abc"[..]));
        assert_eq!(forgiving_decode(" YW\nJj ").as_deref(), Some(&b"abc"[..]));
        assert_eq!(forgiving_decode("YQ==").as_deref(), Some(&b"a"[..]));
        assert_eq!(forgiving_decode("YQ").as_deref(), Some(&b"a"[..]));
        assert_eq!(forgiving_decode("").as_deref(), Some(&b""[..]));
    }

    #[test]
    fn forgiving_decode_rejects_malformed_input() {
        assert_eq!(forgiving_decode("!!!"), None);
        assert_eq!(forgiving_decode("Y"), None);
        assert_eq!(forgiving_decode("YQ=a"), None);
        assert_eq!(forgiving_decode("YQ==="), None);
    }

    #[test]
    fn latin1_only() {
        assert_eq!(latin1_bytes("é"), Some(vec![0xe9]));
        assert_eq!(latin1_bytes("✓"), None);
    }
}
