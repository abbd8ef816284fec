//! TextEncoder, TextDecoder, btoa and atob through the call table.

mod common;

use common::MockHost;
use js_shim::{
    BufferView, ErrorKind, JSError, JSObject, JSValue, Runtime, TextDecoderOptions, ViewKind,
};

fn runtime() -> Runtime {
    Runtime::new(MockHost::new().bindings()).unwrap()
}

#[test]
fn decode_inverts_encode() {
    let runtime = runtime();
    let encoder = runtime.text_encoder();
    let decoder = runtime.text_decoder(None, TextDecoderOptions::default()).unwrap();
    for text in ["", "plain", "héllo wörld", "日本語", "emoji 🎉 mix"] {
        let bytes = encoder.encode(&JSValue::from(text)).unwrap();
        assert_eq!(bytes, text.as_bytes());
        let decoded = decoder.decode(&JSValue::View(BufferView::uint8(bytes))).unwrap();
        assert_eq!(decoded, text);
    }
}

#[test]
fn encode_coerces_its_input() {
    let encoder = runtime().text_encoder();
    assert_eq!(encoder.encode(&JSValue::Undefined).unwrap(), Vec::<u8>::new());
    assert_eq!(encoder.encode(&JSValue::Number(12.5)).unwrap(), b"12.5");
    assert_eq!(encoder.encode(&JSValue::Null).unwrap(), b"null");
    assert_eq!(encoder.encoding(), "utf-8");
}

#[test]
fn encode_into_stops_at_whole_characters() {
    let encoder = runtime().text_encoder();
    let mut destination = [0_u8; 4];
    let result = encoder.encode_into("aé🎉", &mut destination).unwrap();
    assert_eq!(result.written, 3);
    assert_eq!(result.read, 2);
    assert_eq!(&destination[..3], "aé".as_bytes());

    let mut roomy = [0_u8; 16];
    let full = encoder.encode_into("aé🎉", &mut roomy).unwrap();
    assert_eq!(full.written, 7);
    assert_eq!(full.read, 4);
}

#[test]
fn labels_outside_utf8_are_range_errors() {
    let runtime = runtime();
    let error = runtime
        .text_decoder(Some("utf-16"), TextDecoderOptions::default())
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Value);
    assert_eq!(error.name(), "RangeError");
    assert_eq!(
        error.to_string(),
        "RangeError: The encoding label provided ('utf-16') is invalid."
    );
    let decoder = runtime
        .text_decoder(Some("UTF8"), TextDecoderOptions::default())
        .unwrap();
    assert_eq!(decoder.encoding(), "utf-8");
}

#[test]
fn decoder_options_are_kept() {
    let decoder = runtime()
        .text_decoder(
            Some("utf-8"),
            TextDecoderOptions {
                fatal: true,
                ignore_bom: true,
            },
        )
        .unwrap();
    assert!(decoder.fatal());
    assert!(decoder.ignore_bom());
}

#[test]
fn decode_accepts_only_byte_sources() {
    let decoder = runtime().text_decoder(None, TextDecoderOptions::default()).unwrap();
    assert_eq!(decoder.decode(&JSValue::Undefined).unwrap(), "");
    assert_eq!(decoder.decode(&JSValue::ArrayBuffer(b"hi".to_vec())).unwrap(), "hi");
    let data_view = BufferView {
        kind: ViewKind::DataView,
        bytes: b"dv".to_vec(),
    };
    assert_eq!(decoder.decode(&JSValue::View(data_view)).unwrap(), "dv");
    for bad in [
        JSValue::from("text"),
        JSValue::Number(1.0),
        JSValue::Object(JSObject::plain()),
    ] {
        assert!(matches!(decoder.decode(&bad), Err(JSError::TypeError(_))));
    }
}

#[test]
fn fatal_decoding_raises_and_lenient_decoding_substitutes() {
    let runtime = runtime();
    let invalid = JSValue::ArrayBuffer(vec![b'a', 0xff, b'b']);
    let fatal = runtime
        .text_decoder(
            None,
            TextDecoderOptions {
                fatal: true,
                ignore_bom: false,
            },
        )
        .unwrap();
    let error = fatal.decode(&invalid).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::DataFormat);
    assert_eq!(error.name(), "TypeError");
    assert!(error.message().contains("invalid utf-8"));

    let lenient = runtime.text_decoder(None, TextDecoderOptions::default()).unwrap();
    assert_eq!(lenient.decode(&invalid).unwrap(), "a\u{fffd}b");
}

#[test]
fn lenient_decoding_keeps_text_that_starts_like_a_host_error() {
    let runtime = runtime();
    let bytes = runtime.text_encoder().encode(&JSValue::from("ERROR: boom")).unwrap();
    let lenient = runtime.text_decoder(None, TextDecoderOptions::default()).unwrap();
    assert_eq!(
        lenient.decode(&JSValue::View(BufferView::uint8(bytes))).as_deref(),
        Ok("ERROR: boom")
    );
}

#[test]
fn byte_order_mark_handling() {
    let runtime = runtime();
    let with_bom = JSValue::ArrayBuffer(vec![0xef, 0xbb, 0xbf, b'o', b'k']);
    let stripping = runtime.text_decoder(None, TextDecoderOptions::default()).unwrap();
    assert_eq!(stripping.decode(&with_bom).unwrap(), "ok");
    let keeping = runtime
        .text_decoder(
            None,
            TextDecoderOptions {
                fatal: false,
                ignore_bom: true,
            },
        )
        .unwrap();
    assert_eq!(keeping.decode(&with_bom).unwrap(), "\u{feff}ok");
}

#[test]
fn base64_round_trip_and_errors() {
    let runtime = runtime();
    let encoded = runtime.btoa(&JSValue::from("abc")).unwrap();
    assert_eq!(encoded, "YWJj");
    assert_eq!(runtime.atob(&JSValue::String(encoded)).unwrap(), "abc");

    let error = runtime.atob(&JSValue::from("!!!")).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::DataFormat);
    assert_eq!(error.name(), "InvalidCharacterError");
    assert_eq!(error, JSError::InvalidCharacter(String::from("Invalid character")));

    assert!(matches!(runtime.btoa(&JSValue::Number(1.0)), Err(JSError::TypeError(_))));
    assert!(matches!(runtime.atob(&JSValue::Undefined), Err(JSError::TypeError(_))));
    assert_eq!(
        runtime.btoa(&JSValue::from("é✓")).unwrap_err().kind(),
        ErrorKind::DataFormat
    );
}
