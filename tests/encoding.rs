//! Byte-level input and output: BOM handling, declared encodings, and
//! re-encoding on serialization.

#![allow(clippy::unwrap_used)]

use jebixml::encoding;
use jebixml::error::Error;
use jebixml::parser::ParseOptions;
use jebixml::Document;
use pretty_assertions::assert_eq;

fn utf16le_with_bom(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes
}

#[test]
fn test_utf8_bom_is_skipped() {
    let doc = Document::parse_bytes(b"\xEF\xBB\xBF<r>ok</r>").unwrap();
    let r = doc.root_element().unwrap();
    assert_eq!(doc.string_value(r).as_deref(), Some("ok"));
}

#[test]
fn test_latin1_declaration_round_trips_bytes() {
    let input = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<p>caf\xE9</p>\n";
    let doc = Document::parse_bytes(input).unwrap();
    let p = doc.root_element().unwrap();
    assert_eq!(doc.string_value(p).as_deref(), Some("caf\u{e9}"));
    assert_eq!(doc.encoding.as_deref(), Some("ISO-8859-1"));
    assert_eq!(doc.to_bytes().unwrap(), input.to_vec());
}

#[test]
fn test_utf16_with_bom() {
    let bytes = utf16le_with_bom("<?xml version=\"1.0\" encoding=\"UTF-16\"?><r>\u{4e16}</r>");
    let doc = Document::parse_bytes(&bytes).unwrap();
    let r = doc.root_element().unwrap();
    assert_eq!(doc.string_value(r).as_deref(), Some("\u{4e16}"));

    let out = doc.to_bytes().unwrap();
    assert_eq!(&out[..2], &[0xFF, 0xFE]);
    let again = Document::parse_bytes(&out).unwrap();
    assert_eq!(again.xml_string(again.root_element().unwrap()), "<r>\u{4e16}</r>");
}

#[test]
fn test_fallback_encoding_applies_without_declaration() {
    let opts = ParseOptions::default().encoding("windows-1252");
    let doc = Document::parse(b"<q>\x93hi\x94</q>", &opts).unwrap();
    let q = doc.root_element().unwrap();
    assert_eq!(doc.string_value(q).as_deref(), Some("\u{201c}hi\u{201d}"));
}

#[test]
fn test_declaration_overrides_fallback() {
    let opts = ParseOptions::default().encoding("windows-1252");
    let input = "<?xml version=\"1.0\" encoding=\"UTF-8\"?><q>\u{201c}</q>";
    let doc = Document::parse(input.as_bytes(), &opts).unwrap();
    let q = doc.root_element().unwrap();
    assert_eq!(doc.string_value(q).as_deref(), Some("\u{201c}"));
}

#[test]
fn test_malformed_utf8_is_an_encoding_error() {
    let err = Document::parse_bytes(b"<r>\xFF\xFE\xFD</r>").unwrap_err();
    assert!(matches!(err, Error::Encoding(_)), "got {err:?}");
}

#[test]
fn test_unknown_declared_encoding() {
    let err = Document::parse_bytes(b"<?xml version=\"1.0\" encoding=\"x-klingon\"?><r/>")
        .unwrap_err();
    assert!(matches!(err, Error::Encoding(_)));
}

#[test]
fn test_bom_contradicting_declaration() {
    let err = Document::parse_bytes(b"\xEF\xBB\xBF<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><r/>")
        .unwrap_err();
    assert!(matches!(err, Error::Encoding(_)));
}

#[test]
fn test_unmappable_characters_become_references() {
    let mut doc = Document::parse_str("<?xml version=\"1.0\" encoding=\"US-ASCII\"?><r/>").unwrap();
    let r = doc.root_element().unwrap();
    doc.set_string_value(r, "snow \u{2603}").unwrap();
    let bytes = doc.to_bytes().unwrap();
    assert!(bytes.is_ascii());
    let reparsed = Document::parse_bytes(&bytes).unwrap();
    let r = reparsed.root_element().unwrap();
    assert_eq!(reparsed.string_value(r).as_deref(), Some("snow \u{2603}"));
}

#[test]
fn test_transcode_helper() {
    assert_eq!(encoding::transcode(b"na\xEFve", "latin1").unwrap(), "na\u{ef}ve");
    assert!(encoding::lookup("no-such-encoding").is_err());
}
