//! Encoding detection and transcoding.
//!
//! Implements BOM sniffing and XML declaration encoding detection per
//! XML 1.0 Section 4.3.3 and Appendix F, bridging to `encoding_rs` for the
//! actual conversion in both directions.
//!
//! # Resolution order
//!
//! 1. A Byte Order Mark at the start of the input.
//! 2. The `encoding=` pseudo-attribute of the XML declaration.
//! 3. The caller's default encoding hint, if any.
//! 4. UTF-8.
//!
//! A declaration that contradicts the BOM, or that names a UTF-16 encoding
//! for bytes that are visibly ASCII-compatible, is rejected rather than
//! silently trusted. Decoding never substitutes replacement characters:
//! malformed input is an error.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use thiserror::Error;

/// An error that occurs during encoding detection or transcoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("encoding error: {message}")]
pub struct EncodingError {
    /// A human-readable description of the encoding error.
    pub message: String,
}

impl EncodingError {
    /// Creates a new `EncodingError` with the given message.
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The result of decoding an input byte buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedInput {
    /// The decoded text, with any BOM removed.
    pub text: String,
    /// The canonical name of the encoding that was used.
    pub encoding: &'static str,
}

/// Detects the encoding of an XML byte stream by inspecting the Byte Order Mark.
///
/// Returns the encoding and the number of BOM bytes to skip, or `None` if
/// the input does not start with a BOM.
///
/// # Examples
///
/// ```
/// use jebixml::encoding::detect_bom;
///
/// let (enc, skip) = detect_bom(b"\xEF\xBB\xBFhello").unwrap();
/// assert_eq!(enc.name(), "UTF-8");
/// assert_eq!(skip, 3);
///
/// assert!(detect_bom(b"<root/>").is_none());
/// ```
#[must_use]
pub fn detect_bom(bytes: &[u8]) -> Option<(&'static Encoding, usize)> {
    match bytes {
        [0xEF, 0xBB, 0xBF, ..] => Some((UTF_8, 3)),
        [0xFE, 0xFF, ..] => Some((UTF_16BE, 2)),
        [0xFF, 0xFE, ..] => Some((UTF_16LE, 2)),
        _ => None,
    }
}

/// Guesses a UTF-16 byte order from the first four bytes of BOM-less input.
///
/// Per XML 1.0 Appendix F, a document that starts with `<?` encoded as
/// UTF-16 can be recognized without a BOM.
fn sniff_utf16_without_bom(bytes: &[u8]) -> Option<&'static Encoding> {
    match bytes {
        [0x3C, 0x00, 0x3F, 0x00, ..] => Some(UTF_16LE),
        [0x00, 0x3C, 0x00, 0x3F, ..] => Some(UTF_16BE),
        _ => None,
    }
}

/// Looks up an encoding by its IANA label.
///
/// # Errors
///
/// Returns `EncodingError` if `encoding_rs` does not know the label.
pub fn lookup(label: &str) -> Result<&'static Encoding, EncodingError> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| EncodingError::new(format!("unsupported encoding: {label}")))
}

/// Transcodes a byte slice from the named encoding into a UTF-8 `String`.
///
/// # Errors
///
/// Returns `EncodingError` if the encoding name is not recognized or if
/// the input contains malformed byte sequences.
///
/// # Examples
///
/// ```
/// use jebixml::encoding::transcode;
///
/// let result = transcode(b"caf\xE9", "ISO-8859-1").unwrap();
/// assert_eq!(result, "caf\u{e9}");
/// ```
pub fn transcode(bytes: &[u8], encoding_name: &str) -> Result<String, EncodingError> {
    decode_with(bytes, lookup(encoding_name)?)
}

fn decode_with(bytes: &[u8], encoding: &'static Encoding) -> Result<String, EncodingError> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(Cow::into_owned)
        .ok_or_else(|| {
            EncodingError::new(format!(
                "malformed byte sequence for encoding {}",
                encoding.name()
            ))
        })
}

fn is_utf16(encoding: &'static Encoding) -> bool {
    encoding == UTF_16LE || encoding == UTF_16BE
}

/// Returns `true` if a declared encoding agrees with the one actually in use.
///
/// `UTF-16` without a byte order is compatible with either UTF-16 variant,
/// because the BOM determines the actual byte order.
fn is_compatible(declared: &'static Encoding, actual: &'static Encoding) -> bool {
    declared == actual || (is_utf16(declared) && is_utf16(actual))
}

/// Decodes raw XML bytes into a UTF-8 string.
///
/// `default_encoding` is only consulted when the input carries neither a BOM
/// nor an encoding declaration.
///
/// # Errors
///
/// Returns `EncodingError` if an encoding label is unknown, if the
/// declaration contradicts the BOM or the byte layout, or if the bytes are
/// malformed for the resolved encoding.
///
/// # Examples
///
/// ```
/// use jebixml::encoding::decode;
///
/// let decoded = decode(b"<?xml version=\"1.0\"?><root/>", None).unwrap();
/// assert_eq!(decoded.text, "<?xml version=\"1.0\"?><root/>");
/// assert_eq!(decoded.encoding, "UTF-8");
/// ```
pub fn decode(bytes: &[u8], default_encoding: Option<&str>) -> Result<DecodedInput, EncodingError> {
    if let Some((bom_encoding, skip)) = detect_bom(bytes) {
        let text = decode_with(&bytes[skip..], bom_encoding)?;
        if let Some(declared) = extract_xml_decl_encoding(&text) {
            let declared_encoding = lookup(&declared)?;
            if !is_compatible(declared_encoding, bom_encoding) {
                return Err(EncodingError::new(format!(
                    "byte order mark indicates {} but encoding declared as '{declared}'",
                    bom_encoding.name()
                )));
            }
        }
        return Ok(DecodedInput {
            text,
            encoding: bom_encoding.name(),
        });
    }

    if let Some(utf16) = sniff_utf16_without_bom(bytes) {
        let text = decode_with(bytes, utf16)?;
        if let Some(declared) = extract_xml_decl_encoding(&text) {
            if !is_utf16(lookup(&declared)?) {
                return Err(EncodingError::new(format!(
                    "document is UTF-16 encoded but encoding declared as '{declared}'"
                )));
            }
        }
        return Ok(DecodedInput {
            text,
            encoding: utf16.name(),
        });
    }

    let resolved = match extract_encoding_from_ascii_bytes(bytes) {
        Some(declared) => {
            let encoding = lookup(&declared)?;
            if is_utf16(encoding) {
                return Err(EncodingError::new(format!(
                    "encoding declared as '{declared}' but the document is not UTF-16 encoded"
                )));
            }
            encoding
        }
        None => match default_encoding {
            Some(label) => lookup(label)?,
            None => UTF_8,
        },
    };

    let text = decode_with(bytes, resolved)?;
    Ok(DecodedInput {
        text,
        encoding: resolved.name(),
    })
}

/// Encodes UTF-8 text into the named encoding.
///
/// UTF-16 output is prefixed with a byte order mark. Characters that the
/// target encoding cannot represent are written as numeric character
/// references, which is only well-formed inside text and attribute values.
///
/// # Errors
///
/// Returns `EncodingError` if the label is unknown.
pub fn encode(text: &str, encoding_name: &str) -> Result<Vec<u8>, EncodingError> {
    let encoding = lookup(encoding_name)?;
    if is_utf16(encoding) {
        let big_endian = encoding == UTF_16BE;
        let mut out = Vec::with_capacity(2 + text.len() * 2);
        for unit in std::iter::once(0xFEFF_u16).chain(text.encode_utf16()) {
            if big_endian {
                out.extend_from_slice(&unit.to_be_bytes());
            } else {
                out.extend_from_slice(&unit.to_le_bytes());
            }
        }
        return Ok(out);
    }
    let (bytes, _, _) = encoding.encode(text);
    Ok(bytes.into_owned())
}

/// Extracts the `encoding` pseudo-attribute from an XML declaration.
///
/// This is a lightweight scan that does not run the full parser. Returns
/// `None` if there is no declaration or it has no encoding.
fn extract_xml_decl_encoding(text: &str) -> Option<String> {
    if !text.starts_with("<?xml") {
        return None;
    }
    extract_encoding_from_ascii_bytes(text.as_bytes())
}

/// Extracts the `encoding` pseudo-attribute from raw bytes read as ASCII.
///
/// The XML declaration must consist of ASCII characters, so an
/// ASCII-compatible encoding can be identified before decoding.
fn extract_encoding_from_ascii_bytes(bytes: &[u8]) -> Option<String> {
    let scan = &bytes[..bytes.len().min(200)];
    if !scan.starts_with(b"<?xml") {
        return None;
    }
    let decl_end = scan.windows(2).position(|w| w == b"?>")?;
    let decl = &scan[..decl_end];

    let needle = b"encoding";
    let enc_pos = decl.windows(needle.len()).position(|w| w == needle)?;
    let after_enc = skip_ascii_whitespace(&decl[enc_pos + needle.len()..]);
    let after_eq = skip_ascii_whitespace(after_enc.strip_prefix(b"=")?);

    let quote = *after_eq.first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let value = &after_eq[1..];
    let end = value.iter().position(|&b| b == quote)?;
    let label = &value[..end];
    label
        .iter()
        .all(u8::is_ascii)
        .then(|| String::from_utf8_lossy(label).into_owned())
}

fn skip_ascii_whitespace(bytes: &[u8]) -> &[u8] {
    let skip = bytes
        .iter()
        .take_while(|&&b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
        .count();
    &bytes[skip..]
}
