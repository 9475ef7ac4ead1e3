//! MIME encoding and decoding utilities.
//!
//! Decoding is lenient throughout: imported mail is frequently malformed and
//! a bad escape sequence must never cost the whole message.

use crate::error::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Maximum number of raw bytes packed into one RFC 2047 encoded word.
const ENCODED_WORD_CHUNK: usize = 45;

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes Base64 data, ignoring embedded whitespace and line breaks.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

const fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Decodes Quoted-Printable data (RFC 2045).
///
/// Soft line breaks are removed. An `=` that does not start a valid escape
/// is kept as a literal character.
#[must_use]
pub fn decode_quoted_printable(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        let byte = input[i];
        if byte != b'=' {
            out.push(byte);
            i += 1;
            continue;
        }

        // Soft line break
        if input.get(i + 1..i + 3) == Some(&b"\r\n"[..]) {
            i += 3;
            continue;
        }
        if input.get(i + 1) == Some(&b'\n') {
            i += 2;
            continue;
        }

        let escaped = input
            .get(i + 1..i + 3)
            .and_then(|hex| Some((hex_value(hex[0])? << 4) | hex_value(hex[1])?));
        if let Some(value) = escaped {
            out.push(value);
            i += 3;
        } else {
            out.push(b'=');
            i += 1;
        }
    }

    out
}

/// Converts bytes in the named charset to a `String`.
///
/// UTF-8 and ASCII are decoded lossily; the Latin-1 family maps each byte to
/// the code point of the same value. Unknown charsets fall back to lossy UTF-8.
#[must_use]
pub fn decode_charset(bytes: &[u8], charset: &str) -> String {
    // RFC 2231 allows a language suffix: utf-8*en
    let charset = charset
        .split('*')
        .next()
        .unwrap_or(charset)
        .trim()
        .to_ascii_lowercase();

    match charset.as_str() {
        "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" | "windows-1252" | "cp1252" => {
            bytes.iter().map(|&b| char::from(b)).collect()
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Encodes a header value using RFC 2047 `B` encoding when it is not plain ASCII.
///
/// Long values are split into several encoded words on character boundaries.
#[must_use]
pub fn encode_rfc2047(text: &str) -> String {
    if text.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) {
        return text.to_string();
    }

    let mut words = Vec::new();
    let mut chunk = String::new();
    for ch in text.chars() {
        if chunk.len() + ch.len_utf8() > ENCODED_WORD_CHUNK {
            words.push(format!("=?utf-8?B?{}?=", encode_base64(chunk.as_bytes())));
            chunk.clear();
        }
        chunk.push(ch);
    }
    if !chunk.is_empty() {
        words.push(format!("=?utf-8?B?{}?=", encode_base64(chunk.as_bytes())));
    }

    words.join(" ")
}

/// Decodes every RFC 2047 encoded word in a header value.
///
/// Whitespace between two adjacent encoded words is dropped, as the RFC
/// requires. Malformed encoded words are left untouched.
#[must_use]
pub fn decode_rfc2047(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut last_was_encoded = false;

    while let Some(start) = rest.find("=?") {
        let (before, candidate) = rest.split_at(start);
        if let Some((decoded, consumed)) = parse_encoded_word(candidate) {
            if !(last_was_encoded && before.trim().is_empty()) {
                out.push_str(before);
            }
            out.push_str(&decoded);
            rest = &candidate[consumed..];
            last_was_encoded = true;
        } else {
            out.push_str(before);
            out.push_str("=?");
            rest = &candidate[2..];
            last_was_encoded = false;
        }
    }

    out.push_str(rest);
    out
}

/// Parses one `=?charset?encoding?text?=` word at the start of `s`.
///
/// Returns the decoded text and the number of bytes consumed.
fn parse_encoded_word(s: &str) -> Option<(String, usize)> {
    let inner = s.strip_prefix("=?")?;
    let (charset, rest) = inner.split_once('?')?;
    let (encoding, rest) = rest.split_once('?')?;
    let end = rest.find("?=")?;
    let encoded = &rest[..end];

    if charset.is_empty()
        || charset.contains(char::is_whitespace)
        || encoding.len() != 1
        || encoded.contains(char::is_whitespace)
    {
        return None;
    }

    let bytes = match encoding {
        "B" | "b" => decode_base64(encoded).ok()?,
        "Q" | "q" => decode_quoted_printable(encoded.replace('_', " ").as_bytes()),
        _ => return None,
    };

    let consumed = 2 + charset.len() + 1 + encoding.len() + 1 + end + 2;
    Some((decode_charset(&bytes, charset), consumed))
}
