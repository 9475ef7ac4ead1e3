//! RFC 822 message parsing.

use crate::address::parse_address_list;
use crate::content_type::ContentType;
use crate::encoding::{decode_base64, decode_charset, decode_quoted_printable};
use crate::error::{Error, Result};
use crate::header::Headers;
use chrono::{DateTime, FixedOffset};
use std::fmt;

/// Nesting limit for multipart bodies.
const MAX_DEPTH: usize = 16;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit text.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit, // Default (includes "7bit")
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// A parsed message or message part: headers plus the undecoded body.
#[derive(Debug, Clone)]
pub struct Message {
    /// Message headers.
    pub headers: Headers,
    /// Body bytes exactly as they appeared after the header section.
    pub body: Vec<u8>,
}

impl Message {
    /// Parses a raw RFC 822 message.
    ///
    /// Header bytes that are not valid UTF-8 are decoded lossily.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoHeaders`] if no header could be read.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let message = Self::parse_part(raw);
        if message.headers.is_empty() {
            return Err(Error::NoHeaders);
        }
        Ok(message)
    }

    /// Parses a body part, which may legitimately have no headers.
    fn parse_part(raw: &[u8]) -> Self {
        let (head, body) = split_head_body(raw);
        Self {
            headers: Headers::parse(&String::from_utf8_lossy(head)),
            body: body.to_vec(),
        }
    }

    /// Gets the content type, defaulting to `text/plain` when missing or invalid.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        self.headers
            .get("content-type")
            .and_then(|value| ContentType::parse(value).ok())
            .unwrap_or_else(|| ContentType::new("text", "plain"))
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Gets the decoded Subject header.
    #[must_use]
    pub fn subject(&self) -> Option<String> {
        self.headers.get_decoded("subject")
    }

    /// Gets the bare addresses from the From header.
    #[must_use]
    pub fn from_addresses(&self) -> Vec<String> {
        self.address_header("from")
    }

    /// Gets the bare addresses from all To headers.
    #[must_use]
    pub fn to_addresses(&self) -> Vec<String> {
        self.address_header("to")
    }

    /// Gets the bare addresses from all Cc headers.
    #[must_use]
    pub fn cc_addresses(&self) -> Vec<String> {
        self.address_header("cc")
    }

    /// Splits the raw header value before any decoding: encoded display
    /// names may carry commas, and only the addr-spec is kept anyway.
    fn address_header(&self, name: &str) -> Vec<String> {
        self.headers
            .get_all(name)
            .into_iter()
            .flat_map(parse_address_list)
            .collect()
    }

    /// Gets the Message-ID header, trimmed.
    #[must_use]
    pub fn message_id(&self) -> Option<String> {
        self.headers
            .get("message-id")
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(ToString::to_string)
    }

    /// Parses the Date header.
    ///
    /// Accepts RFC 2822 dates with or without a trailing comment such as
    /// `(UTC)`, and RFC 3339 timestamps. Unparseable dates yield `None`.
    #[must_use]
    pub fn date(&self) -> Option<DateTime<FixedOffset>> {
        let raw = self.headers.get("date")?;
        let without_comment = raw.split('(').next().unwrap_or(raw).trim();
        DateTime::parse_from_rfc2822(without_comment)
            .or_else(|_| DateTime::parse_from_rfc3339(without_comment))
            .ok()
    }

    /// Extracts the body as text.
    ///
    /// Picks the first `text/plain` part (searching nested multiparts), then
    /// any other text part, and finally falls back to the raw body. Line
    /// endings are normalized to `\n`.
    #[must_use]
    pub fn text_body(&self) -> String {
        let text = self
            .find_text(0, true)
            .or_else(|| self.find_text(0, false))
            .unwrap_or_else(|| String::from_utf8_lossy(&self.body).into_owned());
        text.replace("\r\n", "\n")
    }

    fn find_text(&self, depth: usize, plain_only: bool) -> Option<String> {
        let content_type = self.content_type();

        if content_type.is_multipart() {
            if depth >= MAX_DEPTH {
                return None;
            }
            let boundary = content_type.boundary()?;
            return split_multipart(&self.body, boundary)
                .into_iter()
                .map(Self::parse_part)
                .find_map(|part| part.find_text(depth + 1, plain_only));
        }

        let wanted = if plain_only {
            content_type.is_text_plain()
        } else {
            content_type.main_type == "text"
        };
        if !wanted || self.is_attachment() {
            return None;
        }

        let charset = content_type.charset().unwrap_or("utf-8");
        Some(decode_charset(&self.decode_body(), charset))
    }

    fn is_attachment(&self) -> bool {
        self.headers
            .get("content-disposition")
            .is_some_and(|d| d.trim_start().to_ascii_lowercase().starts_with("attachment"))
    }

    /// Decodes the body according to the transfer encoding.
    ///
    /// Invalid Base64 falls back to the raw bytes.
    #[must_use]
    pub fn decode_body(&self) -> Vec<u8> {
        match self.transfer_encoding() {
            TransferEncoding::Base64 => decode_base64(&String::from_utf8_lossy(&self.body))
                .unwrap_or_else(|_| self.body.clone()),
            TransferEncoding::QuotedPrintable => decode_quoted_printable(&self.body),
            _ => self.body.clone(),
        }
    }
}

/// Splits raw bytes at the first empty line.
fn split_head_body(raw: &[u8]) -> (&[u8], &[u8]) {
    let mut offset = 0;
    for line in raw.split_inclusive(|&b| b == b'\n') {
        if line == b"\n" || line == b"\r\n" {
            return (&raw[..offset], &raw[offset + line.len()..]);
        }
        offset += line.len();
    }
    (raw, &[])
}

/// Splits a multipart body into its parts, ignoring preamble and epilogue.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Vec<&'a [u8]> {
    let delimiter = format!("--{boundary}");
    let delimiter = delimiter.as_bytes();
    let mut parts = Vec::new();
    let mut current_start: Option<usize> = None;
    let mut offset = 0;

    for line in body.split_inclusive(|&b| b == b'\n') {
        let content = line.strip_suffix(b"\n").unwrap_or(line);
        let content = content.strip_suffix(b"\r").unwrap_or(content);

        if let Some(rest) = content.strip_prefix(delimiter) {
            let is_close = rest.starts_with(b"--");
            if is_close || rest.iter().all(u8::is_ascii_whitespace) {
                if let Some(start) = current_start.take() {
                    parts.push(strip_line_break(&body[start..offset]));
                }
                if is_close {
                    return parts;
                }
                current_start = Some(offset + line.len());
            }
        }
        offset += line.len();
    }

    if let Some(start) = current_start {
        parts.push(&body[start..]);
    }
    parts
}

/// Removes the line break that belongs to the following boundary delimiter.
fn strip_line_break(part: &[u8]) -> &[u8] {
    part.strip_suffix(b"\r\n")
        .or_else(|| part.strip_suffix(b"\n"))
        .unwrap_or(part)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_transfer_encoding_parse() {
        assert_eq!(TransferEncoding::parse("7bit"), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::parse("BASE64"), TransferEncoding::Base64);
        assert_eq!(
            TransferEncoding::parse("quoted-printable"),
            TransferEncoding::QuotedPrintable
        );
    }

    #[test]
    fn test_parse_simple_message() {
        let raw = b"From: sender@example.com\nTo: recipient@example.com\nSubject: Test Email\nMessage-ID: <test123@example.com>\nDate: Thu, 23 Jan 2025 10:30:00 +0000\n\nThis is the body.\n";
        let message = Message::parse(raw).unwrap();

        assert_eq!(message.from_addresses(), vec!["sender@example.com"]);
        assert_eq!(message.to_addresses(), vec!["recipient@example.com"]);
        assert_eq!(message.subject().as_deref(), Some("Test Email"));
        assert_eq!(message.message_id().as_deref(), Some("<test123@example.com>"));
        let date = message.date().unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2025, 1, 23));
        assert_eq!(message.text_body(), "This is the body.\n");
    }

    #[test]
    fn test_parse_tolerates_missing_date_and_id() {
        let raw = b"From: a@example.com\r\nSubject: Hi\r\n\r\nline one\r\nline two\r\n";
        let message = Message::parse(raw).unwrap();
        assert!(message.date().is_none());
        assert!(message.message_id().is_none());
        assert_eq!(message.text_body(), "line one\nline two\n");
    }

    #[test]
    fn test_parse_date_with_comment() {
        let raw = b"Date: Wed, 22 Jan 2025 15:00:00 +0000 (UTC)\n\n";
        let message = Message::parse(raw).unwrap();
        assert!(message.date().is_some());
    }

    #[test]
    fn test_parse_without_headers_fails() {
        assert!(matches!(Message::parse(b"\nbody only"), Err(Error::NoHeaders)));
        assert!(matches!(Message::parse(b""), Err(Error::NoHeaders)));
    }

    #[test]
    fn test_quoted_printable_latin1_body() {
        let raw = b"From: a@example.com\nContent-Type: text/plain; charset=iso-8859-1\nContent-Transfer-Encoding: quoted-printable\n\nCaf=E9 au lait=\n tonight\n";
        let message = Message::parse(raw).unwrap();
        assert_eq!(message.text_body(), "Café au lait tonight\n");
    }

    #[test]
    fn test_multipart_alternative_prefers_plain() {
        let raw = concat!(
            "From: a@example.com\r\n",
            "Content-Type: multipart/alternative; boundary=\"XYZ\"\r\n",
            "\r\n",
            "preamble\r\n",
            "--XYZ\r\n",
            "Content-Type: text/html; charset=utf-8\r\n",
            "\r\n",
            "<p>Hello</p>\r\n",
            "--XYZ\r\n",
            "Content-Type: text/plain; charset=utf-8\r\n",
            "Content-Transfer-Encoding: base64\r\n",
            "\r\n",
            "SMOpbGxvCg==\r\n",
            "--XYZ--\r\n",
            "epilogue\r\n"
        );
        let message = Message::parse(raw.as_bytes()).unwrap();
        assert_eq!(message.text_body(), "Héllo\n");
    }

    #[test]
    fn test_nested_multipart_skips_attachments() {
        let raw = concat!(
            "From: a@example.com\n",
            "Content-Type: multipart/mixed; boundary=outer\n",
            "\n",
            "--outer\n",
            "Content-Type: text/plain\n",
            "Content-Disposition: attachment; filename=notes.txt\n",
            "\n",
            "attached notes\n",
            "--outer\n",
            "Content-Type: multipart/alternative; boundary=inner\n",
            "\n",
            "--inner\n",
            "Content-Type: text/plain\n",
            "\n",
            "inline text\n",
            "--inner--\n",
            "--outer--\n"
        );
        let message = Message::parse(raw.as_bytes()).unwrap();
        assert_eq!(message.text_body(), "inline text");
    }

    #[test]
    fn test_html_only_falls_back_to_html_text() {
        let raw = concat!(
            "From: a@example.com\n",
            "Content-Type: multipart/alternative; boundary=b\n",
            "\n",
            "--b\n",
            "Content-Type: text/html\n",
            "\n",
            "<b>bold</b>\n",
            "--b--\n"
        );
        let message = Message::parse(raw.as_bytes()).unwrap();
        assert_eq!(message.text_body(), "<b>bold</b>");
    }

    #[test]
    fn test_encoded_address_headers() {
        let raw = b"From: =?utf-8?Q?J=C3=B6rg?= <joerg@example.com>\nTo: a@x.org, \"B, C\" <bc@y.org>\nTo: d@z.org\nCc: e@w.org\n\n";
        let message = Message::parse(raw).unwrap();
        assert_eq!(message.from_addresses(), vec!["joerg@example.com"]);
        assert_eq!(message.to_addresses(), vec!["a@x.org", "bc@y.org", "d@z.org"]);
        assert_eq!(message.cc_addresses(), vec!["e@w.org"]);
    }

    #[test]
    fn test_encoded_display_name_with_comma() {
        let raw = b"From: =?utf-8?Q?Doe=2C_John?= <john@example.com>\r\n\
            To: =?utf-8?B?U21pdGgsIEFubg==?= <ann@example.com>\r\n\
            Subject: hi\r\n\r\nbody\r\n";
        let message = Message::parse(raw).unwrap();
        assert_eq!(message.from_addresses(), vec!["john@example.com"]);
        assert_eq!(message.to_addresses(), vec!["ann@example.com"]);
    }
}
