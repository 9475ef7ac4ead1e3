//! Raw RFC 822 message to [`MessageRecord`].

use mdmailbox_mime::Message;
use sha2::{Digest, Sha256};

use super::ImportResult;
use crate::message::MessageRecord;

/// A parsed source message and the fingerprint of its raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedMessage {
    /// Parsed record, with `original_hash` set.
    pub record: MessageRecord,
    /// SHA-256 of the raw message.
    pub original_hash: String,
}

/// SHA-256 of `raw` as 64 lowercase hex characters.
#[must_use]
pub fn fingerprint(raw: &[u8]) -> String {
    format!("{:x}", Sha256::digest(raw))
}

/// Parses a raw message.
///
/// Message-ID and Date are optional. The body is the first `text/plain`
/// part, transfer-decoded, with line breaks preserved.
///
/// # Errors
///
/// Returns an error if the input has no header section.
pub fn parse_rfc822(raw: &[u8]) -> ImportResult<ImportedMessage> {
    let message = Message::parse(raw)?;
    let original_hash = fingerprint(raw);

    let record = MessageRecord {
        from: message.from_addresses().into_iter().next().unwrap_or_default(),
        to: message.to_addresses(),
        cc: message.cc_addresses(),
        subject: message.subject().unwrap_or_default().trim().to_string(),
        body: message.text_body(),
        message_id: message.message_id().filter(|id| !id.is_empty()),
        date: message.date().map(|d| d.to_rfc3339()),
        original_hash: Some(original_hash.clone()),
        ..MessageRecord::default()
    };

    Ok(ImportedMessage {
        record,
        original_hash,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const RAW: &[u8] = b"From: Sender Name <sender@example.com>\r\n\
        To: alice@example.com, \"Bob\" <bob@example.com>\r\n\
        Cc: charlie@example.com\r\n\
        Subject: =?utf-8?B?SGVsbG8gV29ybGQ=?=\r\n\
        Date: Thu, 23 Jan 2025 10:30:00 +0100\r\n\
        Message-ID: <abc123@example.com>\r\n\
        \r\n\
        Line one\r\n\
        Line two\r\n";

    #[test]
    fn test_parse_rfc822() {
        let imported = parse_rfc822(RAW).unwrap();
        let record = &imported.record;
        assert_eq!(record.from, "sender@example.com");
        assert_eq!(record.to, vec!["alice@example.com", "bob@example.com"]);
        assert_eq!(record.cc, vec!["charlie@example.com"]);
        assert_eq!(record.subject, "Hello World");
        assert_eq!(record.date.as_deref(), Some("2025-01-23T10:30:00+01:00"));
        assert_eq!(record.message_id.as_deref(), Some("<abc123@example.com>"));
        assert_eq!(record.body, "Line one\nLine two\n");
        assert_eq!(imported.original_hash.len(), 64);
        assert_eq!(record.original_hash.as_deref(), Some(imported.original_hash.as_str()));
    }

    #[test]
    fn test_missing_optional_headers() {
        let imported = parse_rfc822(b"From: a@b.c\nSubject: hi\n\nbody\n").unwrap();
        assert!(imported.record.date.is_none());
        assert!(imported.record.message_id.is_none());
        assert!(imported.record.to.is_empty());
    }

    #[test]
    fn test_encoded_display_names_with_commas() {
        let raw = b"From: =?utf-8?Q?Doe=2C_John?= <john@example.com>\r\n\
            To: =?utf-8?B?U21pdGgsIEFubg==?= <ann@example.com>\r\n\
            Subject: hi\r\n\r\nbody\r\n";
        let record = parse_rfc822(raw).unwrap().record;
        assert_eq!(record.from, "john@example.com");
        assert_eq!(record.to, vec!["ann@example.com"]);
        assert_eq!(
            crate::import::generate_filename(None, &record.from, &record.subject),
            "0000-00-00-john-hi.md"
        );
    }

    #[test]
    fn test_no_headers_fails() {
        assert!(parse_rfc822(b"").is_err());
    }

    #[test]
    fn test_fingerprint_is_sha256_hex() {
        assert_eq!(
            fingerprint(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_ne!(fingerprint(b"abc"), fingerprint(b"abd"));
    }
}
