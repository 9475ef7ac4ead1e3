//! Plain-text message generation.

use crate::content_type::ContentType;
use crate::encoding::encode_rfc2047;
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::message::TransferEncoding;
use chrono::{DateTime, FixedOffset};

/// A single-part `text/plain` message ready for SMTP submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Message headers in emission order.
    pub headers: Headers,
    /// Body text with `\n` line endings.
    pub body: String,
}

impl OutgoingMessage {
    /// Gets a header value.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Gets the Message-ID header.
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        self.headers.get("message-id")
    }

    /// Renders the RFC 5322 message with CRLF line endings.
    #[must_use]
    pub fn to_rfc5322(&self) -> String {
        let mut message = self.headers.to_string();
        message.push_str("\r\n");
        message.push_str(&self.body.replace("\r\n", "\n").replace('\n', "\r\n"));
        message
    }
}

/// Builder for [`OutgoingMessage`].
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    from: Option<String>,
    to: Vec<String>,
    cc: Vec<String>,
    subject: Option<String>,
    date: Option<DateTime<FixedOffset>>,
    message_id: Option<String>,
    body: String,
}

impl MessageBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sender.
    #[must_use]
    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Adds a To recipient.
    #[must_use]
    pub fn to(mut self, recipient: impl Into<String>) -> Self {
        self.to.push(recipient.into());
        self
    }

    /// Adds a Cc recipient.
    #[must_use]
    pub fn cc(mut self, recipient: impl Into<String>) -> Self {
        self.cc.push(recipient.into());
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets the Date header.
    #[must_use]
    pub fn date(mut self, date: DateTime<FixedOffset>) -> Self {
        self.date = Some(date);
        self
    }

    /// Sets the Message-ID header.
    #[must_use]
    pub fn message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }

    /// Sets the plain text body.
    #[must_use]
    pub fn text_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Builds the message.
    ///
    /// Header order: From, To, Cc, Subject, Date, Message-ID, then the MIME
    /// headers. Non-ASCII subjects and display names are RFC 2047 encoded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingHeader`] when no sender was set.
    pub fn build(self) -> Result<OutgoingMessage> {
        let from = self.from.ok_or(Error::MissingHeader("From"))?;

        let mut headers = Headers::new();
        headers.add("From", encode_mailbox(&from));
        if !self.to.is_empty() {
            headers.add("To", encode_mailbox_list(&self.to));
        }
        if !self.cc.is_empty() {
            headers.add("Cc", encode_mailbox_list(&self.cc));
        }
        headers.add("Subject", encode_rfc2047(self.subject.as_deref().unwrap_or("")));
        if let Some(date) = self.date {
            headers.add("Date", date.to_rfc2822());
        }
        if let Some(id) = self.message_id {
            headers.add("Message-ID", id);
        }
        headers.add("MIME-Version", "1.0");
        headers.add("Content-Type", ContentType::text_plain().to_string());
        headers.add(
            "Content-Transfer-Encoding",
            TransferEncoding::EightBit.to_string(),
        );

        Ok(OutgoingMessage {
            headers,
            body: self.body,
        })
    }
}

fn encode_mailbox_list(mailboxes: &[String]) -> String {
    mailboxes
        .iter()
        .map(|m| encode_mailbox(m))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Encodes the display name of a `Name <addr>` mailbox; the angle-addr
/// stays as written.
fn encode_mailbox(mailbox: &str) -> String {
    let mailbox = mailbox.trim();
    let Some(open) = mailbox.rfind('<') else {
        return mailbox.to_string();
    };
    let name = mailbox[..open].trim();
    let name = name
        .strip_prefix('"')
        .and_then(|n| n.strip_suffix('"'))
        .unwrap_or(name);
    if name.is_ascii() {
        return mailbox.to_string();
    }
    format!("{} {}", encode_rfc2047(name), &mailbox[open..])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Message;

    #[test]
    fn test_build_requires_from() {
        assert!(matches!(
            MessageBuilder::new().to("a@example.com").build(),
            Err(Error::MissingHeader("From"))
        ));
    }

    #[test]
    fn test_build_headers_in_order() {
        let date = DateTime::parse_from_rfc3339("2025-01-23T10:30:00+00:00").unwrap();
        let message = MessageBuilder::new()
            .from("sender@example.com")
            .to("alice@example.com")
            .to("bob@example.com")
            .cc("charlie@example.com")
            .subject("Hello")
            .date(date)
            .message_id("<1@example.com>")
            .text_body("Line one\nLine two\n")
            .build()
            .unwrap();

        let names: Vec<&str> = message.headers.iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            vec![
                "From",
                "To",
                "Cc",
                "Subject",
                "Date",
                "Message-ID",
                "MIME-Version",
                "Content-Type",
                "Content-Transfer-Encoding"
            ]
        );
        assert_eq!(message.header("To"), Some("alice@example.com, bob@example.com"));
        assert_eq!(message.message_id(), Some("<1@example.com>"));

        let wire = message.to_rfc5322();
        assert!(wire.ends_with("\r\n\r\nLine one\r\nLine two\r\n"));
    }

    #[test]
    fn test_wire_output_parses_back() {
        let message = MessageBuilder::new()
            .from("sender@example.com")
            .to("recipient@example.com")
            .subject("Grüße")
            .text_body("Hallo\n")
            .build()
            .unwrap();

        let parsed = Message::parse(message.to_rfc5322().as_bytes()).unwrap();
        assert_eq!(parsed.subject().as_deref(), Some("Grüße"));
        assert_eq!(parsed.to_addresses(), vec!["recipient@example.com"]);
        assert_eq!(parsed.text_body(), "Hallo\n");
    }

    #[test]
    fn test_non_ascii_display_names_are_encoded() {
        let message = MessageBuilder::new()
            .from("Jörg <j@example.com>")
            .to("\"Ünal, Ayşe\" <ayse@example.com>")
            .to("plain@example.com")
            .cc("Bob <bob@example.com>")
            .build()
            .unwrap();

        let from = message.header("From").unwrap();
        assert!(from.starts_with("=?utf-8?B?"), "{from}");
        assert!(from.ends_with(" <j@example.com>"), "{from}");
        assert!(message.header("To").unwrap().is_ascii());
        assert_eq!(message.header("Cc"), Some("Bob <bob@example.com>"));

        let parsed = Message::parse(message.to_rfc5322().as_bytes()).unwrap();
        assert_eq!(parsed.from_addresses(), vec!["j@example.com"]);
        assert_eq!(
            parsed.to_addresses(),
            vec!["ayse@example.com", "plain@example.com"]
        );
    }
}
