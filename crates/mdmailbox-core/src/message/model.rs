//! Message record model.

use std::path::PathBuf;

use chrono::{DateTime, FixedOffset};
use serde_yaml::Mapping;

use super::{MessageError, MessageResult};

/// One email as stored in a message file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageRecord {
    /// Sender address.
    pub from: String,
    /// Primary recipients, in order.
    pub to: Vec<String>,
    /// Carbon-copy recipients.
    pub cc: Vec<String>,
    /// Blind carbon-copy recipients. Envelope only, never a header.
    pub bcc: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Body text.
    pub body: String,
    /// Message-ID, with angle brackets.
    pub message_id: Option<String>,
    /// Date as written in the file (ISO 8601 for files this tool writes).
    pub date: Option<String>,
    /// Account label set on import.
    pub account: Option<String>,
    /// SHA-256 of the raw source message, set on import.
    pub original_hash: Option<String>,
    /// Header fields this tool does not interpret, in file order.
    pub extra: Mapping,
    /// Where the record was read from or imported from. Never serialized.
    pub source_path: Option<PathBuf>,
}

impl MessageRecord {
    /// Creates a draft with the given sender, recipient and subject.
    #[must_use]
    pub fn draft(from: impl Into<String>, to: impl Into<String>, subject: impl Into<String>) -> Self {
        let to = to.into();
        Self {
            from: from.into(),
            to: if to.is_empty() { Vec::new() } else { vec![to] },
            subject: subject.into(),
            ..Self::default()
        }
    }

    /// Checks the fields the sender needs: `from`, `to` and `subject`.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::MissingField`] naming the first empty field.
    pub fn validate_for_send(&self) -> MessageResult<()> {
        if self.from.trim().is_empty() {
            return Err(MessageError::MissingField("from"));
        }
        if self.to.iter().all(|addr| addr.trim().is_empty()) {
            return Err(MessageError::MissingField("to"));
        }
        if self.subject.trim().is_empty() {
            return Err(MessageError::MissingField("subject"));
        }
        Ok(())
    }

    /// All envelope recipients: `to`, then `cc`, then `bcc`.
    #[must_use]
    pub fn recipients(&self) -> Vec<&str> {
        self.to
            .iter()
            .chain(&self.cc)
            .chain(&self.bcc)
            .map(String::as_str)
            .filter(|addr| !addr.trim().is_empty())
            .collect()
    }

    /// Parses the `date` field as RFC 3339, falling back to RFC 2822.
    #[must_use]
    pub fn parsed_date(&self) -> Option<DateTime<FixedOffset>> {
        let raw = self.date.as_deref()?.trim();
        DateTime::parse_from_rfc3339(raw)
            .or_else(|_| DateTime::parse_from_rfc2822(raw))
            .ok()
    }
}
