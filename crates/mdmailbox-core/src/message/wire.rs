//! Conversion to an outgoing MIME message.

use chrono::{DateTime, FixedOffset};
use mdmailbox_mime::{MessageBuilder, OutgoingMessage};
use rand::Rng;

use super::MessageResult;
use super::model::MessageRecord;
use crate::address::domain_of;

impl MessageRecord {
    /// Builds the message handed to SMTP.
    ///
    /// A missing Message-ID is generated and a missing or unparseable date is
    /// taken from `now`. Bcc recipients are never written as a header.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be built (no sender).
    pub fn to_wire_message(&self, now: DateTime<FixedOffset>) -> MessageResult<OutgoingMessage> {
        let message_id = self
            .message_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| generate_message_id(&self.from, now));
        let date = self.parsed_date().unwrap_or(now);

        let mut builder = MessageBuilder::new()
            .from(self.from.as_str())
            .subject(self.subject.as_str())
            .date(date)
            .message_id(message_id)
            .text_body(self.body.as_str());
        for to in &self.to {
            builder = builder.to(to.as_str());
        }
        for cc in &self.cc {
            builder = builder.cc(cc.as_str());
        }

        Ok(builder.build()?)
    }
}

/// Generates `<timestamp.random@domain>` using the sender's domain.
#[must_use]
pub fn generate_message_id(from: &str, now: DateTime<FixedOffset>) -> String {
    let domain = domain_of(from)
        .map(|d| d.trim_end_matches('>'))
        .filter(|d| !d.is_empty())
        .unwrap_or("localhost");
    let random: u64 = rand::thread_rng().r#gen();
    format!("<{}.{random:016x}@{domain}>", now.timestamp_micros())
}
