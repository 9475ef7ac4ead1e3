//! Text file serialization.

use serde_yaml::{Mapping, Value};

use super::model::MessageRecord;
use super::{MessageError, MessageResult};

const DELIMITER: &str = "---";

/// Header keys in emission order.
const KNOWN_KEYS: [&str; 9] = [
    "from",
    "to",
    "cc",
    "bcc",
    "subject",
    "date",
    "message-id",
    "account",
    "original-hash",
];

impl MessageRecord {
    /// Parses a message file.
    ///
    /// Only the first `---` delimited block is read as headers; anything after
    /// its closing line, including an appended send log, is body text.
    ///
    /// # Errors
    ///
    /// Returns an error if the header block is missing, unterminated, not a
    /// YAML mapping, or has a known field of the wrong shape.
    pub fn from_text(text: &str) -> MessageResult<Self> {
        let (header, body) = split_header_block(text)?;

        let mapping = match serde_yaml::from_str::<Value>(header)? {
            Value::Mapping(mapping) => mapping,
            Value::Null => Mapping::new(),
            _ => return Err(MessageError::NotAMapping),
        };

        let mut record = Self {
            body: normalize_body(body),
            ..Self::default()
        };

        for (key, value) in mapping {
            let Some(name) = key.as_str().filter(|k| KNOWN_KEYS.contains(k)) else {
                record.extra.insert(key, value);
                continue;
            };
            match name {
                "from" => record.from = scalar("from", value)?.unwrap_or_default(),
                "to" => record.to = address_list("to", value)?,
                "cc" => record.cc = address_list("cc", value)?,
                "bcc" => record.bcc = address_list("bcc", value)?,
                "subject" => record.subject = scalar("subject", value)?.unwrap_or_default(),
                "date" => record.date = scalar("date", value)?,
                "message-id" => record.message_id = scalar("message-id", value)?,
                "account" => record.account = scalar("account", value)?,
                _ => record.original_hash = scalar("original-hash", value)?,
            }
        }

        Ok(record)
    }

    /// Serializes the record to the message file format.
    ///
    /// Empty fields are omitted. Single-recipient lists are written as a
    /// plain scalar.
    ///
    /// # Errors
    ///
    /// Returns an error if the header mapping cannot be encoded.
    pub fn to_text(&self) -> MessageResult<String> {
        let mut mapping = Mapping::new();
        let mut put = |key: &str, value: Value| {
            mapping.insert(Value::String(key.to_string()), value);
        };

        if !self.from.is_empty() {
            put("from", Value::String(self.from.clone()));
        }
        for (key, list) in [("to", &self.to), ("cc", &self.cc), ("bcc", &self.bcc)] {
            if let Some(value) = list_value(list) {
                put(key, value);
            }
        }
        if !self.subject.is_empty() {
            put("subject", Value::String(self.subject.clone()));
        }
        for (key, field) in [
            ("date", &self.date),
            ("message-id", &self.message_id),
            ("account", &self.account),
            ("original-hash", &self.original_hash),
        ] {
            if let Some(value) = field.as_ref().filter(|v| !v.is_empty()) {
                put(key, Value::String(value.clone()));
            }
        }
        for (key, value) in &self.extra {
            mapping.insert(key.clone(), value.clone());
        }

        let header = if mapping.is_empty() {
            String::new()
        } else {
            serde_yaml::to_string(&mapping)?
        };

        let body = normalize_body(&self.body);
        Ok(format!("{DELIMITER}\n{header}{DELIMITER}\n\n{body}"))
    }
}

/// Splits off the header block; the body keeps everything after the closing
/// delimiter line minus at most one blank line.
fn split_header_block(text: &str) -> MessageResult<(&str, &str)> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let (first, rest) = split_line(text);
    if first.trim_end() != DELIMITER {
        return Err(MessageError::MissingHeaderBlock);
    }

    let mut offset = 0;
    let mut remaining = rest;
    while !remaining.is_empty() {
        let (line, after) = split_line(remaining);
        if line.trim_end() == DELIMITER {
            let header = &rest[..offset];
            let body = after
                .strip_prefix("\r\n")
                .or_else(|| after.strip_prefix('\n'))
                .unwrap_or(after);
            return Ok((header, body));
        }
        offset += remaining.len() - after.len();
        remaining = after;
    }
    Err(MessageError::UnterminatedHeaderBlock)
}

/// Returns the first line (without terminator) and the text after it.
fn split_line(text: &str) -> (&str, &str) {
    text.find('\n').map_or((text, ""), |idx| {
        let line = &text[..idx];
        (line.strip_suffix('\r').unwrap_or(line), &text[idx + 1..])
    })
}

/// Ends non-empty bodies with exactly one newline.
fn normalize_body(body: &str) -> String {
    let trimmed = body.trim_end_matches(['\n', '\r']);
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}\n")
    }
}

fn scalar(field: &'static str, value: Value) -> MessageResult<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(MessageError::InvalidField {
            field,
            reason: format!("expected a single value, got {}", kind(&other)),
        }),
    }
}

fn address_list(field: &'static str, value: Value) -> MessageResult<Vec<String>> {
    match value {
        Value::Sequence(items) => items
            .into_iter()
            .filter_map(|item| scalar(field, item).transpose())
            .collect(),
        other => Ok(scalar(field, other)?.into_iter().collect()),
    }
}

fn list_value(list: &[String]) -> Option<Value> {
    match list {
        [] => None,
        [single] => Some(Value::String(single.clone())),
        many => Some(Value::Sequence(
            many.iter().cloned().map(Value::String).collect(),
        )),
    }
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
        _ => "a scalar",
    }
}
