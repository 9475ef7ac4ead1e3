//! Drafts and sent mail on disk.
//!
//! Files are never overwritten: a taken name gets `-1`, `-2`, ... appended
//! to its stem. A sent message is written to its new location before the
//! draft is removed.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::import::slugify;
use crate::message::MessageRecord;
use crate::send::SendOutcome;

/// Maximum length of the subject slug in draft filenames.
pub const DRAFT_SLUG_LEN: usize = 50;

/// Maximum length of the subject slug in sent filenames.
pub const SENT_SLUG_LEN: usize = 40;

/// Reads a message file.
///
/// # Errors
///
/// Returns [`Error::NotFound`] for a missing file, or an error if the file
/// cannot be read or parsed.
pub fn read_message(path: &Path) -> Result<MessageRecord> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            Error::NotFound(path.to_path_buf())
        } else {
            Error::Io(e)
        }
    })?;
    let mut record = MessageRecord::from_text(&text)?;
    record.source_path = Some(path.to_path_buf());
    Ok(record)
}

/// Writes a message file, replacing any existing file at `path`.
///
/// # Errors
///
/// Returns an error if the record cannot be serialized or written.
pub fn write_message(record: &MessageRecord, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, record.to_text()?)?;
    Ok(())
}

/// Writes `record` as a new draft in `drafts_dir`.
///
/// The file is named after the subject slug, or `new-draft` without a
/// subject.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be created.
pub fn create_draft(record: &MessageRecord, drafts_dir: &Path) -> Result<PathBuf> {
    let stem = if record.subject.trim().is_empty() {
        "new-draft".to_string()
    } else {
        slugify(&record.subject, DRAFT_SLUG_LEN)
    };
    let text = record.to_text()?;
    let path = create_numbered(drafts_dir, &stem, &text)?;
    info!(path = %path.display(), "draft created");
    Ok(path)
}

/// Moves a successfully sent message into `sent_dir` with its send log.
///
/// The record gets the Message-ID that was used, and `now` as its date if
/// it had none. The new file is named `<date>-<subject-slug>.md` and ends
/// with the audit block from [`audit_block`]. The file at
/// `record.source_path`, if any, is removed afterwards.
///
/// # Errors
///
/// Returns an error if the sent file cannot be written or the draft cannot
/// be removed.
pub fn save_sent(
    record: &mut MessageRecord,
    outcome: &SendOutcome,
    sent_dir: &Path,
    now: DateTime<FixedOffset>,
) -> Result<PathBuf> {
    if let Some(id) = &outcome.message_id {
        record.message_id = Some(id.clone());
    }
    if record.date.as_deref().is_none_or(str::is_empty) {
        record.date = Some(now.to_rfc3339());
    }

    let stem = format!(
        "{}-{}",
        now.format("%Y-%m-%d"),
        slugify(&record.subject, SENT_SLUG_LEN)
    );
    let mut text = record.to_text()?;
    text.push_str(&audit_block(outcome));
    let path = create_numbered(sent_dir, &stem, &text)?;

    if let Some(draft) = record.source_path.take() {
        std::fs::remove_file(&draft)?;
        debug!(draft = %draft.display(), "draft removed");
    }
    record.source_path = Some(path.clone());
    info!(path = %path.display(), "sent message saved");
    Ok(path)
}

/// Renders the send log appended to sent messages.
#[must_use]
pub fn audit_block(outcome: &SendOutcome) -> String {
    let mut lines = vec![String::new(), "---".to_string(), "# Send Log".to_string()];
    if let Some(sent_at) = outcome.sent_at {
        lines.push(format!("sent-at: {}", sent_at.to_rfc3339()));
    }
    if !outcome.smtp_host.is_empty() {
        lines.push(format!("smtp-host: {}", outcome.smtp_host));
    }
    if outcome.smtp_port != 0 {
        lines.push(format!("smtp-port: {}", outcome.smtp_port));
    }
    if let Some(response) = &outcome.smtp_response {
        let escaped = response.replace('\\', "\\\\").replace('"', "\\\"");
        lines.push(format!("smtp-response: \"{escaped}\""));
    }
    lines.push("---".to_string());
    lines.push(String::new());
    lines.extend(outcome.log.iter().cloned());

    let mut block = lines.join("\n");
    block.push('\n');
    block
}

/// Creates `<stem>.md` in `dir`, or the first free `<stem>-<n>.md`.
fn create_numbered(dir: &Path, stem: &str, text: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let mut n = 0_usize;
    loop {
        let name = if n == 0 {
            format!("{stem}.md")
        } else {
            format!("{stem}-{n}.md")
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => {
                write_all(file, text)?;
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => n += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

fn write_all(mut file: File, text: &str) -> Result<()> {
    file.write_all(text.as_bytes())?;
    file.flush()?;
    Ok(())
}
