//! Destination filenames for imported messages.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::address::local_part;

/// Default maximum length of the sender slug.
pub const SENDER_SLUG_LEN: usize = 20;

/// Default maximum length of the subject slug.
pub const SUBJECT_SLUG_LEN: usize = 50;

/// Lowercases `text`, collapses every run of non-alphanumeric characters to
/// a single `-` and truncates to `max_len` characters.
///
/// Returns `unknown` when nothing is left.
#[must_use]
pub fn slugify(text: &str, max_len: usize) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug.truncate(max_len);
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "unknown".to_string()
    } else {
        slug.to_string()
    }
}

/// Builds `<date>-<sender>-<subject>.md`.
///
/// The date is `0000-00-00` when unknown; the sender slug comes from the
/// local part of `from`.
#[must_use]
pub fn generate_filename(date: Option<NaiveDate>, from: &str, subject: &str) -> String {
    let date = date.map_or_else(|| "0000-00-00".to_string(), |d| d.format("%Y-%m-%d").to_string());
    let sender = slugify(local_part(from), SENDER_SLUG_LEN);
    let subject = slugify(subject, SUBJECT_SLUG_LEN);
    format!("{date}-{sender}-{subject}.md")
}

/// Makes `filename` unique against `existing`.
///
/// The first fallback appends the first 8 hex digits of `fingerprint`; after
/// that a counter starting at 2 is added as well.
#[must_use]
pub fn unique_filename(filename: &str, fingerprint: &str, existing: &HashSet<String>) -> String {
    if !existing.contains(filename) {
        return filename.to_string();
    }

    let stem = filename.strip_suffix(".md").unwrap_or(filename);
    let short = fingerprint.get(..8).unwrap_or(fingerprint);

    let candidate = format!("{stem}-{short}.md");
    if !existing.contains(&candidate) {
        return candidate;
    }

    (2_usize..)
        .map(|n| format!("{stem}-{short}-{n}.md"))
        .find(|candidate| !existing.contains(candidate))
        .unwrap_or(candidate)
}
