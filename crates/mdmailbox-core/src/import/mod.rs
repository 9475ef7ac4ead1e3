//! Mailbox import pipeline.
//!
//! Each source file goes through `discovered -> parsed -> fingerprinted ->
//! named -> written`, ending as [`ImportOutcome::Written`],
//! [`ImportOutcome::Skipped`] (already in the index for that account) or
//! [`ImportOutcome::Failed`]. A failed message never stops the run.
//!
//! ```ignore
//! use mdmailbox_core::import::{ImportOptions, MemoryIndex, import_mailboxes};
//!
//! let mut index = MemoryIndex::scan_directory(&output)?;
//! let report = import_mailboxes(&maildir, &output, &mut index, &ImportOptions::default())?;
//! println!("imported {}", report.written_count());
//! ```

mod discover;
mod index;
mod naming;
mod parse;

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::DateTime;
use tracing::{debug, info, warn};

use crate::message::MessageError;

pub use discover::{SourceMessage, discover};
pub use index::{FingerprintIndex, MemoryIndex};
pub use naming::{SENDER_SLUG_LEN, SUBJECT_SLUG_LEN, generate_filename, slugify, unique_filename};
pub use parse::{ImportedMessage, fingerprint, parse_rfc822};

/// Error type for import operations.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The source root is not a directory.
    #[error("Mail directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// Filesystem access failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The raw message could not be parsed.
    #[error("Unparseable message: {0}")]
    Parse(#[from] mdmailbox_mime::Error),

    /// The record could not be serialized.
    #[error("Serialization failed: {0}")]
    Serialize(#[from] MessageError),
}

/// Result type for import operations.
pub type ImportResult<T> = std::result::Result<T, ImportError>;

/// Import settings.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Account label for every message, instead of the directory name.
    pub account: Option<String>,
    /// Maximum number of files to write. Skipped messages do not count.
    pub limit: Option<usize>,
}

/// Terminal state of one source message.
#[derive(Debug)]
pub enum ImportOutcome {
    /// A new file was created.
    Written {
        /// Source file.
        source: PathBuf,
        /// Created file.
        path: PathBuf,
    },
    /// Already imported for this account.
    Skipped {
        /// Source file.
        source: PathBuf,
        /// Fingerprint found in the index.
        fingerprint: String,
    },
    /// The message could not be imported.
    Failed {
        /// Source file.
        source: PathBuf,
        /// What went wrong.
        reason: String,
    },
}

/// Per-message results of an import run.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Outcomes in processing order.
    pub outcomes: Vec<ImportOutcome>,
}

impl ImportReport {
    /// Paths of written files, in order.
    #[must_use]
    pub fn written(&self) -> Vec<&Path> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                ImportOutcome::Written { path, .. } => Some(path.as_path()),
                _ => None,
            })
            .collect()
    }

    /// Number of written files.
    #[must_use]
    pub fn written_count(&self) -> usize {
        self.count(|o| matches!(o, ImportOutcome::Written { .. }))
    }

    /// Number of duplicates skipped.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.count(|o| matches!(o, ImportOutcome::Skipped { .. }))
    }

    /// Number of failed messages.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, ImportOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&ImportOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

/// Imports every message under `root` into `output_dir`.
///
/// Messages are processed in path order. The run stops once `limit` files
/// have been written.
///
/// # Errors
///
/// Returns an error only if the source cannot be traversed or the output
/// directory cannot be created or listed; per-message problems are
/// reported as [`ImportOutcome::Failed`].
pub fn import_mailboxes(
    root: &Path,
    output_dir: &Path,
    index: &mut dyn FingerprintIndex,
    options: &ImportOptions,
) -> ImportResult<ImportReport> {
    let sources = discover(root, options.account.as_deref())?;
    std::fs::create_dir_all(output_dir).map_err(|source| ImportError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;
    let mut existing = existing_names(output_dir)?;

    info!(
        root = %root.display(),
        output = %output_dir.display(),
        candidates = sources.len(),
        "starting import"
    );

    let mut report = ImportReport::default();
    let mut written = 0;
    for source in &sources {
        if options.limit.is_some_and(|limit| written >= limit) {
            debug!(limit = written, "import limit reached");
            break;
        }

        let outcome = import_one(source, output_dir, index, &mut existing);
        match &outcome {
            ImportOutcome::Written { path, .. } => {
                written += 1;
                debug!(source = %source.path.display(), path = %path.display(), "written");
            }
            ImportOutcome::Skipped { .. } => {
                debug!(source = %source.path.display(), "already imported");
            }
            ImportOutcome::Failed { reason, .. } => {
                warn!(source = %source.path.display(), reason, "import failed");
            }
        }
        report.outcomes.push(outcome);
    }

    info!(
        written = report.written_count(),
        skipped = report.skipped_count(),
        failed = report.failed_count(),
        "import finished"
    );
    Ok(report)
}

fn import_one(
    source: &SourceMessage,
    output_dir: &Path,
    index: &mut dyn FingerprintIndex,
    existing: &mut HashSet<String>,
) -> ImportOutcome {
    let failed = |reason: String| ImportOutcome::Failed {
        source: source.path.clone(),
        reason,
    };

    let raw = match std::fs::read(&source.path) {
        Ok(raw) => raw,
        Err(e) => return failed(e.to_string()),
    };
    let imported = match parse_rfc822(&raw) {
        Ok(imported) => imported,
        Err(e) => return failed(e.to_string()),
    };

    if index.contains(&source.account, &imported.original_hash) {
        return ImportOutcome::Skipped {
            source: source.path.clone(),
            fingerprint: imported.original_hash,
        };
    }

    let mut record = imported.record;
    record.account = Some(source.account.clone());
    record.source_path = Some(source.path.clone());

    let text = match record.to_text() {
        Ok(text) => text,
        Err(e) => return failed(e.to_string()),
    };

    let date = record
        .date
        .as_deref()
        .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
        .map(|d| d.date_naive());
    let base = generate_filename(date, &record.from, &record.subject);

    match write_new(output_dir, &base, &imported.original_hash, &text, existing) {
        Ok(path) => {
            index.insert(&source.account, &imported.original_hash);
            ImportOutcome::Written {
                source: source.path.clone(),
                path,
            }
        }
        Err(e) => failed(e.to_string()),
    }
}

/// Creates a file that did not exist before, picking a fresh name whenever
/// the chosen one turns out to be taken.
fn write_new(
    dir: &Path,
    base: &str,
    fingerprint: &str,
    text: &str,
    existing: &mut HashSet<String>,
) -> std::io::Result<PathBuf> {
    loop {
        let name = unique_filename(base, fingerprint, existing);
        let path = dir.join(&name);
        existing.insert(name);
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => return fill_new_file(file, text, path),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e),
        }
    }
}

/// Writes `text` into a file created by [`write_new`]. A failed write
/// removes the partial file so the next run does not see a stray copy.
fn fill_new_file(mut file: impl Write, text: &str, path: PathBuf) -> std::io::Result<PathBuf> {
    match file.write_all(text.as_bytes()).and_then(|()| file.flush()) {
        Ok(()) => Ok(path),
        Err(e) => {
            drop(file);
            if let Err(cleanup) = std::fs::remove_file(&path) {
                warn!(path = %path.display(), error = %cleanup, "cannot remove partial file");
            }
            Err(e)
        }
    }
}

fn existing_names(dir: &Path) -> ImportResult<HashSet<String>> {
    let entries = std::fs::read_dir(dir).map_err(|source| ImportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    Ok(entries
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect())
}
