//! Duplicate detection for imports.

use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

use super::{ImportError, ImportResult};
use crate::message::MessageRecord;

/// Set of `(account, fingerprint)` pairs already imported.
pub trait FingerprintIndex {
    /// Returns true if the fingerprint was already imported for the account.
    fn contains(&self, account: &str, fingerprint: &str) -> bool;

    /// Records an imported fingerprint.
    fn insert(&mut self, account: &str, fingerprint: &str);
}

/// In-memory index.
#[derive(Debug, Clone, Default)]
pub struct MemoryIndex {
    seen: HashSet<(String, String)>,
}

impl MemoryIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an index from the `account` and `original-hash` headers of the
    /// `.md` files in `dir`.
    ///
    /// A missing directory yields an empty index. Files that fail to parse
    /// or lack either header are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be listed.
    pub fn scan_directory(dir: &Path) -> ImportResult<Self> {
        let mut index = Self::new();
        if !dir.is_dir() {
            return Ok(index);
        }

        let entries = std::fs::read_dir(dir).map_err(|source| ImportError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "md") {
                continue;
            }
            let Ok(text) = std::fs::read_to_string(&path) else {
                continue;
            };
            match MessageRecord::from_text(&text) {
                Ok(MessageRecord {
                    account: Some(account),
                    original_hash: Some(hash),
                    ..
                }) => index.insert(&account, &hash),
                Ok(_) => {}
                Err(e) => debug!(path = %path.display(), error = %e, "not indexed"),
            }
        }

        debug!(dir = %dir.display(), entries = index.len(), "seeded fingerprint index");
        Ok(index)
    }

    /// Number of recorded fingerprints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl FingerprintIndex for MemoryIndex {
    fn contains(&self, account: &str, fingerprint: &str) -> bool {
        self.seen
            .contains(&(account.to_string(), fingerprint.to_string()))
    }

    fn insert(&mut self, account: &str, fingerprint: &str) {
        self.seen
            .insert((account.to_string(), fingerprint.to_string()));
    }
}
