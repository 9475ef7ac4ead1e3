//! Credential file loading and lookup.
//!
//! The credential file holds one `machine`/`login`/`password` entry per
//! line, optionally with a `port`. Lookup maps a sender address to an entry
//! through [`Lookup`]'s ordered tiers.

mod lookup;
mod model;
mod parser;

use std::path::{Path, PathBuf};

use tracing::debug;

pub use lookup::{Exact, Lookup, MatchTier, Normalized, Resolved, WildcardDomain, lookup};
pub use model::CredentialEntry;
pub use parser::parse;

/// Error type for credential file operations.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// The credential file does not exist.
    #[error("Credential file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The credential file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}

/// Result type for credential operations.
pub type CredentialResult<T> = std::result::Result<T, CredentialError>;

/// Parsed credential file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialStore {
    entries: Vec<CredentialEntry>,
}

impl CredentialStore {
    /// Builds a store from already parsed entries.
    #[must_use]
    pub const fn new(entries: Vec<CredentialEntry>) -> Self {
        Self { entries }
    }

    /// Parses credential file contents.
    #[must_use]
    pub fn from_source(source: &str) -> Self {
        Self::new(parse(source))
    }

    /// Reads and parses a credential file.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::NotFound`] if the file does not exist and
    /// [`CredentialError::Read`] for any other I/O failure.
    pub fn load(path: &Path) -> CredentialResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                CredentialError::NotFound(path.to_path_buf())
            } else {
                CredentialError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let store = Self::from_source(&source);
        debug!(path = %path.display(), entries = store.entries.len(), "loaded credentials");
        Ok(store)
    }

    /// Entries in file order.
    #[must_use]
    pub fn entries(&self) -> &[CredentialEntry] {
        &self.entries
    }

    /// Returns true if the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finds the credential for `address` with the default tiers.
    #[must_use]
    pub fn lookup(&self, address: &str) -> Option<&CredentialEntry> {
        lookup(address, &self.entries)
    }

    /// Resolves `address` and reports which tier matched.
    #[must_use]
    pub fn resolve(&self, address: &str) -> Option<Resolved<'_>> {
        Lookup::default().resolve(address, &self.entries)
    }
}
