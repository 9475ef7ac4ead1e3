//! Default file locations.
//!
//! Paths are resolved once by the binary and handed to the library as
//! parameters; nothing else in this crate reads the environment.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable overriding the credential file.
pub const AUTHINFO_ENV: &str = "AUTHINFO_FILE";

/// Environment variable overriding the mailbox root.
pub const MAILBOX_DIR_ENV: &str = "MDMAILBOX_DIR";

/// Resolved file locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// Credential file.
    pub authinfo: PathBuf,
    /// Root holding `inbox/`, `drafts/` and `sent/`.
    pub mailbox_root: PathBuf,
    /// Default import source.
    pub maildir: PathBuf,
}

impl Paths {
    /// Resolves paths from the process environment and home directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the home directory cannot be determined.
    pub fn from_env() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("cannot determine home directory".to_string()))?;
        Ok(Self::resolve(&home, |key| std::env::var(key).ok()))
    }

    /// Resolves paths against `home`, reading overrides through `var`.
    #[must_use]
    pub fn resolve(home: &Path, var: impl Fn(&str) -> Option<String>) -> Self {
        let authinfo = var(AUTHINFO_ENV)
            .filter(|v| !v.is_empty())
            .map_or_else(|| home.join(".authinfo"), |v| expand_tilde(&v, home));
        let mailbox_root = var(MAILBOX_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map_or_else(|| home.join("Mdmailbox"), |v| expand_tilde(&v, home));

        Self {
            authinfo,
            mailbox_root,
            maildir: home.join("mail"),
        }
    }

    /// Default import destination.
    #[must_use]
    pub fn inbox(&self) -> PathBuf {
        self.mailbox_root.join("inbox")
    }

    /// Where new drafts are written.
    #[must_use]
    pub fn drafts(&self) -> PathBuf {
        self.mailbox_root.join("drafts")
    }

    /// Where sent messages are moved.
    #[must_use]
    pub fn sent(&self) -> PathBuf {
        self.mailbox_root.join("sent")
    }
}

/// Expands a leading `~` or `~/` against `home`.
#[must_use]
pub fn expand_tilde(path: &str, home: &Path) -> PathBuf {
    if path == "~" {
        home.to_path_buf()
    } else if let Some(rest) = path.strip_prefix("~/") {
        home.join(rest)
    } else {
        PathBuf::from(path)
    }
}
