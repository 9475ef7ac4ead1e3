//! Source mailbox traversal.
//!
//! Layout: `<root>/<account>/<mailbox>/**/<file>`. Every regular file below
//! a mailbox directory is a candidate, so Maildir `cur`/`new`/`tmp` folders
//! nest naturally. Entries whose name starts with `.` are ignored.

use std::path::{Path, PathBuf};

use super::{ImportError, ImportResult};

/// A raw message file found during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMessage {
    /// File path.
    pub path: PathBuf,
    /// Account label.
    pub account: String,
    /// Mailbox directory name.
    pub mailbox: String,
}

/// Lists candidate message files under `root`, sorted by path.
///
/// `account` overrides the label inferred from the top-level directory.
///
/// # Errors
///
/// Returns [`ImportError::SourceNotFound`] if `root` is not a directory, or
/// an I/O error if a directory cannot be listed.
pub fn discover(root: &Path, account: Option<&str>) -> ImportResult<Vec<SourceMessage>> {
    if !root.is_dir() {
        return Err(ImportError::SourceNotFound(root.to_path_buf()));
    }

    let mut found = Vec::new();
    for account_dir in subdirectories(root)? {
        let label = account.map_or_else(|| file_name(&account_dir), ToString::to_string);
        for mailbox_dir in subdirectories(&account_dir)? {
            let mailbox = file_name(&mailbox_dir);
            let mut files = Vec::new();
            collect_files(&mailbox_dir, &mut files)?;
            found.extend(files.into_iter().map(|path| SourceMessage {
                path,
                account: label.clone(),
                mailbox: mailbox.clone(),
            }));
        }
    }

    found.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(found)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().starts_with('.'))
}

fn visible_entries(dir: &Path) -> ImportResult<Vec<(PathBuf, std::fs::FileType)>> {
    let io_err = |source| ImportError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        if is_hidden(&path) {
            continue;
        }
        entries.push((path, entry.file_type().map_err(io_err)?));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

fn subdirectories(dir: &Path) -> ImportResult<Vec<PathBuf>> {
    Ok(visible_entries(dir)?
        .into_iter()
        .filter(|(_, ty)| ty.is_dir())
        .map(|(path, _)| path)
        .collect())
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> ImportResult<()> {
    for (path, ty) in visible_entries(dir)? {
        if ty.is_dir() {
            collect_files(&path, out)?;
        } else if ty.is_file() {
            out.push(path);
        }
    }
    Ok(())
}
