//! Error types for the core library.

use std::path::PathBuf;

use thiserror::Error;

use crate::credentials::CredentialError;
use crate::import::ImportError;
use crate::message::MessageError;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required file does not exist.
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Message file could not be read or written.
    #[error("Message error: {0}")]
    Message(#[from] MessageError),

    /// Credential file could not be loaded.
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// Import run could not start.
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
