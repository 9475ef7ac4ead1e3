//! # mdmailbox-core
//!
//! Email as plain text files with a YAML header block.
//!
//! This crate provides:
//! - **Credential resolution** - `.authinfo` parsing and tiered lookup by
//!   sender address, with provider-aware address normalization
//! - **Message files** - reading and writing the header-block text format
//! - **Mail import** - converting a `<account>/<mailbox>/<file>` tree of
//!   RFC 822 messages into deduplicated, deterministically named files
//! - **Sending** - delivering a message file over SMTP with a session log
//! - **Drafts and sent mail** - draft creation and sent-folder relocation
//!   with an appended audit trail

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod address;
pub mod config;
pub mod credentials;
mod error;
pub mod import;
pub mod mailbox;
pub mod message;
pub mod send;

pub use address::{GmailRule, Normalizer, ProviderRule, normalize};
pub use config::Paths;
pub use credentials::{CredentialEntry, CredentialError, CredentialStore, lookup};
pub use error::{Error, Result};
pub use import::{
    FingerprintIndex, ImportError, ImportOptions, ImportOutcome, ImportReport, MemoryIndex,
    generate_filename, import_mailboxes,
};
pub use mailbox::{create_draft, read_message, save_sent, write_message};
pub use message::{MessageError, MessageRecord};
pub use send::{SendOptions, SendOutcome, TlsMode, send, send_with_lookup};
