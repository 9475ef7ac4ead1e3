//! Message records and the text file format.
//!
//! ```text
//! ---
//! from: me@example.com
//! to: you@example.com
//! subject: Hello
//! ---
//!
//! Body text.
//! ```

mod model;
mod text;
mod wire;

pub use model::MessageRecord;
pub use wire::generate_message_id;

/// Error type for message file handling.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// The text does not start with a `---` line.
    #[error("Missing header block: file must start with '---'")]
    MissingHeaderBlock,

    /// The header block has no closing `---` line.
    #[error("Unterminated header block: no closing '---'")]
    UnterminatedHeaderBlock,

    /// The header block is not valid YAML.
    #[error("Invalid header block: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The header block is valid YAML but not a mapping.
    #[error("Header block must be a mapping of fields")]
    NotAMapping,

    /// A known field has the wrong shape.
    #[error("Invalid '{field}' field: {reason}")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// What was wrong.
        reason: String,
    },

    /// A field required for sending is empty.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Outgoing message could not be built.
    #[error("MIME error: {0}")]
    Mime(#[from] mdmailbox_mime::Error),
}

/// Result type for message operations.
pub type MessageResult<T> = std::result::Result<T, MessageError>;
