//! # mdmailbox-mime
//!
//! RFC 822 message parsing and plain-text message generation.
//!
//! ## Features
//!
//! - **Message parsing**: headers with unfolding, nested multipart bodies
//! - **Text extraction**: first `text/plain` part, transfer-decoded and
//!   converted from its declared charset
//! - **Header decoding**: RFC 2047 encoded words (B and Q)
//! - **Address lists**: `Name <user@host>, other@host` reduced to bare addresses
//! - **Message generation**: single-part `text/plain` messages for SMTP submission
//!
//! ## Quick Start
//!
//! ### Parsing a raw message
//!
//! ```ignore
//! use mdmailbox_mime::Message;
//!
//! let raw = b"From: Alice <alice@example.com>\r\n\
//!             Subject: =?utf-8?B?SMOpbGxv?=\r\n\
//!             \r\n\
//!             Hi Bob\r\n";
//!
//! let message = Message::parse(raw)?;
//! assert_eq!(message.subject().as_deref(), Some("Héllo"));
//! assert_eq!(message.from_addresses(), vec!["alice@example.com"]);
//! println!("{}", message.text_body());
//! ```
//!
//! ### Building an outgoing message
//!
//! ```ignore
//! use mdmailbox_mime::MessageBuilder;
//!
//! let message = MessageBuilder::new()
//!     .from("sender@example.com")
//!     .to("recipient@example.com")
//!     .subject("Test Message")
//!     .message_id("<1@example.com>")
//!     .text_body("Hello, World!\n")
//!     .build()?;
//!
//! println!("{}", message.to_rfc5322());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod builder;
mod content_type;
mod error;
mod header;
mod message;

pub mod encoding;

pub use address::{addr_spec, parse_address_list};
pub use builder::{MessageBuilder, OutgoingMessage};
pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Message, TransferEncoding};
