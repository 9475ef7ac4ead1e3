//! # mdmailbox-smtp
//!
//! Async SMTP submission client (RFC 5321) used by mdmailbox to send drafts.
//!
//! ## Features
//!
//! - **Type-state connection management**: invalid command orderings do not compile
//! - **TLS**: STARTTLS upgrade and implicit TLS (port 465)
//! - **Authentication**: PLAIN, with LOGIN as fallback
//! - **Transcripts**: every command and reply is recorded in a shared
//!   [`Transcript`], with credentials redacted, so callers can show the
//!   session even when it fails half-way
//!
//! ## Quick Start
//!
//! ```ignore
//! use mdmailbox_smtp::{Address, Client, Transcript};
//! use mdmailbox_smtp::connection::connect;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> mdmailbox_smtp::Result<()> {
//!     let transcript = Transcript::new();
//!     let stream = connect("smtp.example.com", 587).await?;
//!     let client = Client::from_stream(stream, transcript.clone()).await?;
//!
//!     let client = client.ehlo("localhost").await?;
//!     let client = client.starttls("smtp.example.com").await?;
//!     let client = client.authenticate("user@example.com", "password").await?;
//!
//!     let client = client.mail_from(Address::new("user@example.com")?).await?;
//!     let client = client.rcpt_to(Address::new("friend@example.com")?).await?;
//!     let client = client.data().await?;
//!     let client = client.send_message(b"Subject: Hi\r\n\r\nHello\r\n").await?;
//!     client.quit().await?;
//!
//!     for line in transcript.lines() {
//!         println!("{line}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Connection States
//!
//! ```text
//! Connected ── authenticate() ──→ Authenticated
//!     │                                │
//!     └──────── mail_from() ───────────┴──→ MailTransaction ──→ RecipientAdded ──→ Data
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod reply;
pub mod transcript;

pub use command::{Address, AuthMechanism, Command};
pub use connection::{
    Authenticated, Client, Connected, Data, Extension, MailTransaction, RecipientAdded,
    ServerInfo, SmtpConnection,
};
pub use error::{Error, Result};
pub use reply::{Reply, ReplyCode};
pub use transcript::Transcript;
