//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use mdmailbox_core::TlsMode;

/// Email as plain text files with a YAML header block.
#[derive(Debug, Parser)]
#[command(name = "mdmailbox", about, version)]
pub struct Args {
    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send a message file, then move it to the sent folder
    Send(SendArgs),
    /// Import messages from a `<account>/<mailbox>/` tree
    Import(ImportArgs),
    /// Create a new draft
    New(NewArgs),
    /// Show configured credentials with masked passwords
    Credentials(CredentialsArgs),
}

/// Arguments of `send`.
#[derive(Debug, ClapArgs)]
pub struct SendArgs {
    /// Message file to send
    pub file: PathBuf,

    /// Credential file (default: $AUTHINFO_FILE or ~/.authinfo)
    #[arg(long)]
    pub authinfo: Option<PathBuf>,

    /// Validate and show what would be sent without sending
    #[arg(long)]
    pub dry_run: bool,

    /// SMTP port (default: from the credential, else 587, or 465 with --tls)
    #[arg(long)]
    pub port: Option<u16>,

    /// Connect without STARTTLS
    #[arg(long, conflicts_with = "tls")]
    pub no_tls: bool,

    /// Use implicit TLS from the first byte
    #[arg(long)]
    pub tls: bool,
}

impl SendArgs {
    /// Transport security selected by the flags.
    #[must_use]
    pub const fn tls_mode(&self) -> TlsMode {
        if self.tls {
            TlsMode::Implicit
        } else if self.no_tls {
            TlsMode::None
        } else {
            TlsMode::StartTls
        }
    }
}

/// Arguments of `import`.
#[derive(Debug, ClapArgs)]
pub struct ImportArgs {
    /// Source mailbox root (default: ~/mail)
    #[arg(long)]
    pub maildir: Option<PathBuf>,

    /// Output directory (default: <mailbox root>/inbox)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum number of messages to write
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Account label, instead of the directory name
    #[arg(long)]
    pub account: Option<String>,
}

/// Arguments of `new`.
#[derive(Debug, ClapArgs)]
pub struct NewArgs {
    /// Recipient address
    #[arg(short, long)]
    pub to: Option<String>,

    /// Sender address
    #[arg(short, long)]
    pub from: Option<String>,

    /// Subject
    #[arg(short, long)]
    pub subject: Option<String>,

    /// Cc recipients, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub cc: Vec<String>,

    /// Output file (default: <mailbox root>/drafts/<subject>.md)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments of `credentials`.
#[derive(Debug, ClapArgs)]
pub struct CredentialsArgs {
    /// Credential file (default: $AUTHINFO_FILE or ~/.authinfo)
    #[arg(long)]
    pub authinfo: Option<PathBuf>,

    /// Resolve the credential for this address
    #[arg(long)]
    pub email: Option<String>,
}
