//! `mdmailbox` - email as plain text files
//!
//! Sends message files over SMTP, imports mailbox trees and creates drafts.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod args;
mod commands;

use anyhow::Result;
use clap::Parser;
use mdmailbox_core::Paths;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use args::{Args, Command};

fn main() -> Result<()> {
    let args = Args::parse();

    // stdout carries command output only
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mdmailbox=info,mdmailbox_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let paths = Paths::from_env()?;
    debug!(?paths, "resolved paths");

    match &args.command {
        Command::Send(send) => commands::send(send, &paths),
        Command::Import(import) => commands::import(import, &paths),
        Command::New(new) => commands::new(new, &paths),
        Command::Credentials(credentials) => commands::credentials(credentials, &paths),
    }
}
