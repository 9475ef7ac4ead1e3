//! Subcommand implementations.

use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Local;
use mdmailbox_core::{
    CredentialStore, ImportOptions, MemoryIndex, MessageRecord, Paths, SendOptions,
    create_draft, import_mailboxes, read_message, save_sent, send_with_lookup, write_message,
};
use tracing::debug;

use crate::args::{CredentialsArgs, ImportArgs, NewArgs, SendArgs};

/// Characters of body shown by a dry run.
const PREVIEW_LEN: usize = 500;

/// Number of written files listed after an import.
const RECENT_IMPORTS: usize = 5;

pub fn send(args: &SendArgs, paths: &Paths) -> Result<()> {
    let mut record = read_message(&args.file)
        .with_context(|| format!("Cannot read message file {}", args.file.display()))?;
    record.validate_for_send()?;

    if args.dry_run {
        print_preview(&record);
        return Ok(());
    }

    let authinfo = args.authinfo.as_deref().unwrap_or(paths.authinfo.as_path());
    let store = load_credentials(authinfo)?;
    let options = SendOptions {
        port: args.port,
        tls: args.tls_mode(),
        ..SendOptions::default()
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Cannot start async runtime")?;
    let outcome = runtime.block_on(send_with_lookup(&record, store.entries(), &options));

    if !outcome.success {
        if !outcome.log.is_empty() {
            eprintln!("Send log:");
            for line in &outcome.log {
                eprintln!("  {line}");
            }
        }
        bail!(outcome.message);
    }

    let sent_path = save_sent(&mut record, &outcome, &paths.sent(), Local::now().fixed_offset())
        .context("Message was sent but could not be moved to the sent folder")?;

    println!("Sent: {}", record.subject);
    if let Some(id) = &outcome.message_id {
        println!("Message-ID: {id}");
    }
    println!("Moved to: {}", sent_path.display());
    Ok(())
}

fn print_preview(record: &MessageRecord) {
    println!("=== Dry run - would send: ===");
    println!("From: {}", record.from);
    println!("To: {}", record.to.join(", "));
    if !record.cc.is_empty() {
        println!("Cc: {}", record.cc.join(", "));
    }
    if !record.bcc.is_empty() {
        println!("Bcc: {}", record.bcc.join(", "));
    }
    println!("Subject: {}", record.subject);
    println!("---");
    println!("{}", preview(&record.body));
}

/// First [`PREVIEW_LEN`] characters of `body`, with `...` if cut.
fn preview(body: &str) -> String {
    match body.char_indices().nth(PREVIEW_LEN) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

pub fn import(args: &ImportArgs, paths: &Paths) -> Result<()> {
    let maildir = args.maildir.as_deref().unwrap_or(paths.maildir.as_path());
    let output = args.output.clone().unwrap_or_else(|| paths.inbox());

    println!("Importing from: {}", maildir.display());
    println!("Output to: {}", output.display());
    if let Some(limit) = args.limit {
        println!("Limit: {limit}");
    }

    let mut index = MemoryIndex::scan_directory(&output)
        .with_context(|| format!("Cannot index {}", output.display()))?;
    let options = ImportOptions {
        account: args.account.clone(),
        limit: args.limit,
    };
    let report = import_mailboxes(maildir, &output, &mut index, &options)
        .with_context(|| format!("Cannot import from {}", maildir.display()))?;

    println!("Imported {} emails", report.written_count());
    if report.skipped_count() > 0 {
        println!("Skipped {} already imported", report.skipped_count());
    }
    if report.failed_count() > 0 {
        println!("Failed {} (see log)", report.failed_count());
    }

    let written = report.written();
    if !written.is_empty() {
        println!("Recent imports:");
        for path in &written[written.len().saturating_sub(RECENT_IMPORTS)..] {
            if let Some(name) = path.file_name() {
                println!("  {}", name.to_string_lossy());
            }
        }
    }
    Ok(())
}

pub fn new(args: &NewArgs, paths: &Paths) -> Result<()> {
    let mut record = MessageRecord::draft(
        args.from.clone().unwrap_or_default(),
        args.to.clone().unwrap_or_default(),
        args.subject.clone().unwrap_or_default(),
    );
    record.cc = args
        .cc
        .iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    record.body = "\n".to_string();

    let path = if let Some(output) = &args.output {
        write_message(&record, output)
            .with_context(|| format!("Cannot write {}", output.display()))?;
        output.clone()
    } else {
        let drafts = paths.drafts();
        create_draft(&record, &drafts)
            .with_context(|| format!("Cannot create draft in {}", drafts.display()))?
    };

    println!("Created: {}", path.display());
    Ok(())
}

pub fn credentials(args: &CredentialsArgs, paths: &Paths) -> Result<()> {
    let authinfo = args.authinfo.as_deref().unwrap_or(paths.authinfo.as_path());
    let store = load_credentials(authinfo)?;

    if let Some(email) = &args.email {
        let Some(resolved) = store.resolve(email) else {
            bail!("No credentials found for {email}");
        };
        let entry = resolved.entry;
        println!("Found credentials for {email}:");
        println!("  Host: {}", entry.machine);
        println!("  Login: {}", entry.login);
        println!("  Password: {}", entry.masked_password());
        if let Some(port) = entry.port {
            println!("  Port: {port}");
        }
        println!("  Matched by: {}", resolved.tier);
        return Ok(());
    }

    if store.is_empty() {
        println!("No credentials found in {}", authinfo.display());
        return Ok(());
    }
    println!("Credentials from {}:", authinfo.display());
    for entry in store.entries() {
        let port = entry.port.map(|p| format!(":{p}")).unwrap_or_default();
        println!(
            "  {} @ {}{port} ({})",
            entry.login,
            entry.machine,
            entry.masked_password()
        );
    }
    Ok(())
}

fn load_credentials(path: &Path) -> Result<CredentialStore> {
    let store = CredentialStore::load(path)
        .with_context(|| format!("Cannot load credentials from {}", path.display()))?;
    debug!(entries = store.entries().len(), "credentials loaded");
    Ok(store)
}
