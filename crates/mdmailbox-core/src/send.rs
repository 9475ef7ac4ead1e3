//! Sending message records over SMTP.
//!
//! [`send`] never fails: connection, TLS, authentication and protocol
//! problems are reported through [`SendOutcome`] with `success == false`
//! and a message meant for the user.

use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local};
use mdmailbox_mime::addr_spec;
use mdmailbox_smtp::connection::{connect, connect_tls};
use mdmailbox_smtp::{Address, Client, SmtpConnection, Transcript};
use tracing::{debug, info, warn};

use crate::credentials::{CredentialEntry, lookup};
use crate::message::MessageRecord;

/// Default session timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport security.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsMode {
    /// Plain connection upgraded with STARTTLS (submission, port 587).
    #[default]
    StartTls,
    /// TLS from the first byte (port 465).
    Implicit,
    /// No encryption.
    None,
}

impl TlsMode {
    /// Port used when neither the caller nor the credential names one.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Implicit => 465,
            Self::StartTls | Self::None => 587,
        }
    }
}

/// Connection settings for [`send`].
#[derive(Debug, Clone)]
pub struct SendOptions {
    /// Port override. Takes precedence over the credential's port.
    pub port: Option<u16>,
    /// Transport security.
    pub tls: TlsMode,
    /// Upper bound for the whole session.
    pub timeout: Duration,
    /// Name announced in EHLO.
    pub helo_name: String,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            port: None,
            tls: TlsMode::default(),
            timeout: DEFAULT_TIMEOUT,
            helo_name: "localhost".to_string(),
        }
    }
}

/// Result of a send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOutcome {
    /// Whether the server accepted the message.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    /// Message-ID used for the message.
    pub message_id: Option<String>,
    /// Session transcript, credentials redacted.
    pub log: Vec<String>,
    /// When the server accepted the message.
    pub sent_at: Option<DateTime<FixedOffset>>,
    /// Server host.
    pub smtp_host: String,
    /// Server port.
    pub smtp_port: u16,
    /// Final server reply to the message data.
    pub smtp_response: Option<String>,
}

impl SendOutcome {
    fn failure(message: String, host: &str, port: u16, log: Vec<String>) -> Self {
        Self {
            success: false,
            message,
            message_id: None,
            log,
            sent_at: None,
            smtp_host: host.to_string(),
            smtp_port: port,
            smtp_response: None,
        }
    }
}

/// Sends `record` with an already resolved credential.
pub async fn send(
    record: &MessageRecord,
    credential: &CredentialEntry,
    options: &SendOptions,
) -> SendOutcome {
    let host = credential.machine.as_str();
    let port = options
        .port
        .or(credential.port)
        .unwrap_or_else(|| options.tls.default_port());

    let now = Local::now().fixed_offset();
    let wire = match record.to_wire_message(now) {
        Ok(wire) => wire,
        Err(e) => {
            return SendOutcome::failure(format!("Failed to send: {e}"), host, port, Vec::new());
        }
    };
    let message_id = wire.message_id().map(ToString::to_string);

    let transcript = Transcript::new();
    transcript.note(format!("Connecting to {host}:{port} ({:?})", options.tls));

    let data = wire.to_rfc5322();
    let session = deliver(
        &data,
        record,
        credential,
        host,
        port,
        options,
        &transcript,
    );
    let result = tokio::time::timeout(options.timeout, session).await;

    match result {
        Ok(Ok(response)) => {
            info!(host, port, message_id = ?message_id, "message accepted");
            SendOutcome {
                success: true,
                message: "Email sent successfully".to_string(),
                message_id,
                log: transcript.lines(),
                sent_at: Some(Local::now().fixed_offset()),
                smtp_host: host.to_string(),
                smtp_port: port,
                smtp_response: response,
            }
        }
        Ok(Err(e)) => {
            warn!(host, port, error = %e, "send failed");
            let message = if e.is_auth_failure() {
                format!("Authentication failed: {e}")
            } else if matches!(e, mdmailbox_smtp::Error::Io(_) | mdmailbox_smtp::Error::Tls(_)) {
                format!("Failed to send: {e}")
            } else {
                format!("SMTP error: {e}")
            };
            transcript.note(format!("Error: {e}"));
            SendOutcome::failure(message, host, port, transcript.lines())
        }
        Err(_) => {
            warn!(host, port, timeout = ?options.timeout, "send timed out");
            let message = format!(
                "Failed to send: timed out after {}s",
                options.timeout.as_secs()
            );
            transcript.note(message.clone());
            SendOutcome::failure(message, host, port, transcript.lines())
        }
    }
}

/// Resolves the credential for `record.from` and sends.
///
/// A miss is reported without touching the network.
pub async fn send_with_lookup(
    record: &MessageRecord,
    entries: &[CredentialEntry],
    options: &SendOptions,
) -> SendOutcome {
    let sender = envelope_address(&record.from);
    match lookup(&sender, entries) {
        Some(credential) => send(record, credential, options).await,
        None => {
            debug!(from = %record.from, "no credential");
            SendOutcome::failure(
                format!("No credentials found for {}", record.from),
                "",
                options.port.unwrap_or_else(|| options.tls.default_port()),
                Vec::new(),
            )
        }
    }
}

/// Runs the SMTP session and returns the server's reply to the message data.
async fn deliver(
    data: &str,
    record: &MessageRecord,
    credential: &CredentialEntry,
    host: &str,
    port: u16,
    options: &SendOptions,
    transcript: &Transcript,
) -> mdmailbox_smtp::Result<Option<String>> {
    let from = Address::new(envelope_address(&record.from))?;
    let recipients = record
        .recipients()
        .into_iter()
        .map(|r| Address::new(envelope_address(r)))
        .collect::<mdmailbox_smtp::Result<Vec<_>>>()?;
    let Some((first, rest)) = recipients.split_first() else {
        return Err(mdmailbox_smtp::Error::InvalidAddress(
            "no recipients".to_string(),
        ));
    };

    let stream = match options.tls {
        TlsMode::Implicit => connect_tls(host, port).await?,
        TlsMode::StartTls | TlsMode::None => connect(host, port).await?,
    };
    let client = Client::from_stream(stream, transcript.clone())
        .await?
        .ehlo(&options.helo_name)
        .await?;
    let client = if options.tls == TlsMode::StartTls {
        client.starttls(host).await?
    } else {
        client
    };

    let client = if client.server_info().supports_auth() {
        client
            .authenticate(&credential.login, &credential.password)
            .await?
            .mail_from(from)
            .await?
    } else {
        debug!(host, "server does not advertise AUTH");
        client.mail_from(from).await?
    };

    let mut client = client.rcpt_to(first.clone()).await?;
    for recipient in rest {
        client = client.rcpt_to(recipient.clone()).await?;
    }

    let client = client.data().await?.send_message(data.as_bytes()).await?;
    let response = client.last_reply().map(ToString::to_string);

    if let Err(e) = client.quit().await {
        debug!(error = %e, "QUIT failed after delivery");
    }
    Ok(response)
}

/// Bare address for the envelope, accepting `Name <addr>` forms.
fn envelope_address(value: &str) -> String {
    addr_spec(value).unwrap_or_else(|| value.trim().to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn record() -> MessageRecord {
        MessageRecord {
            from: "nobody@example.com".into(),
            to: vec!["you@example.com".into()],
            subject: "Hi".into(),
            body: "Hello\n".into(),
            ..MessageRecord::default()
        }
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let entries = vec![CredentialEntry::new("smtp.other.com", "*@other.com", "p")];
        let outcome = send_with_lookup(&record(), &entries, &SendOptions::default()).await;
        assert!(!outcome.success);
        assert_eq!(outcome.message, "No credentials found for nobody@example.com");
        assert!(outcome.log.is_empty());
    }

    #[test]
    fn test_port_selection() {
        assert_eq!(TlsMode::StartTls.default_port(), 587);
        assert_eq!(TlsMode::Implicit.default_port(), 465);
        assert_eq!(TlsMode::None.default_port(), 587);
    }

    #[test]
    fn test_envelope_address() {
        assert_eq!(envelope_address("Me <me@example.com>"), "me@example.com");
        assert_eq!(envelope_address(" me@example.com "), "me@example.com");
    }

    #[tokio::test]
    async fn test_connection_refused_is_reported() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let credential = CredentialEntry::new("127.0.0.1", "nobody@example.com", "p");
        let options = SendOptions {
            port: Some(port),
            tls: TlsMode::None,
            ..SendOptions::default()
        };
        let outcome = send(&record(), &credential, &options).await;
        assert!(!outcome.success);
        assert!(outcome.message.starts_with("Failed to send:"), "{}", outcome.message);
        assert_eq!(outcome.smtp_port, port);
        assert_eq!(outcome.smtp_host, "127.0.0.1");
    }
}
