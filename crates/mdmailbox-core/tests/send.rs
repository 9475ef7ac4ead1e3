//! Sender tests against a scripted in-process SMTP server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::net::SocketAddr;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use mdmailbox_core::{
    CredentialEntry, MessageRecord, SendOptions, TlsMode, send, send_with_lookup,
};

/// Replies for the scripted server.
#[derive(Clone, Copy)]
struct Script {
    ehlo: &'static str,
    auth: &'static str,
    mail_from: &'static str,
}

const PLAIN: Script = Script {
    ehlo: "250 mock.example.com\r\n",
    auth: "503 5.5.1 AUTH not available\r\n",
    mail_from: "250 2.1.0 Ok\r\n",
};

/// Runs one SMTP session and returns every line the client sent.
async fn server(script: Script) -> (SocketAddr, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (read, mut write) = socket.into_split();
        let mut reader = BufReader::new(read);
        let mut received = Vec::new();
        let mut in_data = false;

        write.write_all(b"220 mock.example.com ESMTP\r\n").await.unwrap();
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).await.unwrap() == 0 {
                break;
            }
            let line = line.trim_end_matches(['\r', '\n']).to_string();
            received.push(line.clone());

            let reply = if in_data {
                if line != "." {
                    continue;
                }
                in_data = false;
                "250 2.0.0 Ok: queued as 42\r\n"
            } else if line.starts_with("EHLO") {
                script.ehlo
            } else if line.starts_with("AUTH") {
                script.auth
            } else if line.starts_with("MAIL FROM") {
                script.mail_from
            } else if line == "DATA" {
                in_data = true;
                "354 go ahead\r\n"
            } else if line == "QUIT" {
                write.write_all(b"221 bye\r\n").await.unwrap();
                break;
            } else {
                "250 Ok\r\n"
            };
            write.write_all(reply.as_bytes()).await.unwrap();
        }
        received
    });

    (addr, handle)
}

fn record() -> MessageRecord {
    MessageRecord {
        from: "Alice <alice@example.com>".into(),
        to: vec!["bob@example.com".into()],
        cc: vec!["carol@example.com".into()],
        bcc: vec!["dave@example.com".into()],
        subject: "Quarterly numbers".into(),
        body: "See attached.\n".into(),
        ..MessageRecord::default()
    }
}

fn options(addr: SocketAddr) -> SendOptions {
    SendOptions {
        port: Some(addr.port()),
        tls: TlsMode::None,
        ..SendOptions::default()
    }
}

fn credential() -> CredentialEntry {
    CredentialEntry::new("127.0.0.1", "alice@example.com", "s3cret")
}

#[tokio::test]
async fn test_send_without_auth() {
    let (addr, handle) = server(PLAIN).await;

    let outcome = send(&record(), &credential(), &options(addr)).await;
    assert!(outcome.success, "{}: {:?}", outcome.message, outcome.log);
    assert_eq!(outcome.message, "Email sent successfully");
    assert_eq!(
        outcome.smtp_response.as_deref(),
        Some("250 2.0.0 Ok: queued as 42")
    );
    assert!(outcome.sent_at.is_some());
    assert_eq!(outcome.smtp_port, addr.port());

    let received = handle.await.unwrap();
    assert!(!received.iter().any(|l| l.starts_with("AUTH")));
    assert!(received.contains(&"MAIL FROM:<alice@example.com>".to_string()));
    for rcpt in ["bob", "carol", "dave"] {
        assert!(received.contains(&format!("RCPT TO:<{rcpt}@example.com>")));
    }
    assert!(received.iter().any(|l| l == "Subject: Quarterly numbers"));
    assert!(!received.iter().any(|l| l.to_ascii_lowercase().starts_with("bcc:")));
    assert!(received.iter().any(|l| l == "See attached."));

    let message_id = outcome.message_id.unwrap();
    assert!(message_id.ends_with("@example.com>"));
    assert!(
        received
            .iter()
            .any(|l| l.eq_ignore_ascii_case(&format!("Message-ID: {message_id}")))
    );
}

#[tokio::test]
async fn test_send_authenticates_when_advertised() {
    let (addr, handle) = server(Script {
        ehlo: "250-mock.example.com\r\n250 AUTH PLAIN LOGIN\r\n",
        auth: "235 2.7.0 Accepted\r\n",
        ..PLAIN
    })
    .await;

    let outcome = send(&record(), &credential(), &options(addr)).await;
    assert!(outcome.success, "{}", outcome.message);
    assert!(outcome.log.contains(&">>> AUTH PLAIN ********".to_string()));
    assert!(!outcome.log.iter().any(|l| l.contains("s3cret")));

    let received = handle.await.unwrap();
    assert!(received[1].starts_with("AUTH PLAIN "));
}

#[tokio::test]
async fn test_auth_failure_is_reported() {
    let (addr, _handle) = server(Script {
        ehlo: "250-mock.example.com\r\n250 AUTH PLAIN\r\n",
        auth: "535 5.7.8 Bad credentials\r\n",
        ..PLAIN
    })
    .await;

    let outcome = send(&record(), &credential(), &options(addr)).await;
    assert!(!outcome.success);
    assert!(
        outcome.message.starts_with("Authentication failed:"),
        "{}",
        outcome.message
    );
    assert!(outcome.message.contains("535"));
    assert!(outcome.message_id.is_none());
    assert!(outcome.log.iter().any(|l| l.starts_with("<<< 535")));
}

#[tokio::test]
async fn test_rejected_sender_is_smtp_error() {
    let (addr, _handle) = server(Script {
        mail_from: "553 5.7.1 Sender not allowed\r\n",
        ..PLAIN
    })
    .await;

    let outcome = send(&record(), &credential(), &options(addr)).await;
    assert!(!outcome.success);
    assert!(outcome.message.starts_with("SMTP error:"), "{}", outcome.message);
    assert!(outcome.message.contains("553"));
}

#[tokio::test]
async fn test_lookup_uses_credential_port() {
    let (addr, _handle) = server(PLAIN).await;
    let entries = vec![
        CredentialEntry::new("127.0.0.1", "*@example.com", "p").with_port(addr.port()),
    ];
    let options = SendOptions {
        tls: TlsMode::None,
        ..SendOptions::default()
    };

    let outcome = send_with_lookup(&record(), &entries, &options).await;
    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(outcome.smtp_port, addr.port());
    assert_eq!(outcome.smtp_host, "127.0.0.1");
}
