//! Integration tests for the SMTP client.
//!
//! Each test runs a small SMTP server on a local `TcpListener` and drives the
//! client against it over plain TCP.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::net::SocketAddr;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use mdmailbox_smtp::connection::connect;
use mdmailbox_smtp::{Address, Client, Error, SmtpConnection, Transcript};

/// Mock server behaviour.
#[derive(Clone, Copy)]
struct Script {
    /// Full EHLO reply, including line terminators.
    ehlo: &'static str,
    /// Reply to `AUTH PLAIN <response>`.
    auth_plain: &'static str,
}

const NO_AUTH: Script = Script {
    ehlo: "250 mock.example.com\r\n",
    auth_plain: "503 5.5.1 AUTH not available\r\n",
};

/// Starts a mock server and returns every line it received once the client
/// disconnects or sends QUIT.
///
/// `AUTH LOGIN` always succeeds when the password is `pass`; recipients
/// starting with `nobody` are rejected with 550.
async fn mock_server(script: Script) -> (SocketAddr, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (read, mut write) = socket.into_split();
        let mut reader = BufReader::new(read);
        let mut received = Vec::new();
        let mut in_data = false;

        write
            .write_all(b"220 mock.example.com ESMTP ready\r\n")
            .await
            .unwrap();

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
                "250 2.0.0 Ok: queued as ABC123\r\n"
            } else if line.starts_with("EHLO") {
                script.ehlo
            } else if line.starts_with("AUTH PLAIN") {
                script.auth_plain
            } else if line == "AUTH LOGIN" || line == "dXNlcg==" {
                "334 VXNlcm5hbWU6\r\n"
            } else if line == "cGFzcw==" {
                "235 2.7.0 Accepted\r\n"
            } else if line.starts_with("RCPT TO:<nobody") {
                "550 5.1.1 No such user\r\n"
            } else if line == "DATA" {
                in_data = true;
                "354 End data with <CR><LF>.<CR><LF>\r\n"
            } else if line == "QUIT" {
                write.write_all(b"221 2.0.0 Bye\r\n").await.unwrap();
                break;
            } else {
                "250 OK\r\n"
            };
            write.write_all(reply.as_bytes()).await.unwrap();
        }
        received
    });

    (addr, handle)
}

async fn greeted(addr: SocketAddr, transcript: &Transcript) -> Client<mdmailbox_smtp::Connected> {
    let stream = connect("127.0.0.1", addr.port()).await.unwrap();
    Client::from_stream(stream, transcript.clone())
        .await
        .unwrap()
        .ehlo("localhost")
        .await
        .unwrap()
}

#[tokio::test]
async fn test_full_session_with_auth_plain() {
    let (addr, server) = mock_server(Script {
        ehlo: "250-mock.example.com\r\n250-SIZE 1000000\r\n250 AUTH PLAIN LOGIN\r\n",
        auth_plain: "235 2.7.0 Authentication successful\r\n",
    })
    .await;
    let transcript = Transcript::new();

    let client = greeted(addr, &transcript).await;
    assert_eq!(client.server_info().hostname, "mock.example.com");
    assert!(client.server_info().supports_auth());
    assert_eq!(client.server_info().max_message_size(), Some(1_000_000));

    let client = client
        .authenticate("alice@example.com", "hunter2")
        .await
        .unwrap()
        .mail_from(Address::new("alice@example.com").unwrap())
        .await
        .unwrap()
        .rcpt_to(Address::new("bob@example.com").unwrap())
        .await
        .unwrap()
        .rcpt_to(Address::new("carol@example.com").unwrap())
        .await
        .unwrap()
        .data()
        .await
        .unwrap()
        .send_message(b"Subject: Hi\r\n\r\n.leading dot\r\nbody\r\n")
        .await
        .unwrap();
    client.quit().await.unwrap();

    let received = server.await.unwrap();
    assert_eq!(
        received,
        vec![
            "EHLO localhost",
            "AUTH PLAIN AGFsaWNlQGV4YW1wbGUuY29tAGh1bnRlcjI=",
            "MAIL FROM:<alice@example.com>",
            "RCPT TO:<bob@example.com>",
            "RCPT TO:<carol@example.com>",
            "DATA",
            "Subject: Hi",
            "",
            "..leading dot",
            "body",
            ".",
            "QUIT",
        ]
    );

    let lines = transcript.lines();
    assert!(lines.contains(&">>> AUTH PLAIN ********".to_string()));
    assert!(!lines.iter().any(|l| l.contains("AGFsaWNl")));
    assert!(lines.contains(&"<<< 235 2.7.0 Authentication successful".to_string()));
    assert_eq!(lines.last().map(String::as_str), Some("<<< 221 2.0.0 Bye"));
}

#[tokio::test]
async fn test_delivery_without_auth() {
    let (addr, server) = mock_server(NO_AUTH).await;
    let transcript = Transcript::new();

    let client = greeted(addr, &transcript).await;
    assert!(!client.server_info().supports_auth());

    let client = client
        .mail_from(Address::new("a@example.com").unwrap())
        .await
        .unwrap()
        .rcpt_to(Address::new("b@example.com").unwrap())
        .await
        .unwrap()
        .data()
        .await
        .unwrap()
        .send_message(b"Subject: test\n\nhello\n")
        .await
        .unwrap();

    let last = client.last_reply().unwrap().to_string();
    assert_eq!(last, "250 2.0.0 Ok: queued as ABC123");
    client.quit().await.unwrap();

    let received = server.await.unwrap();
    assert!(received.contains(&"hello".to_string()));
    assert_eq!(received.last().map(String::as_str), Some("QUIT"));
}

#[tokio::test]
async fn test_auth_login_fallback() {
    let (addr, server) = mock_server(Script {
        ehlo: "250-mock.example.com\r\n250 AUTH LOGIN\r\n",
        auth_plain: "504 5.5.4 Unrecognized authentication type\r\n",
    })
    .await;
    let transcript = Transcript::new();

    let client = greeted(addr, &transcript).await;
    client
        .authenticate("user", "pass")
        .await
        .unwrap()
        .quit()
        .await
        .unwrap();

    let received = server.await.unwrap();
    assert_eq!(received[1], "AUTH LOGIN");
    assert_eq!(received[2], "dXNlcg==");
    assert_eq!(received[3], "cGFzcw==");

    let redacted = transcript
        .lines()
        .iter()
        .filter(|l| l.as_str() == ">>> ********")
        .count();
    assert_eq!(redacted, 2);
}

#[tokio::test]
async fn test_auth_rejected() {
    let (addr, _server) = mock_server(Script {
        ehlo: "250-mock.example.com\r\n250 AUTH PLAIN\r\n",
        auth_plain: "535 5.7.8 Authentication credentials invalid\r\n",
    })
    .await;

    let client = greeted(addr, &Transcript::new()).await;
    let err = client.authenticate("user", "wrong").await.unwrap_err();
    assert!(err.is_auth_failure());
    assert_eq!(
        err.to_string(),
        "535 5.7.8 Authentication credentials invalid"
    );
}

#[tokio::test]
async fn test_recipient_rejected() {
    let (addr, _server) = mock_server(NO_AUTH).await;

    let client = greeted(addr, &Transcript::new())
        .await
        .mail_from(Address::new("a@example.com").unwrap())
        .await
        .unwrap();

    let err = client
        .rcpt_to(Address::new("nobody@example.com").unwrap())
        .await
        .unwrap_err();
    assert!(err.is_permanent());
    assert!(matches!(err, Error::SmtpError { code: 550, .. }));
}

#[tokio::test]
async fn test_starttls_not_advertised() {
    let (addr, _server) = mock_server(NO_AUTH).await;

    let client = greeted(addr, &Transcript::new()).await;
    let err = client.starttls("localhost").await.unwrap_err();
    assert!(matches!(err, Error::NotSupported(_)));
}

#[tokio::test]
async fn test_closed_connection_is_reported() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        socket.write_all(b"220 bye soon\r\n").await.unwrap();
    });

    let stream = connect("127.0.0.1", addr.port()).await.unwrap();
    let client = Client::from_stream(stream, Transcript::new()).await.unwrap();
    let err = client.ehlo("localhost").await.unwrap_err();
    assert!(matches!(err, Error::ConnectionClosed | Error::Io(_)));
}
