//! Type-state SMTP client.

use super::{ServerInfo, SmtpStream};
use crate::command::{Address, AuthMechanism, Command};
use crate::error::{Error, Result};
use crate::reply::{Reply, ReplyCode, is_last_reply_line, parse_reply};
use crate::transcript::Transcript;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::marker::PhantomData;
use tracing::debug;

/// Type-state marker for connected state.
#[derive(Debug)]
pub struct Connected;

/// Type-state marker for authenticated state.
#[derive(Debug)]
pub struct Authenticated;

/// Type-state marker for mail transaction started.
#[derive(Debug)]
pub struct MailTransaction;

/// Type-state marker for recipient added.
#[derive(Debug)]
pub struct RecipientAdded;

/// Type-state marker for data mode.
#[derive(Debug)]
pub struct Data;

/// SMTP client with type-state pattern.
#[derive(Debug)]
pub struct Client<State> {
    stream: SmtpStream,
    server_info: ServerInfo,
    transcript: Transcript,
    helo_name: String,
    last_reply: Option<Reply>,
    _state: PhantomData<State>,
}

/// Connection trait for all states.
pub trait SmtpConnection {
    /// Returns the server information.
    fn server_info(&self) -> &ServerInfo;

    /// Returns the most recent reply received from the server.
    fn last_reply(&self) -> Option<&Reply>;
}

impl<S> SmtpConnection for Client<S> {
    fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    fn last_reply(&self) -> Option<&Reply> {
        self.last_reply.as_ref()
    }
}

impl Client<Connected> {
    /// Creates a client from a stream and reads the server greeting.
    ///
    /// Every command and reply of the session is appended to `transcript`.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the greeting fails or if the server returns an error.
    pub async fn from_stream(mut stream: SmtpStream, transcript: Transcript) -> Result<Self> {
        let greeting = read_reply(&mut stream, &transcript).await?;
        if greeting.code != ReplyCode::SERVICE_READY {
            return Err(Error::smtp_error(
                greeting.code.as_u16(),
                greeting.message_text(),
            ));
        }

        let hostname = greeting
            .message
            .first()
            .and_then(|msg| msg.split_whitespace().next())
            .unwrap_or("unknown")
            .to_string();

        Ok(Self {
            stream,
            server_info: ServerInfo {
                hostname,
                ..ServerInfo::default()
            },
            transcript,
            helo_name: "localhost".to_string(),
            last_reply: Some(greeting),
            _state: PhantomData,
        })
    }

    /// Sends EHLO and discovers server capabilities.
    ///
    /// # Errors
    ///
    /// Returns an error if the EHLO command fails.
    pub async fn ehlo(mut self, client_hostname: &str) -> Result<Self> {
        self.helo_name = client_hostname.to_string();
        self.send_ehlo().await?;
        Ok(self)
    }

    /// Upgrades the connection to TLS using STARTTLS, then repeats EHLO.
    ///
    /// # Errors
    ///
    /// Returns an error if STARTTLS is not supported or if the upgrade fails.
    pub async fn starttls(mut self, hostname: &str) -> Result<Self> {
        if !self.server_info.supports_starttls() {
            return Err(Error::NotSupported("STARTTLS".into()));
        }

        let reply = self.send_command(&Command::StartTls).await?;
        expect_success(&reply)?;

        self.stream = self.stream.upgrade_to_tls(hostname).await?;
        self.transcript.note(format!("TLS established with {hostname}"));

        self.send_ehlo().await?;
        Ok(self)
    }

    /// Authenticates with PLAIN, or LOGIN when the server only offers LOGIN.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthFailed`] if the server rejects the credentials.
    pub async fn authenticate(
        self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        let offered = self.server_info.auth_mechanisms();
        if !offered.contains(&AuthMechanism::Plain) && offered.contains(&AuthMechanism::Login) {
            self.auth_login(username, password).await
        } else {
            self.auth_plain(username, password).await
        }
    }

    /// Authenticates using PLAIN mechanism.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthFailed`] if authentication fails.
    pub async fn auth_plain(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        debug!(username, "AUTH PLAIN");
        let credentials = format!("\0{username}\0{password}");
        let cmd = Command::Auth {
            mechanism: AuthMechanism::Plain,
            initial_response: Some(STANDARD.encode(credentials.as_bytes())),
        };

        let reply = self.send_command(&cmd).await?;
        expect_auth_success(&reply)?;
        Ok(self.transition())
    }

    /// Authenticates using LOGIN mechanism.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthFailed`] if authentication fails.
    pub async fn auth_login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        debug!(username, "AUTH LOGIN");
        let cmd = Command::Auth {
            mechanism: AuthMechanism::Login,
            initial_response: None,
        };
        let mut reply = self.send_command(&cmd).await?;

        for secret in [username, password] {
            if reply.code != ReplyCode::AUTH_CONTINUE {
                return Err(auth_failed(&reply));
            }
            let answer = Command::AuthResponse(STANDARD.encode(secret.as_bytes()));
            reply = self.send_command(&answer).await?;
        }

        expect_auth_success(&reply)?;
        Ok(self.transition())
    }

    /// Starts a mail transaction without authentication (if server allows).
    ///
    /// # Errors
    ///
    /// Returns an error if the MAIL FROM command fails.
    pub async fn mail_from(mut self, from: Address) -> Result<Client<MailTransaction>> {
        let reply = self.send_command(&Command::MailFrom { from }).await?;
        expect_success(&reply)?;
        Ok(self.transition())
    }

    async fn send_ehlo(&mut self) -> Result<()> {
        let cmd = Command::Ehlo {
            hostname: self.helo_name.clone(),
        };
        let reply = self.send_command(&cmd).await?;
        expect_success(&reply)?;
        self.server_info.set_extensions(&reply.message);
        Ok(())
    }
}

impl Client<Authenticated> {
    /// Starts a mail transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the MAIL FROM command fails.
    pub async fn mail_from(mut self, from: Address) -> Result<Client<MailTransaction>> {
        let reply = self.send_command(&Command::MailFrom { from }).await?;
        expect_success(&reply)?;
        Ok(self.transition())
    }
}

impl Client<MailTransaction> {
    /// Adds a recipient to the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the RCPT TO command fails.
    pub async fn rcpt_to(mut self, to: Address) -> Result<Client<RecipientAdded>> {
        let reply = self.send_command(&Command::RcptTo { to }).await?;
        expect_success(&reply)?;
        Ok(self.transition())
    }
}

impl Client<RecipientAdded> {
    /// Adds another recipient to the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the RCPT TO command fails.
    pub async fn rcpt_to(mut self, to: Address) -> Result<Self> {
        let reply = self.send_command(&Command::RcptTo { to }).await?;
        expect_success(&reply)?;
        Ok(self)
    }

    /// Begins sending message data.
    ///
    /// # Errors
    ///
    /// Returns an error if the DATA command fails.
    pub async fn data(mut self) -> Result<Client<Data>> {
        let reply = self.send_command(&Command::Data).await?;
        if reply.code != ReplyCode::START_DATA {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }
        Ok(self.transition())
    }
}

impl Client<Data> {
    /// Sends the message content and completes the transaction.
    ///
    /// Line endings are normalized to CRLF, lines starting with `.` are
    /// dot-stuffed and the terminating `.` line is added automatically.
    ///
    /// # Errors
    ///
    /// Returns an error if sending the message fails or server rejects it.
    pub async fn send_message(mut self, message: &[u8]) -> Result<Client<Connected>> {
        let payload = dot_stuff(message);
        self.stream.write_all(&payload).await?;
        self.stream.flush().await?;
        self.transcript
            .client(&format!("[message data, {} bytes]", message.len()));
        self.transcript.client(".");

        let reply = read_reply(&mut self.stream, &self.transcript).await?;
        self.last_reply = Some(reply.clone());
        expect_success(&reply)?;
        Ok(self.transition())
    }
}

// Common implementation for all states
impl<S> Client<S> {
    /// Sends QUIT and closes the connection (available in any state).
    ///
    /// # Errors
    ///
    /// Returns an error if the QUIT command fails.
    pub async fn quit(mut self) -> Result<()> {
        let reply = self.send_command(&Command::Quit).await?;
        if !reply.is_success() && reply.code != ReplyCode::CLOSING {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }
        Ok(())
    }

    fn transition<T>(self) -> Client<T> {
        Client {
            stream: self.stream,
            server_info: self.server_info,
            transcript: self.transcript,
            helo_name: self.helo_name,
            last_reply: self.last_reply,
            _state: PhantomData,
        }
    }

    async fn send_command(&mut self, cmd: &Command) -> Result<Reply> {
        self.transcript.client(&cmd.redacted());
        self.stream.write_all(&cmd.serialize()).await?;
        self.stream.flush().await?;
        let reply = read_reply(&mut self.stream, &self.transcript).await?;
        self.last_reply = Some(reply.clone());
        Ok(reply)
    }
}

async fn read_reply(stream: &mut SmtpStream, transcript: &Transcript) -> Result<Reply> {
    let mut lines = Vec::new();
    loop {
        let line = stream.read_line().await?;
        if line.is_empty() {
            continue;
        }
        transcript.server(&line);

        let is_last = is_last_reply_line(&line);
        lines.push(line);
        if is_last {
            break;
        }
    }
    parse_reply(&lines)
}

fn expect_success(reply: &Reply) -> Result<()> {
    if reply.is_success() {
        Ok(())
    } else {
        Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()))
    }
}

fn expect_auth_success(reply: &Reply) -> Result<()> {
    if reply.code == ReplyCode::AUTH_SUCCESS || reply.is_success() {
        Ok(())
    } else {
        Err(auth_failed(reply))
    }
}

fn auth_failed(reply: &Reply) -> Error {
    Error::AuthFailed {
        code: reply.code.as_u16(),
        message: reply.message_text(),
    }
}

/// Normalizes line endings to CRLF, dot-stuffs and appends the terminator.
fn dot_stuff(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len() + 16);
    let trimmed = message.strip_suffix(b"\n").unwrap_or(message);
    let trimmed = trimmed.strip_suffix(b"\r").unwrap_or(trimmed);

    if !trimmed.is_empty() {
        for line in trimmed.split(|&b| b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.first() == Some(&b'.') {
                out.push(b'.');
            }
            out.extend_from_slice(line);
            out.extend_from_slice(b"\r\n");
        }
    }
    out.extend_from_slice(b".\r\n");
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_stuff_normalizes_line_endings() {
        assert_eq!(dot_stuff(b"a\nb\r\nc\n"), b"a\r\nb\r\nc\r\n.\r\n");
    }

    #[test]
    fn test_dot_stuff_escapes_leading_dots() {
        assert_eq!(dot_stuff(b".hidden\n.\n"), b"..hidden\r\n..\r\n.\r\n");
    }

    #[test]
    fn test_dot_stuff_empty_message() {
        assert_eq!(dot_stuff(b""), b".\r\n");
    }

    #[test]
    fn test_auth_failure_classification() {
        let reply = Reply::new(ReplyCode::new(535), vec!["5.7.8 bad credentials".into()]);
        assert!(expect_auth_success(&reply).unwrap_err().is_auth_failure());
        assert!(expect_success(&reply).is_err());
    }
}
