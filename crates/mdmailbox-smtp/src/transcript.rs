//! Shared session transcript.

use std::sync::{Arc, Mutex};

/// Append-only log of an SMTP session.
///
/// Clones share the same buffer, so the caller keeps a handle while the
/// client (which is consumed by every state transition) writes to it.
/// Client lines are prefixed with `>>> `, server lines with `<<< `.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    lines: Arc<Mutex<Vec<String>>>,
}

impl Transcript {
    /// Creates an empty transcript.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a line sent by the client.
    pub fn client(&self, line: &str) {
        self.push(format!(">>> {line}"));
    }

    /// Records a line received from the server.
    pub fn server(&self, line: &str) {
        self.push(format!("<<< {line}"));
    }

    /// Records a free-form note (connection events, TLS upgrades).
    pub fn note(&self, line: impl Into<String>) {
        self.push(line.into());
    }

    fn push(&self, line: String) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }

    /// Returns a snapshot of all recorded lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_lines() {
        let transcript = Transcript::new();
        let handle = transcript.clone();

        handle.note("connected");
        handle.client("EHLO localhost");
        handle.server("250 OK");
        transcript.client("QUIT");

        assert_eq!(
            transcript.lines(),
            vec!["connected", ">>> EHLO localhost", "<<< 250 OK", ">>> QUIT"]
        );
    }
}
