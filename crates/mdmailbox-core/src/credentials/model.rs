//! Credential entry model.

/// One `machine`/`login`/`password` line of a credential file.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialEntry {
    /// SMTP host.
    pub machine: String,
    /// Literal address, or a wildcard of the form `*@domain`.
    pub login: String,
    /// Secret used for AUTH.
    pub password: String,
    /// Port override for this host.
    pub port: Option<u16>,
}

impl CredentialEntry {
    /// Creates an entry without a port.
    #[must_use]
    pub fn new(
        machine: impl Into<String>,
        login: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            machine: machine.into(),
            login: login.into(),
            password: password.into(),
            port: None,
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Returns the domain of a wildcard login (`*@domain`).
    #[must_use]
    pub fn wildcard_domain(&self) -> Option<&str> {
        self.login.strip_prefix("*@")
    }

    /// Returns true if the login is a `*@domain` wildcard.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.wildcard_domain().is_some()
    }

    /// Password rendered as `*` characters for display.
    #[must_use]
    pub fn masked_password(&self) -> String {
        "*".repeat(self.password.chars().count())
    }
}

impl std::fmt::Debug for CredentialEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialEntry")
            .field("machine", &self.machine)
            .field("login", &self.login)
            .field("password", &self.masked_password())
            .field("port", &self.port)
            .finish()
    }
}
