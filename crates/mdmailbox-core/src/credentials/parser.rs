//! Line-oriented credential file parser.
//!
//! ```text
//! # comment
//! machine smtp.example.com login me@example.com password secret port 587
//! ```
//!
//! A recognized key consumes the following token as its value; any other
//! token is skipped on its own. Lines missing `machine`, `login` or
//! `password` are dropped.

use tracing::debug;

use super::model::CredentialEntry;

/// Parses credential file contents into entries, preserving file order.
#[must_use]
pub fn parse(source: &str) -> Vec<CredentialEntry> {
    source
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| parse_line(idx + 1, line))
        .collect()
}

fn parse_line(line_no: usize, line: &str) -> Option<CredentialEntry> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    let mut machine = None;
    let mut login = None;
    let mut password = None;
    let mut port = None;

    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    let mut i = 0;
    while i + 1 < tokens.len() {
        let value = tokens[i + 1];
        match tokens[i] {
            "machine" => machine = Some(value),
            "login" => login = Some(value),
            "password" => password = Some(value),
            "port" => match value.parse::<u16>() {
                Ok(p) => port = Some(p),
                Err(_) => debug!(line = line_no, value, "ignoring invalid port"),
            },
            _ => {
                i += 1;
                continue;
            }
        }
        i += 2;
    }

    match (machine, login, password) {
        (Some(machine), Some(login), Some(password)) => Some(CredentialEntry {
            machine: machine.to_string(),
            login: login.to_string(),
            password: password.to_string(),
            port,
        }),
        _ => {
            debug!(line = line_no, "skipping incomplete credential line");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entries_in_order() {
        let entries = parse(
            "machine smtp.a.com login a@a.com password one\n\
             machine smtp.b.com login *@b.com password two port 465\n",
        );
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], CredentialEntry::new("smtp.a.com", "a@a.com", "one"));
        assert_eq!(
            entries[1],
            CredentialEntry::new("smtp.b.com", "*@b.com", "two").with_port(465)
        );
    }

    #[test]
    fn test_skips_comments_blank_and_incomplete_lines() {
        let entries = parse(
            "# personal\n\
             \n\
             \t  # indented comment\n\
             machine smtp.a.com login a@a.com\n\
             login b@b.com password x\n\
             machine smtp.c.com login c@c.com password three\n",
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].login, "c@c.com");
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let entries =
            parse("machine smtp.a.com protocol smtp login a@a.com password p future yes");
        assert_eq!(entries, vec![CredentialEntry::new("smtp.a.com", "a@a.com", "p")]);
    }

    #[test]
    fn test_single_unknown_token_does_not_shift_pairs() {
        let entries = parse("default machine smtp.a.com login a@a.com password p");
        assert_eq!(entries, vec![CredentialEntry::new("smtp.a.com", "a@a.com", "p")]);
    }

    #[test]
    fn test_bad_port_keeps_entry() {
        let entries = parse("machine smtp.a.com login a@a.com password p port submission");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].port, None);
    }

    #[test]
    fn test_keys_in_any_order() {
        let entries = parse("password p port 2525 login a@a.com machine smtp.a.com");
        assert_eq!(
            entries,
            vec![CredentialEntry::new("smtp.a.com", "a@a.com", "p").with_port(2525)]
        );
    }

    #[test]
    fn test_masked_password_hides_secret() {
        let entry = CredentialEntry::new("h", "a@a.com", "s3cret");
        assert_eq!(entry.masked_password(), "******");
        assert!(!format!("{entry:?}").contains("s3cret"));
    }
}
