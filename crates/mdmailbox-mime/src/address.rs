//! Address list parsing.
//!
//! Only the bare `addr-spec` of each mailbox is kept; display names and
//! comments are dropped.

/// Extracts the bare address from one mailbox.
///
/// `Alice <alice@example.com>` and `alice@example.com (Alice)` both yield
/// `alice@example.com`. Returns `None` unless the candidate has an `@` with
/// text on both sides.
#[must_use]
pub fn addr_spec(mailbox: &str) -> Option<String> {
    let mailbox = mailbox.trim();

    let candidate = match (mailbox.rfind('<'), mailbox.rfind('>')) {
        (Some(open), Some(close)) if open < close => mailbox[open + 1..close].trim().to_string(),
        _ => strip_comments(mailbox).trim().trim_matches('"').trim().to_string(),
    };

    if candidate.contains(|c: char| c.is_whitespace() || c == ';') {
        return None;
    }
    match candidate.rsplit_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
        _ => return None,
    }
    Some(candidate)
}

/// Parses a comma separated list of mailboxes into bare addresses.
///
/// Commas inside quoted display names, angle brackets and comments do not
/// split. Group syntax (`undisclosed-recipients:;`) yields nothing.
#[must_use]
pub fn parse_address_list(value: &str) -> Vec<String> {
    split_mailboxes(value)
        .into_iter()
        .filter(|item| !item.trim_end().ends_with(":;"))
        .filter_map(addr_spec)
        .collect()
}

fn split_mailboxes(value: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut in_quotes = false;
    let mut angle_depth = 0_u32;
    let mut paren_depth = 0_u32;
    let mut start = 0;

    for (i, ch) in value.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '<' if !in_quotes => angle_depth += 1,
            '>' if !in_quotes => angle_depth = angle_depth.saturating_sub(1),
            '(' if !in_quotes => paren_depth += 1,
            ')' if !in_quotes => paren_depth = paren_depth.saturating_sub(1),
            ',' if !in_quotes && angle_depth == 0 && paren_depth == 0 => {
                items.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&value[start..]);
    items.retain(|item| !item.trim().is_empty());
    items
}

fn strip_comments(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut depth = 0_u32;
    for ch in value.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_addr_spec_forms() {
        assert_eq!(addr_spec("alice@example.com").as_deref(), Some("alice@example.com"));
        assert_eq!(
            addr_spec("Alice Example <alice@example.com>").as_deref(),
            Some("alice@example.com")
        );
        assert_eq!(
            addr_spec("alice@example.com (Alice)").as_deref(),
            Some("alice@example.com")
        );
        assert_eq!(addr_spec("   "), None);
    }

    #[test]
    fn test_addr_spec_requires_at_sign() {
        assert_eq!(addr_spec("Doe"), None);
        assert_eq!(addr_spec("<undisclosed>"), None);
        assert_eq!(addr_spec("@example.com"), None);
        assert_eq!(addr_spec("alice@"), None);
        assert_eq!(parse_address_list("Doe, John <john@example.com>"), vec!["john@example.com"]);
    }

    #[test]
    fn test_parse_address_list_quoted_comma() {
        let list = parse_address_list("\"Doe, John\" <john@example.com>, bob@example.com");
        assert_eq!(list, vec!["john@example.com", "bob@example.com"]);
    }

    #[test]
    fn test_parse_address_list_group_and_empty() {
        assert!(parse_address_list("undisclosed-recipients:;").is_empty());
        assert!(parse_address_list("").is_empty());
        assert_eq!(parse_address_list("a@x.org,, b@y.org"), vec!["a@x.org", "b@y.org"]);
    }
}
