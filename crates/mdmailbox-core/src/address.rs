//! Address normalization for credential matching.
//!
//! A normalized address is a comparison key only. It is never used for
//! transmission or display.
//!
//! The domain is always lowercased. Provider-specific folding of the local
//! part is delegated to a [`ProviderRule`] registered for the exact domain;
//! domains without a rule keep their local part verbatim.

use std::collections::HashMap;
use std::sync::Arc;

/// Provider-specific canonicalization of the local part of an address.
pub trait ProviderRule: Send + Sync {
    /// Domains this rule applies to, lowercase.
    fn domains(&self) -> &[&'static str];

    /// Folds a local part into its canonical form.
    fn fold_local(&self, local: &str) -> String;
}

/// Gmail canonicalization: dots are ignored and `+tag` suffixes dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct GmailRule;

impl ProviderRule for GmailRule {
    fn domains(&self) -> &[&'static str] {
        &["gmail.com", "googlemail.com"]
    }

    fn fold_local(&self, local: &str) -> String {
        let untagged = local.split_once('+').map_or(local, |(base, _)| base);
        untagged.replace('.', "")
    }
}

/// Registry of provider rules keyed by domain.
#[derive(Clone)]
pub struct Normalizer {
    rules: HashMap<&'static str, Arc<dyn ProviderRule>>,
}

impl std::fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut domains: Vec<_> = self.rules.keys().collect();
        domains.sort();
        f.debug_struct("Normalizer").field("domains", &domains).finish()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::empty().with_rule(GmailRule)
    }
}

impl Normalizer {
    /// Creates a normalizer with no provider rules.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Registers a rule for every domain it declares.
    #[must_use]
    pub fn with_rule(mut self, rule: impl ProviderRule + 'static) -> Self {
        let rule: Arc<dyn ProviderRule> = Arc::new(rule);
        for domain in rule.domains() {
            self.rules.insert(*domain, Arc::clone(&rule));
        }
        self
    }

    /// Returns the canonical comparison key for an address.
    ///
    /// Addresses without `@` are returned unchanged.
    #[must_use]
    pub fn normalize(&self, address: &str) -> String {
        let Some((local, domain)) = address.rsplit_once('@') else {
            return address.to_string();
        };
        let domain = domain.to_lowercase();
        let local = self
            .rules
            .get(domain.as_str())
            .map_or_else(|| local.to_string(), |rule| rule.fold_local(local));
        format!("{local}@{domain}")
    }
}

/// Normalizes an address with the default provider rules.
#[must_use]
pub fn normalize(address: &str) -> String {
    Normalizer::default().normalize(address)
}

/// Returns the part of an address after the last `@`.
#[must_use]
pub fn domain_of(address: &str) -> Option<&str> {
    address.rsplit_once('@').map(|(_, domain)| domain)
}

/// Returns the part of an address before the last `@`, or the whole input.
#[must_use]
pub fn local_part(address: &str) -> &str {
    address.rsplit_once('@').map_or(address, |(local, _)| local)
}
