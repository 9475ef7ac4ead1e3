//! Tiered credential lookup.
//!
//! Tiers are tried in order and the first tier with any matching entry
//! wins; inside a tier the earliest entry in file order wins. The default
//! order is [`Exact`], [`Normalized`], [`WildcardDomain`].

use tracing::debug;

use super::model::CredentialEntry;
use crate::address::{Normalizer, domain_of};

/// One matching strategy of the lookup policy.
pub trait MatchTier: Send + Sync {
    /// Short name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Returns true if `entry` serves `address` under this tier.
    fn matches(&self, address: &str, entry: &CredentialEntry) -> bool;
}

/// Literal `login == address`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exact;

impl MatchTier for Exact {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn matches(&self, address: &str, entry: &CredentialEntry) -> bool {
        entry.login == address
    }
}

/// Equality after provider normalization. Wildcard logins never match.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    normalizer: Normalizer,
}

impl Normalized {
    /// Creates the tier with a custom normalizer.
    #[must_use]
    pub const fn new(normalizer: Normalizer) -> Self {
        Self { normalizer }
    }
}

impl MatchTier for Normalized {
    fn name(&self) -> &'static str {
        "normalized"
    }

    fn matches(&self, address: &str, entry: &CredentialEntry) -> bool {
        !entry.is_wildcard()
            && self.normalizer.normalize(&entry.login) == self.normalizer.normalize(address)
    }
}

/// `*@domain` logins matching the address domain, case-insensitively.
#[derive(Debug, Clone, Copy, Default)]
pub struct WildcardDomain;

impl MatchTier for WildcardDomain {
    fn name(&self) -> &'static str {
        "wildcard"
    }

    fn matches(&self, address: &str, entry: &CredentialEntry) -> bool {
        match (entry.wildcard_domain(), domain_of(address)) {
            (Some(pattern), Some(domain)) => pattern.eq_ignore_ascii_case(domain),
            _ => false,
        }
    }
}

/// A resolved credential and the tier that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved<'a> {
    /// Matching entry.
    pub entry: &'a CredentialEntry,
    /// Name of the tier that matched.
    pub tier: &'static str,
}

/// Ordered list of match tiers.
pub struct Lookup {
    tiers: Vec<Box<dyn MatchTier>>,
}

impl std::fmt::Debug for Lookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.tiers.iter().map(|t| t.name()).collect();
        f.debug_struct("Lookup").field("tiers", &names).finish()
    }
}

impl Default for Lookup {
    fn default() -> Self {
        Self::new(vec![
            Box::new(Exact),
            Box::new(Normalized::default()),
            Box::new(WildcardDomain),
        ])
    }
}

impl Lookup {
    /// Creates a lookup from tiers in priority order.
    #[must_use]
    pub fn new(tiers: Vec<Box<dyn MatchTier>>) -> Self {
        Self { tiers }
    }

    /// Resolves `address` against `entries`.
    #[must_use]
    pub fn resolve<'a>(&self, address: &str, entries: &'a [CredentialEntry]) -> Option<Resolved<'a>> {
        for tier in &self.tiers {
            if let Some(entry) = entries.iter().find(|e| tier.matches(address, e)) {
                debug!(address, tier = tier.name(), machine = %entry.machine, "credential resolved");
                return Some(Resolved {
                    entry,
                    tier: tier.name(),
                });
            }
        }
        debug!(address, "no credential matched");
        None
    }
}

/// Finds the credential for `address` with the default tiers.
#[must_use]
pub fn lookup<'a>(address: &str, entries: &'a [CredentialEntry]) -> Option<&'a CredentialEntry> {
    Lookup::default().resolve(address, entries).map(|r| r.entry)
}
