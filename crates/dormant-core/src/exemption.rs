//! Exemption filter
//!
//! Splits accounts into those subject to lifecycle processing and those
//! exempted by name or description patterns. Patterns are case-insensitive
//! globs: `*` matches any run of characters, `?` matches exactly one, and
//! everything else is literal.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::account::AccountRecord;
use crate::error::{LifecycleError, LifecycleResult};

/// Exemption pattern lists as configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExemptionConfig {
    #[serde(default)]
    pub name_patterns: Vec<String>,

    #[serde(default)]
    pub description_patterns: Vec<String>,
}

/// A single compiled glob.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    regex: Option<Regex>,
}

impl GlobPattern {
    /// Compile a glob. An empty pattern compiles to one that never matches.
    pub fn new(pattern: &str) -> LifecycleResult<Self> {
        if pattern.is_empty() {
            return Ok(Self {
                source: String::new(),
                regex: None,
            });
        }

        let mut expr = String::with_capacity(pattern.len() + 8);
        expr.push('^');
        for ch in pattern.chars() {
            match ch {
                '*' => expr.push_str(".*"),
                '?' => expr.push('.'),
                _ => expr.push_str(&regex::escape(ch.encode_utf8(&mut [0; 4]))),
            }
        }
        expr.push('$');

        let regex = RegexBuilder::new(&expr)
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()
            .map_err(|e| LifecycleError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            source: pattern.to_string(),
            regex: Some(regex),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, value: &str) -> bool {
        self.regex.as_ref().is_some_and(|r| r.is_match(value))
    }
}

/// Why an account was exempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "pattern", rename_all = "snake_case")]
pub enum ExemptionReason {
    Name(String),
    Description(String),
}

impl std::fmt::Display for ExemptionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExemptionReason::Name(p) => write!(f, "name matches '{}'", p),
            ExemptionReason::Description(p) => write!(f, "description matches '{}'", p),
        }
    }
}

/// Compiled exemption rules, immutable for the duration of a pass.
#[derive(Debug, Clone, Default)]
pub struct ExemptionRules {
    names: Vec<GlobPattern>,
    descriptions: Vec<GlobPattern>,
}

impl ExemptionRules {
    pub fn new<N, D>(name_patterns: N, description_patterns: D) -> LifecycleResult<Self>
    where
        N: IntoIterator,
        N::Item: AsRef<str>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        let names = name_patterns
            .into_iter()
            .map(|p| GlobPattern::new(p.as_ref()))
            .collect::<LifecycleResult<Vec<_>>>()?;
        let descriptions = description_patterns
            .into_iter()
            .map(|p| GlobPattern::new(p.as_ref()))
            .collect::<LifecycleResult<Vec<_>>>()?;

        Ok(Self {
            names,
            descriptions,
        })
    }

    pub fn from_config(config: &ExemptionConfig) -> LifecycleResult<Self> {
        Self::new(&config.name_patterns, &config.description_patterns)
    }

    /// Decide whether `account` is exempt. Name patterns win over description
    /// patterns; description patterns are not consulted after a name match.
    /// An absent description is matched as the empty string.
    pub fn exemption_for(&self, account: &AccountRecord) -> Option<ExemptionReason> {
        if let Some(p) = self.names.iter().find(|p| p.matches(&account.name)) {
            return Some(ExemptionReason::Name(p.as_str().to_string()));
        }

        let description = account.description.as_deref().unwrap_or_default();
        self.descriptions
            .iter()
            .find(|p| p.matches(description))
            .map(|p| ExemptionReason::Description(p.as_str().to_string()))
    }
}

/// An account removed from processing, with the rule that exempted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoredAccount {
    pub account: AccountRecord,
    pub reason: ExemptionReason,
}

/// Result of [`partition`].
#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub review: Vec<AccountRecord>,
    pub ignored: Vec<IgnoredAccount>,
}

/// Split `accounts` into review and ignore sets. Every input lands in exactly
/// one of the two, and input order is preserved within each.
pub fn partition(
    accounts: impl IntoIterator<Item = AccountRecord>,
    rules: &ExemptionRules,
) -> Partition {
    let mut result = Partition::default();
    for account in accounts {
        match rules.exemption_for(&account) {
            Some(reason) => result.ignored.push(IgnoredAccount { account, reason }),
            None => result.review.push(account),
        }
    }
    result
}
