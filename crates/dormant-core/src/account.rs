//! Machine-account snapshots
//!
//! An [`AccountRecord`] is a read-only snapshot of a computer object taken at
//! the start of a pass. Records are never written back; state changes go
//! through the [`DirectoryGateway`](crate::gateway::DirectoryGateway).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Platform classification derived from the operating-system string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Windows,
    NonWindows,
}

impl Platform {
    /// All platforms, in report order.
    pub const ALL: [Platform; 2] = [Platform::Windows, Platform::NonWindows];

    /// Classify an operating-system string. An absent value is non-Windows.
    pub fn classify(operating_system: Option<&str>) -> Self {
        match operating_system {
            Some(os) if os.to_ascii_lowercase().contains("windows") => Platform::Windows,
            _ => Platform::NonWindows,
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Platform::Windows => "Windows",
            Platform::NonWindows => "Non-Windows",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Snapshot of a machine account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Account name, unique within a pass.
    pub name: String,

    /// Full distinguished name.
    pub distinguished_name: String,

    /// When the account credential was last rotated.
    pub credential_last_set: DateTime<Utc>,

    /// Whether the account is currently enabled.
    pub enabled: bool,

    /// Free-text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Operating-system string as reported by the directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operating_system: Option<String>,

    /// Distinguished name of the containing object.
    pub container: String,

    /// Owning-user reference (e.g. `managedBy`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
}

impl AccountRecord {
    /// Create an enabled record named `name` directly under `container`.
    pub fn new(
        name: impl Into<String>,
        container: impl Into<String>,
        credential_last_set: DateTime<Utc>,
    ) -> Self {
        let name = name.into();
        let container = container.into();
        Self {
            distinguished_name: format!("CN={},{}", name, container),
            name,
            credential_last_set,
            enabled: true,
            description: None,
            operating_system: None,
            container,
            owner: None,
            created: None,
            modified: None,
        }
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_operating_system(mut self, os: impl Into<String>) -> Self {
        self.operating_system = Some(os.into());
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Platform classification of this account.
    pub fn platform(&self) -> Platform {
        Platform::classify(self.operating_system.as_deref())
    }

    /// Whether the account currently sits directly in `container`.
    pub fn is_in(&self, container: &str) -> bool {
        dn_eq(&self.container, container)
    }

    /// Whole days elapsed since the last credential rotation.
    pub fn days_inactive(&self, now: DateTime<Utc>) -> i64 {
        (now - self.credential_last_set).num_days()
    }

    /// Relative distinguished name (first component of the DN).
    pub fn rdn(&self) -> &str {
        split_dn(&self.distinguished_name).0
    }
}

/// Split a DN into its RDN and parent DN at the first unescaped comma.
pub fn split_dn(dn: &str) -> (&str, &str) {
    let mut escaped = false;
    for (i, ch) in dn.char_indices() {
        match ch {
            '\\' if !escaped => escaped = true,
            ',' if !escaped => return (&dn[..i], dn[i + 1..].trim_start()),
            _ => escaped = false,
        }
    }
    (dn, "")
}

/// Parent DN of `dn`, or an empty string for a single-component DN.
pub fn parent_dn(dn: &str) -> &str {
    split_dn(dn).1
}

/// Compare two DNs case-insensitively, ignoring whitespace around separators.
pub fn dn_eq(a: &str, b: &str) -> bool {
    normalize_dn(a) == normalize_dn(b)
}

fn normalize_dn(dn: &str) -> String {
    let mut components = Vec::new();
    let mut rest = dn.trim();
    while !rest.is_empty() {
        let (rdn, parent) = split_dn(rest);
        components.push(normalize_rdn(rdn));
        rest = parent;
    }
    components.join(",")
}

fn normalize_rdn(rdn: &str) -> String {
    match rdn.split_once('=') {
        Some((attr, value)) => format!(
            "{}={}",
            attr.trim().to_lowercase(),
            trim_value(value).to_lowercase()
        ),
        None => trim_value(rdn).to_lowercase(),
    }
}

/// Trim surrounding whitespace, keeping an escaped trailing space.
fn trim_value(value: &str) -> &str {
    let value = value.trim_start();
    let trimmed = value.trim_end();
    let backslashes = trimmed.chars().rev().take_while(|c| *c == '\\').count();
    if backslashes % 2 == 1 && trimmed.len() < value.len() {
        &value[..trimmed.len() + 1]
    } else {
        trimmed
    }
}
