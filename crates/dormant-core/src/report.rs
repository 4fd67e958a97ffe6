//! Pass results and the reporting boundary
//!
//! A [`PassResult`] is the only artifact a pass produces besides the directory
//! changes themselves. It is handed to one or more [`ReportSink`]s.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::{AccountRecord, Platform};
use crate::classifier::{SkipReason, Transition, TransitionKind};
use crate::config::DryRun;
use crate::error::LifecycleResult;
use crate::exemption::{ExemptionReason, IgnoredAccount};
use crate::threshold::ThresholdSet;

/// Result of one transition for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub transition: Transition,
    pub account: AccountRecord,
    /// False when the transition was only reported (dry-run).
    pub executed: bool,
}

/// A gateway mutation that was attempted and rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationFailure {
    pub account: String,
    pub distinguished_name: String,
    pub kind: TransitionKind,
    pub error_code: String,
    pub message: String,
}

/// Something the operator should look at; never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Diagnostic {
    MutationFailed(MutationFailure),
    GuardSkipped {
        account: String,
        distinguished_name: String,
        kind: TransitionKind,
        reason: SkipReason,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::MutationFailed(m) => write!(
                f,
                "{} of {} failed [{}]: {}",
                m.kind, m.account, m.error_code, m.message
            ),
            Diagnostic::GuardSkipped {
                account,
                kind,
                reason: SkipReason::StillEnabled,
                ..
            } => write!(
                f,
                "{} of {} skipped: account is still enabled",
                kind, account
            ),
            Diagnostic::GuardSkipped {
                account,
                kind,
                reason: SkipReason::AlreadyDisabled,
                ..
            } => write!(
                f,
                "{} of {} skipped: account is already disabled",
                kind, account
            ),
        }
    }
}

/// Flat per-account row for rendering. Absent values stay `None` and render
/// empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub name: String,
    pub days_inactive: i64,
    pub owner: Option<String>,
    pub description: Option<String>,
    pub credential_last_set: DateTime<Utc>,
    pub modified: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
    pub platform: Platform,
    pub operating_system: Option<String>,
    pub container: String,
    pub enabled: bool,
    pub pending: Option<Transition>,
    pub exemption: Option<ExemptionReason>,
    pub executed: Option<bool>,
}

impl ReportEntry {
    pub fn from_account(account: &AccountRecord, now: DateTime<Utc>) -> Self {
        Self {
            name: account.name.clone(),
            days_inactive: account.days_inactive(now),
            owner: account.owner.clone(),
            description: account.description.clone(),
            credential_last_set: account.credential_last_set,
            modified: account.modified,
            created: account.created,
            platform: account.platform(),
            operating_system: account.operating_system.clone(),
            container: account.container.clone(),
            enabled: account.enabled,
            pending: None,
            exemption: None,
            executed: None,
        }
    }

    pub fn stale(account: &AccountRecord, pending: Transition, now: DateTime<Utc>) -> Self {
        Self {
            pending: Some(pending),
            ..Self::from_account(account, now)
        }
    }

    pub fn ignored(ignored: &IgnoredAccount, now: DateTime<Utc>) -> Self {
        Self {
            exemption: Some(ignored.reason.clone()),
            ..Self::from_account(&ignored.account, now)
        }
    }

    pub fn outcome(outcome: &TransitionOutcome, now: DateTime<Utc>) -> Self {
        Self {
            pending: Some(outcome.transition),
            executed: Some(outcome.executed),
            ..Self::from_account(&outcome.account, now)
        }
    }
}

/// Aggregate counts for one platform (or the whole pass).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassCounts {
    /// Accounts older than the report threshold.
    pub stale: usize,
    pub reviewed: usize,
    pub ignored: usize,
    pub moved: usize,
    pub disabled: usize,
    pub deleted: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl std::ops::Add for PassCounts {
    type Output = PassCounts;

    fn add(self, other: PassCounts) -> PassCounts {
        PassCounts {
            stale: self.stale + other.stale,
            reviewed: self.reviewed + other.reviewed,
            ignored: self.ignored + other.ignored,
            moved: self.moved + other.moved,
            disabled: self.disabled + other.disabled,
            deleted: self.deleted + other.deleted,
            failed: self.failed + other.failed,
            skipped: self.skipped + other.skipped,
        }
    }
}

/// Per-platform section of a pass result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformReport {
    pub platform: Platform,
    /// Reviewed accounts with the transition that currently applies.
    pub stale: Vec<ReportEntry>,
    pub ignored: Vec<ReportEntry>,
    pub deleted: Vec<TransitionOutcome>,
    pub disabled: Vec<TransitionOutcome>,
    pub moved: Vec<TransitionOutcome>,
    pub counts: PassCounts,
}

impl PlatformReport {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            stale: Vec::new(),
            ignored: Vec::new(),
            deleted: Vec::new(),
            disabled: Vec::new(),
            moved: Vec::new(),
            counts: PassCounts::default(),
        }
    }
}

/// Everything a completed pass produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassResult {
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Resolved DN of the holding location.
    pub holding_location: String,
    pub thresholds: ThresholdSet,
    pub dry_run: DryRun,
    pub platforms: Vec<PlatformReport>,
    pub diagnostics: Vec<Diagnostic>,
    /// Pass-level warnings, e.g. a report sink that could not deliver.
    pub warnings: Vec<String>,
}

impl PassResult {
    pub fn platform(&self, platform: Platform) -> Option<&PlatformReport> {
        self.platforms.iter().find(|p| p.platform == platform)
    }

    pub fn totals(&self) -> PassCounts {
        self.platforms
            .iter()
            .fold(PassCounts::default(), |acc, p| acc + p.counts)
    }

    pub fn failures(&self) -> impl Iterator<Item = &MutationFailure> {
        self.diagnostics.iter().filter_map(|d| match d {
            Diagnostic::MutationFailed(m) => Some(m),
            Diagnostic::GuardSkipped { .. } => None,
        })
    }

    /// Whether any transition was applied for real.
    pub fn made_changes(&self) -> bool {
        self.platforms.iter().any(|p| {
            p.deleted
                .iter()
                .chain(&p.disabled)
                .chain(&p.moved)
                .any(|o| o.executed)
        })
    }
}

/// Destination for a completed pass result.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Name used in logs and warnings.
    fn name(&self) -> &str;

    async fn publish(&self, result: &PassResult) -> LifecycleResult<()>;
}
