//! Lifecycle orchestrator
//!
//! Runs one pass end to end:
//!
//! 1. resolve the holding location (ambiguity aborts the pass)
//! 2. query stale accounts for every platform
//! 3. split each platform into review/ignore, then inside/outside holding
//! 4. delete, then disable, accounts inside the holding location
//! 5. move accounts outside the holding location
//! 6. aggregate the result
//!
//! All queries complete before the first mutation. Stages never overlap.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::account::{AccountRecord, Platform};
use crate::classifier::{self, Eligibility, SkipReason, TransitionKind};
use crate::config::LifecycleConfig;
use crate::error::{LifecycleError, LifecycleResult};
use crate::exemption::{partition, ExemptionRules, IgnoredAccount};
use crate::executor::TransitionExecutor;
use crate::gateway::DirectoryGateway;
use crate::report::{Diagnostic, PassResult, PlatformReport, ReportEntry, ReportSink};
use crate::threshold::ThresholdSet;

/// Stage order. An account disabled in this pass is never deleted in it.
const STAGES: [TransitionKind; 3] = [
    TransitionKind::Delete,
    TransitionKind::Disable,
    TransitionKind::Move,
];

/// Review set of one platform, split by location.
struct PlatformSet {
    platform: Platform,
    stale: usize,
    inside: Vec<AccountRecord>,
    outside: Vec<AccountRecord>,
    ignored: Vec<IgnoredAccount>,
}

impl PlatformSet {
    fn split(
        platform: Platform,
        accounts: Vec<AccountRecord>,
        rules: &ExemptionRules,
        holding: &str,
    ) -> Self {
        let stale = accounts.len();
        let partitioned = partition(accounts, rules);
        let (inside, outside) = partitioned
            .review
            .into_iter()
            .partition(|a: &AccountRecord| a.is_in(holding));

        Self {
            platform,
            stale,
            inside,
            outside,
            ignored: partitioned.ignored,
        }
    }

    fn candidates(&self, kind: TransitionKind) -> &[AccountRecord] {
        match kind {
            TransitionKind::Move => &self.outside,
            TransitionKind::Disable | TransitionKind::Delete => &self.inside,
        }
    }

    fn initial_report(&self, thresholds: &ThresholdSet, now: DateTime<Utc>) -> PlatformReport {
        let mut report = PlatformReport::new(self.platform);

        report.stale = self
            .inside
            .iter()
            .map(|a| (a, true))
            .chain(self.outside.iter().map(|a| (a, false)))
            .map(|(a, in_holding)| {
                ReportEntry::stale(
                    a,
                    classifier::pending_transition(a, thresholds, in_holding),
                    now,
                )
            })
            .collect();
        report.ignored = self
            .ignored
            .iter()
            .map(|i| ReportEntry::ignored(i, now))
            .collect();

        report.counts.stale = self.stale;
        report.counts.reviewed = self.inside.len() + self.outside.len();
        report.counts.ignored = self.ignored.len();
        report
    }
}

fn compare_date(thresholds: &ThresholdSet, kind: TransitionKind) -> DateTime<Utc> {
    match kind {
        TransitionKind::Move => thresholds.relocate,
        TransitionKind::Disable => thresholds.disable,
        TransitionKind::Delete => thresholds.remove,
    }
}

/// Eligible accounts for `kind`, plus diagnostics for guard skips that need
/// attention.
fn select(
    candidates: &[AccountRecord],
    compare: DateTime<Utc>,
    kind: TransitionKind,
) -> (Vec<AccountRecord>, Vec<Diagnostic>) {
    let mut eligible = Vec::new();
    let mut diagnostics = Vec::new();

    for account in candidates {
        match classifier::evaluate(account, compare, kind) {
            Eligibility::Eligible => eligible.push(account.clone()),
            Eligibility::Skipped(SkipReason::StillEnabled) => {
                warn!(
                    account = %account.name,
                    dn = %account.distinguished_name,
                    "Account is old enough to delete but still enabled, skipping"
                );
                diagnostics.push(Diagnostic::GuardSkipped {
                    account: account.name.clone(),
                    distinguished_name: account.distinguished_name.clone(),
                    kind,
                    reason: SkipReason::StillEnabled,
                });
            }
            Eligibility::Skipped(SkipReason::AlreadyDisabled) => {
                debug!(account = %account.name, "Already disabled, skipping {}", kind);
            }
            Eligibility::TooRecent => {}
        }
    }

    (eligible, diagnostics)
}

/// Sequences lifecycle passes against a directory.
pub struct LifecycleOrchestrator {
    gateway: Arc<dyn DirectoryGateway>,
}

impl LifecycleOrchestrator {
    pub fn new(gateway: Arc<dyn DirectoryGateway>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Arc<dyn DirectoryGateway> {
        &self.gateway
    }

    /// Run a pass as of now.
    pub async fn run_pass(&self, config: &LifecycleConfig) -> LifecycleResult<PassResult> {
        self.run_pass_at(config, Utc::now()).await
    }

    /// Run a pass with thresholds resolved against `now`.
    #[instrument(skip(self, config, now), fields(gateway = %self.gateway.display_name(), holding = %config.holding_location))]
    pub async fn run_pass_at(
        &self,
        config: &LifecycleConfig,
        now: DateTime<Utc>,
    ) -> LifecycleResult<PassResult> {
        config.validate()?;
        let rules = ExemptionRules::from_config(&config.exemptions)?;
        let holding = self
            .resolve_holding_location(&config.holding_location)
            .await?;
        let thresholds = config.thresholds.at(now);

        let mut sets = Vec::with_capacity(Platform::ALL.len());
        for platform in Platform::ALL {
            let accounts = self
                .gateway
                .query_accounts(thresholds.report, platform)
                .await?;
            info!(%platform, count = accounts.len(), "Queried stale accounts");
            sets.push(PlatformSet::split(platform, accounts, &rules, &holding));
        }

        let mut reports: Vec<PlatformReport> = sets
            .iter()
            .map(|s| s.initial_report(&thresholds, now))
            .collect();
        let mut diagnostics = Vec::new();
        let executor = TransitionExecutor::new(Arc::clone(&self.gateway), holding.clone());

        for kind in STAGES {
            let compare = compare_date(&thresholds, kind);
            let dry_run = config.dry_run.for_kind(kind);

            for (set, report) in sets.iter().zip(reports.iter_mut()) {
                let (eligible, skipped) = select(set.candidates(kind), compare, kind);
                report.counts.skipped += skipped.len();
                diagnostics.extend(skipped);

                let execution = executor.execute(eligible, kind, dry_run).await;
                report.counts.failed += execution.failures.len();
                diagnostics.extend(
                    execution
                        .failures
                        .into_iter()
                        .map(Diagnostic::MutationFailed),
                );

                let outcomes = execution.outcomes;
                match kind {
                    TransitionKind::Delete => {
                        report.counts.deleted = outcomes.len();
                        report.deleted = outcomes;
                    }
                    TransitionKind::Disable => {
                        report.counts.disabled = outcomes.len();
                        report.disabled = outcomes;
                    }
                    TransitionKind::Move => {
                        report.counts.moved = outcomes.len();
                        report.moved = outcomes;
                    }
                }
            }
        }

        let result = PassResult {
            started_at: now,
            completed_at: Utc::now(),
            holding_location: holding,
            thresholds,
            dry_run: config.dry_run,
            platforms: reports,
            diagnostics,
            warnings: Vec::new(),
        };

        let totals = result.totals();
        info!(
            stale = totals.stale,
            ignored = totals.ignored,
            deleted = totals.deleted,
            disabled = totals.disabled,
            moved = totals.moved,
            failed = totals.failed,
            "Lifecycle pass complete"
        );

        Ok(result)
    }

    /// Resolve the holding location to exactly one container.
    #[instrument(skip(self))]
    pub async fn resolve_holding_location(&self, name: &str) -> LifecycleResult<String> {
        let mut matches = self.gateway.resolve_container(name).await?;
        match matches.len() {
            0 => Err(LifecycleError::HoldingLocationNotFound {
                name: name.to_string(),
            }),
            1 => {
                let dn = matches.remove(0);
                info!(dn = %dn, "Resolved holding location");
                Ok(dn)
            }
            n => Err(LifecycleError::HoldingLocationAmbiguous {
                name: name.to_string(),
                matches: n,
            }),
        }
    }
}

/// Deliver `result` to every sink in order.
///
/// The directory changes are already committed at this point, so a failing
/// sink only adds a warning to the result.
pub async fn publish(result: &mut PassResult, sinks: &[Arc<dyn ReportSink>]) {
    for sink in sinks {
        match sink.publish(result).await {
            Ok(()) => info!(sink = sink.name(), "Pass result published"),
            Err(e) => {
                warn!(sink = sink.name(), error = %e, "Failed to publish pass result");
                result
                    .warnings
                    .push(format!("{} delivery failed: {}", sink.name(), e));
            }
        }
    }
}
