//! Transition executor
//!
//! Applies already-classified transitions through the gateway. One mutation
//! attempt per account, no retries. A rejected mutation drops the account
//! from the outcome list and is recorded as a failure; the remaining accounts
//! are still processed.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::account::AccountRecord;
use crate::classifier::TransitionKind;
use crate::gateway::DirectoryGateway;
use crate::report::{MutationFailure, TransitionOutcome};

/// Outcomes and failures of one executor run.
#[derive(Debug, Clone, Default)]
pub struct ExecutionReport {
    pub outcomes: Vec<TransitionOutcome>,
    pub failures: Vec<MutationFailure>,
}

/// Applies transitions for a single pass.
pub struct TransitionExecutor {
    gateway: Arc<dyn DirectoryGateway>,
    holding_location: String,
}

impl TransitionExecutor {
    /// `holding_location` is the resolved DN moves target.
    pub fn new(gateway: Arc<dyn DirectoryGateway>, holding_location: impl Into<String>) -> Self {
        Self {
            gateway,
            holding_location: holding_location.into(),
        }
    }

    pub fn holding_location(&self) -> &str {
        &self.holding_location
    }

    /// Run `kind` for every account in `eligible`.
    ///
    /// In dry-run mode no gateway call is made and every account is reported
    /// with `executed = false`.
    #[instrument(skip(self, eligible), fields(count = eligible.len()))]
    pub async fn execute(
        &self,
        eligible: Vec<AccountRecord>,
        kind: TransitionKind,
        dry_run: bool,
    ) -> ExecutionReport {
        let mut report = ExecutionReport::default();

        for account in eligible {
            if dry_run {
                debug!(account = %account.name, "Reporting {} without applying", kind);
                report.outcomes.push(TransitionOutcome {
                    transition: kind.into(),
                    account,
                    executed: false,
                });
                continue;
            }

            let result = match kind {
                TransitionKind::Move => {
                    self.gateway
                        .relocate(&account, &self.holding_location)
                        .await
                }
                TransitionKind::Disable => self.gateway.set_enabled(&account, false).await,
                TransitionKind::Delete => self.gateway.remove(&account).await,
            };

            match result {
                Ok(()) => {
                    info!(
                        account = %account.name,
                        dn = %account.distinguished_name,
                        "Applied {}", kind
                    );
                    report.outcomes.push(TransitionOutcome {
                        transition: kind.into(),
                        account,
                        executed: true,
                    });
                }
                Err(e) => {
                    warn!(
                        account = %account.name,
                        dn = %account.distinguished_name,
                        error = %e,
                        "Failed to apply {}", kind
                    );
                    report.failures.push(MutationFailure {
                        account: account.name,
                        distinguished_name: account.distinguished_name,
                        kind,
                        error_code: e.error_code().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        report
    }
}
