//! Lifecycle configuration
//!
//! Everything the orchestrator needs to run a pass, independent of how the
//! directory is reached.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::classifier::TransitionKind;
use crate::error::{LifecycleError, LifecycleResult};
use crate::exemption::ExemptionConfig;
use crate::threshold::ThresholdDays;

/// Report-only switches, one per transition kind. All default to `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DryRun {
    #[serde(default = "default_true")]
    pub moves: bool,

    #[serde(default = "default_true")]
    pub disables: bool,

    #[serde(default = "default_true")]
    pub deletes: bool,
}

fn default_true() -> bool {
    true
}

impl Default for DryRun {
    fn default() -> Self {
        Self::all()
    }
}

impl DryRun {
    /// Report only, for every kind.
    pub fn all() -> Self {
        Self {
            moves: true,
            disables: true,
            deletes: true,
        }
    }

    /// Apply every kind.
    pub fn none() -> Self {
        Self {
            moves: false,
            disables: false,
            deletes: false,
        }
    }

    pub fn for_kind(&self, kind: TransitionKind) -> bool {
        match kind {
            TransitionKind::Move => self.moves,
            TransitionKind::Disable => self.disables,
            TransitionKind::Delete => self.deletes,
        }
    }
}

/// Lifecycle settings for a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleConfig {
    #[serde(default)]
    pub thresholds: ThresholdDays,

    /// Name (or DN) of the container aging accounts are moved into.
    pub holding_location: String,

    #[serde(default)]
    pub exemptions: ExemptionConfig,

    #[serde(default)]
    pub dry_run: DryRun,
}

impl LifecycleConfig {
    pub fn new(holding_location: impl Into<String>) -> Self {
        Self {
            thresholds: ThresholdDays::default(),
            holding_location: holding_location.into(),
            exemptions: ExemptionConfig::default(),
            dry_run: DryRun::default(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: ThresholdDays) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_exemptions(mut self, exemptions: ExemptionConfig) -> Self {
        self.exemptions = exemptions;
        self
    }

    pub fn with_dry_run(mut self, dry_run: DryRun) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Check required settings.
    ///
    /// Threshold ordering is not enforced; a non-monotonic set only produces
    /// a warning. Day counts above one hundred years are rejected.
    pub fn validate(&self) -> LifecycleResult<()> {
        if self.holding_location.trim().is_empty() {
            return Err(LifecycleError::invalid_configuration(
                "holding_location is required",
            ));
        }

        self.thresholds.validate()?;

        if !self.thresholds.is_monotonic() {
            warn!(
                report_days = self.thresholds.report_days,
                move_days = self.thresholds.move_days,
                disable_days = self.thresholds.disable_days,
                remove_days = self.thresholds.remove_days,
                "Thresholds are not ordered report <= move <= disable <= remove"
            );
        }

        Ok(())
    }
}
