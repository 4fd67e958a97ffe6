//! Lifecycle classifier
//!
//! Decides whether an account is eligible for a transition. Beyond the age
//! check, each kind carries a guard on the enabled flag:
//!
//! - delete requires the account to be disabled already
//! - disable requires the account to be enabled
//!
//! The delete guard is what keeps an account from being disabled and removed
//! in the same pass. It must hold regardless of the order stages run in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::AccountRecord;
use crate::threshold::ThresholdSet;

/// A directory mutation the engine can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Move,
    Disable,
    Delete,
}

impl TransitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionKind::Move => "move",
            TransitionKind::Disable => "disable",
            TransitionKind::Delete => "delete",
        }
    }
}

impl std::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The transition that applies to an account, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    NoOp,
    Move,
    Disable,
    Delete,
}

impl From<TransitionKind> for Transition {
    fn from(kind: TransitionKind) -> Self {
        match kind {
            TransitionKind::Move => Transition::Move,
            TransitionKind::Disable => Transition::Disable,
            TransitionKind::Delete => Transition::Delete,
        }
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Transition::NoOp => "none",
            Transition::Move => "move",
            Transition::Disable => "disable",
            Transition::Delete => "delete",
        })
    }
}

/// Why an aged account was not made eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Old enough to delete but still enabled.
    StillEnabled,
    /// Old enough to disable but already disabled.
    AlreadyDisabled,
}

/// Outcome of evaluating one account against one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    /// Credential is not older than the compare date.
    TooRecent,
    Skipped(SkipReason),
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible)
    }
}

/// Evaluate `account` for `kind` against `compare_date`.
pub fn evaluate(
    account: &AccountRecord,
    compare_date: DateTime<Utc>,
    kind: TransitionKind,
) -> Eligibility {
    if account.credential_last_set >= compare_date {
        return Eligibility::TooRecent;
    }

    match kind {
        TransitionKind::Delete if account.enabled => Eligibility::Skipped(SkipReason::StillEnabled),
        TransitionKind::Disable if !account.enabled => {
            Eligibility::Skipped(SkipReason::AlreadyDisabled)
        }
        _ => Eligibility::Eligible,
    }
}

/// Whether `account` is eligible for `kind` against `compare_date`.
pub fn is_eligible(
    account: &AccountRecord,
    compare_date: DateTime<Utc>,
    kind: TransitionKind,
) -> bool {
    evaluate(account, compare_date, kind).is_eligible()
}

/// The transition currently applying to a reviewed account.
///
/// Accounts inside the holding location are checked for delete and then
/// disable; accounts outside it are only ever checked for move.
pub fn pending_transition(
    account: &AccountRecord,
    thresholds: &ThresholdSet,
    in_holding: bool,
) -> Transition {
    if in_holding {
        if is_eligible(account, thresholds.remove, TransitionKind::Delete) {
            return Transition::Delete;
        }
        if is_eligible(account, thresholds.disable, TransitionKind::Disable) {
            return Transition::Disable;
        }
        Transition::NoOp
    } else if is_eligible(account, thresholds.relocate, TransitionKind::Move) {
        Transition::Move
    } else {
        Transition::NoOp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threshold::ThresholdDays;
    use chrono::{Duration, TimeZone};

    const OUTSIDE: &str = "OU=Workstations,DC=example,DC=com";
    const HOLDING: &str = "OU=Stale Computers,DC=example,DC=com";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn aged(name: &str, container: &str, days: i64) -> AccountRecord {
        AccountRecord::new(name, container, now() - Duration::days(days))
    }

    fn thresholds() -> ThresholdSet {
        ThresholdDays::new(45, 60, 75, 90).at(now())
    }

    #[test]
    fn test_age_is_strictly_older() {
        let t = thresholds();
        let exactly = aged("PC01", OUTSIDE, 60);
        assert_eq!(
            evaluate(&exactly, t.relocate, TransitionKind::Move),
            Eligibility::TooRecent
        );

        let older = AccountRecord::new("PC02", OUTSIDE, t.relocate - Duration::seconds(1));
        assert!(is_eligible(&older, t.relocate, TransitionKind::Move));
    }

    #[test]
    fn test_delete_requires_disabled() {
        let t = thresholds();
        let enabled = aged("PC01", HOLDING, 100);
        assert_eq!(
            evaluate(&enabled, t.remove, TransitionKind::Delete),
            Eligibility::Skipped(SkipReason::StillEnabled)
        );

        let disabled = aged("PC01", HOLDING, 100).disabled();
        assert!(is_eligible(&disabled, t.remove, TransitionKind::Delete));
    }

    #[test]
    fn test_disable_requires_enabled() {
        let t = thresholds();
        let disabled = aged("PC01", HOLDING, 80).disabled();
        assert_eq!(
            evaluate(&disabled, t.disable, TransitionKind::Disable),
            Eligibility::Skipped(SkipReason::AlreadyDisabled)
        );
        assert!(is_eligible(
            &aged("PC01", HOLDING, 80),
            t.disable,
            TransitionKind::Disable
        ));
    }

    #[test]
    fn test_too_recent_wins_over_guards() {
        let t = thresholds();
        let young_enabled = aged("PC01", HOLDING, 10);
        assert_eq!(
            evaluate(&young_enabled, t.remove, TransitionKind::Delete),
            Eligibility::TooRecent
        );
    }

    #[test]
    fn test_move_has_no_enabled_guard() {
        let t = thresholds();
        assert!(is_eligible(
            &aged("PC01", OUTSIDE, 70).disabled(),
            t.relocate,
            TransitionKind::Move
        ));
    }

    #[test]
    fn test_never_both_disable_and_delete_eligible() {
        let t = thresholds();
        for days in [50, 80, 100, 400] {
            for enabled in [true, false] {
                let mut a = aged("PC01", HOLDING, days);
                a.enabled = enabled;
                let delete = is_eligible(&a, t.remove, TransitionKind::Delete);
                let disable = is_eligible(&a, t.disable, TransitionKind::Disable);
                assert!(!(delete && disable), "days={days} enabled={enabled}");
            }
        }
    }

    #[test]
    fn test_scenario_outside_holding_only_moves() {
        let t = thresholds();
        let a = aged("A", OUTSIDE, 100);
        assert_eq!(pending_transition(&a, &t, false), Transition::Move);
    }

    #[test]
    fn test_scenario_disabled_inside_holding_deletes() {
        let t = thresholds();
        let b = aged("B", HOLDING, 100).disabled();
        assert!(!is_eligible(&b, t.disable, TransitionKind::Disable));
        assert_eq!(pending_transition(&b, &t, true), Transition::Delete);
    }

    #[test]
    fn test_pending_transition_inside_holding() {
        let t = thresholds();
        assert_eq!(
            pending_transition(&aged("PC01", HOLDING, 80), &t, true),
            Transition::Disable
        );
        assert_eq!(
            pending_transition(&aged("PC01", HOLDING, 100), &t, true),
            Transition::Disable
        );
        assert_eq!(
            pending_transition(&aged("PC01", HOLDING, 70), &t, true),
            Transition::NoOp
        );
        assert_eq!(
            pending_transition(&aged("PC01", OUTSIDE, 50), &t, false),
            Transition::NoOp
        );
    }
}
