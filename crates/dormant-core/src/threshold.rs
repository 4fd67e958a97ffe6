//! Age thresholds
//!
//! Thresholds are configured in days ([`ThresholdDays`]) and turned into
//! concrete compare dates ([`ThresholdSet`]) once per pass.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LifecycleError, LifecycleResult};

/// Largest accepted threshold, roughly one hundred years.
pub const MAX_THRESHOLD_DAYS: u32 = 36_525;

/// Age thresholds in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdDays {
    /// Accounts older than this appear in the report.
    #[serde(default = "default_report_days")]
    pub report_days: u32,

    /// Accounts older than this are relocated to the holding location.
    #[serde(default = "default_move_days")]
    pub move_days: u32,

    /// Accounts in the holding location older than this are disabled.
    #[serde(default = "default_disable_days")]
    pub disable_days: u32,

    /// Disabled accounts in the holding location older than this are removed.
    #[serde(default = "default_remove_days")]
    pub remove_days: u32,
}

fn default_report_days() -> u32 {
    45
}

fn default_move_days() -> u32 {
    60
}

fn default_disable_days() -> u32 {
    75
}

fn default_remove_days() -> u32 {
    90
}

impl Default for ThresholdDays {
    fn default() -> Self {
        Self {
            report_days: default_report_days(),
            move_days: default_move_days(),
            disable_days: default_disable_days(),
            remove_days: default_remove_days(),
        }
    }
}

impl ThresholdDays {
    pub fn new(report_days: u32, move_days: u32, disable_days: u32, remove_days: u32) -> Self {
        Self {
            report_days,
            move_days,
            disable_days,
            remove_days,
        }
    }

    /// Whether report ≤ move ≤ disable ≤ remove holds.
    pub fn is_monotonic(&self) -> bool {
        self.report_days <= self.move_days
            && self.move_days <= self.disable_days
            && self.disable_days <= self.remove_days
    }

    /// Reject day counts above [`MAX_THRESHOLD_DAYS`].
    pub fn validate(&self) -> LifecycleResult<()> {
        let fields = [
            ("report_days", self.report_days),
            ("move_days", self.move_days),
            ("disable_days", self.disable_days),
            ("remove_days", self.remove_days),
        ];
        for (field, days) in fields {
            if days > MAX_THRESHOLD_DAYS {
                return Err(LifecycleError::invalid_configuration(format!(
                    "{} must be at most {} days, got {}",
                    field, MAX_THRESHOLD_DAYS, days
                )));
            }
        }
        Ok(())
    }

    /// Resolve the thresholds against `now`. Dates before the representable
    /// range clamp to the earliest representable instant.
    pub fn at(&self, now: DateTime<Utc>) -> ThresholdSet {
        let before = |days: u32| {
            now.checked_sub_signed(Duration::days(i64::from(days)))
                .unwrap_or(DateTime::<Utc>::MIN_UTC)
        };
        ThresholdSet {
            report: before(self.report_days),
            relocate: before(self.move_days),
            disable: before(self.disable_days),
            remove: before(self.remove_days),
        }
    }
}

/// Concrete compare dates for one pass.
///
/// An account qualifies for a stage when its credential timestamp is strictly
/// older than the stage's date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdSet {
    pub report: DateTime<Utc>,
    pub relocate: DateTime<Utc>,
    pub disable: DateTime<Utc>,
    pub remove: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_defaults() {
        let days = ThresholdDays::default();
        assert_eq!(days, ThresholdDays::new(45, 60, 75, 90));
        assert!(days.is_monotonic());
    }

    #[test]
    fn test_non_monotonic_detected() {
        assert!(!ThresholdDays::new(45, 90, 75, 100).is_monotonic());
        assert!(!ThresholdDays::new(45, 60, 95, 90).is_monotonic());
        assert!(ThresholdDays::new(30, 30, 30, 30).is_monotonic());
    }

    #[test]
    fn test_at_subtracts_days() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let set = ThresholdDays::default().at(now);

        assert_eq!(set.report, now - Duration::days(45));
        assert_eq!(set.relocate, now - Duration::days(60));
        assert_eq!(set.disable, now - Duration::days(75));
        assert_eq!(set.remove, now - Duration::days(90));
        assert!(set.remove < set.disable);
        assert!(set.disable < set.relocate);
        assert!(set.relocate < set.report);
    }

    #[test]
    fn test_validate_bounds_days() {
        assert!(ThresholdDays::default().validate().is_ok());
        assert!(ThresholdDays::new(45, 60, 75, MAX_THRESHOLD_DAYS)
            .validate()
            .is_ok());

        let err = ThresholdDays::new(45, 60, 75, 4_000_000_000)
            .validate()
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
        assert!(err.to_string().contains("remove_days"));
    }

    #[test]
    fn test_at_clamps_out_of_range_dates() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let set = ThresholdDays::new(45, 60, 75, u32::MAX).at(now);
        assert_eq!(set.remove, DateTime::<Utc>::MIN_UTC);
        assert_eq!(set.report, now - Duration::days(45));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let days: ThresholdDays = serde_yaml::from_str("remove_days: 180").unwrap();
        assert_eq!(days.report_days, 45);
        assert_eq!(days.remove_days, 180);
    }
}
