//! Report rendering
//!
//! Turns a [`PassResult`] into a flat view model and renders it with
//! handlebars. HTML output is escaped; plain-text output is not.

use chrono::{DateTime, Utc};
use handlebars::Handlebars;
use serde::Serialize;

use dormant_core::account::Platform;
use dormant_core::classifier::Transition;
use dormant_core::config::DryRun;
use dormant_core::report::{PassCounts, PassResult, PlatformReport, ReportEntry, TransitionOutcome};

use crate::error::NotificationResult;

const HTML_TEMPLATE: &str = "report_html";
const TEXT_TEMPLATE: &str = "report_text";

const TITLE: &str = "Dormant computer accounts";

fn format_time(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M").to_string()
}

fn format_optional(time: Option<DateTime<Utc>>) -> String {
    time.map(format_time).unwrap_or_default()
}

/// One account row. Absent values render as empty strings.
#[derive(Debug, Clone, Serialize)]
pub struct RowView {
    pub name: String,
    pub days_inactive: i64,
    pub owner: String,
    pub description: String,
    pub credential_last_set: String,
    pub modified: String,
    pub created: String,
    pub platform: String,
    pub operating_system: String,
    pub container: String,
    pub enabled: String,
    pub note: String,
}

impl RowView {
    fn from_entry(entry: &ReportEntry, note: String) -> Self {
        Self {
            name: entry.name.clone(),
            days_inactive: entry.days_inactive,
            owner: entry.owner.clone().unwrap_or_default(),
            description: entry.description.clone().unwrap_or_default(),
            credential_last_set: format_time(entry.credential_last_set),
            modified: format_optional(entry.modified),
            created: format_optional(entry.created),
            platform: entry.platform.label().to_string(),
            operating_system: entry.operating_system.clone().unwrap_or_default(),
            container: entry.container.clone(),
            enabled: if entry.enabled { "yes" } else { "no" }.to_string(),
            note,
        }
    }

    fn stale(entry: &ReportEntry) -> Self {
        let note = match entry.pending {
            Some(Transition::NoOp) | None => String::new(),
            Some(pending) => format!("pending {}", pending),
        };
        Self::from_entry(entry, note)
    }

    fn ignored(entry: &ReportEntry) -> Self {
        let note = entry
            .exemption
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        Self::from_entry(entry, note)
    }

    fn outcome(outcome: &TransitionOutcome, now: DateTime<Utc>) -> Self {
        let note = if outcome.executed {
            "applied"
        } else {
            "report only"
        };
        Self::from_entry(&ReportEntry::outcome(outcome, now), note.to_string())
    }
}

/// A titled list of rows.
#[derive(Debug, Clone, Serialize)]
pub struct SectionView {
    pub heading: String,
    pub count: usize,
    pub rows: Vec<RowView>,
}

impl SectionView {
    fn new(heading: &str, rows: Vec<RowView>) -> Self {
        Self {
            heading: heading.to_string(),
            count: rows.len(),
            rows,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformView {
    pub label: String,
    pub counts: PassCounts,
    pub sections: Vec<SectionView>,
}

impl PlatformView {
    fn new(report: &PlatformReport, now: DateTime<Utc>) -> Self {
        let outcomes = |list: &[TransitionOutcome]| {
            list.iter()
                .map(|o| RowView::outcome(o, now))
                .collect::<Vec<_>>()
        };

        Self {
            label: report.platform.label().to_string(),
            counts: report.counts,
            sections: vec![
                SectionView::new("Deleted", outcomes(&report.deleted)),
                SectionView::new("Disabled", outcomes(&report.disabled)),
                SectionView::new("Moved", outcomes(&report.moved)),
                SectionView::new("Stale", report.stale.iter().map(RowView::stale).collect()),
                SectionView::new(
                    "Ignored",
                    report.ignored.iter().map(RowView::ignored).collect(),
                ),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ThresholdView {
    pub label: String,
    pub days: i64,
    pub date: String,
}

/// Everything the templates can reference.
#[derive(Debug, Clone, Serialize)]
pub struct ReportView {
    pub title: String,
    pub generated_at: String,
    pub holding_location: String,
    pub mode: String,
    pub thresholds: Vec<ThresholdView>,
    pub totals: PassCounts,
    pub platforms: Vec<PlatformView>,
    pub diagnostics: Vec<String>,
    pub warnings: Vec<String>,
}

impl ReportView {
    pub fn new(result: &PassResult) -> Self {
        let now = result.started_at;
        let threshold = |label: &str, date: DateTime<Utc>| ThresholdView {
            label: label.to_string(),
            days: (now - date).num_days(),
            date: format_time(date),
        };

        Self {
            title: TITLE.to_string(),
            generated_at: format_time(result.completed_at),
            holding_location: result.holding_location.clone(),
            mode: mode_label(&result.dry_run),
            thresholds: vec![
                threshold("Report", result.thresholds.report),
                threshold("Move", result.thresholds.relocate),
                threshold("Disable", result.thresholds.disable),
                threshold("Delete", result.thresholds.remove),
            ],
            totals: result.totals(),
            platforms: Platform::ALL
                .iter()
                .filter_map(|p| result.platform(*p))
                .map(|p| PlatformView::new(p, now))
                .collect(),
            diagnostics: result.diagnostics.iter().map(ToString::to_string).collect(),
            warnings: result.warnings.clone(),
        }
    }
}

/// Describe which transitions were applied.
pub fn mode_label(dry_run: &DryRun) -> String {
    if *dry_run == DryRun::all() {
        return "report only, no changes applied".to_string();
    }
    if *dry_run == DryRun::none() {
        return "changes applied".to_string();
    }

    let describe = |report_only: bool| if report_only { "report only" } else { "applied" };
    format!(
        "moves {}, disables {}, deletes {}",
        describe(dry_run.moves),
        describe(dry_run.disables),
        describe(dry_run.deletes)
    )
}

/// Subject line for a pass result.
pub fn subject(result: &PassResult, prefix: &str) -> String {
    let totals = result.totals();
    let mut subject = format!(
        "{} stale computer accounts: {} moved, {} disabled, {} deleted",
        totals.stale, totals.moved, totals.disabled, totals.deleted
    );
    if totals.failed > 0 {
        subject.push_str(&format!(", {} failed", totals.failed));
    }
    if result.dry_run == DryRun::all() {
        subject.push_str(" (report only)");
    }

    let prefix = prefix.trim();
    if prefix.is_empty() {
        subject
    } else {
        format!("{} {}", prefix, subject)
    }
}

/// Renders pass results to HTML and plain text.
pub struct ReportRenderer {
    html: Handlebars<'static>,
    text: Handlebars<'static>,
}

impl ReportRenderer {
    /// Create a renderer with the built-in templates.
    pub fn new() -> NotificationResult<Self> {
        let mut html = Handlebars::new();
        // Missing variables are errors rather than silent blanks
        html.set_strict_mode(true);
        html.register_template_string(HTML_TEMPLATE, include_str!("templates/report.html.hbs"))?;

        let mut text = Handlebars::new();
        text.set_strict_mode(true);
        text.register_escape_fn(handlebars::no_escape);
        text.register_template_string(TEXT_TEMPLATE, include_str!("templates/report.txt.hbs"))?;

        Ok(Self { html, text })
    }

    pub fn render_html(&self, result: &PassResult) -> NotificationResult<String> {
        Ok(self.html.render(HTML_TEMPLATE, &ReportView::new(result))?)
    }

    pub fn render_text(&self, result: &PassResult) -> NotificationResult<String> {
        Ok(self.text.render(TEXT_TEMPLATE, &ReportView::new(result))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use dormant_core::account::AccountRecord;
    use dormant_core::classifier::{SkipReason, TransitionKind};
    use dormant_core::exemption::{ExemptionReason, IgnoredAccount};
    use dormant_core::report::Diagnostic;
    use dormant_core::threshold::ThresholdDays;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn result() -> PassResult {
        let holding = "OU=Stale Computers,DC=example,DC=com";
        let moved = AccountRecord::new(
            "PC<01>",
            "OU=Workstations,DC=example,DC=com",
            now() - Duration::days(100),
        )
        .with_operating_system("Windows 11 Pro")
        .with_owner("Jane Smith");
        let vmaster = AccountRecord::new("vmaster", holding, now() - Duration::days(200))
            .with_operating_system("Windows Server 2019");

        let mut windows = PlatformReport::new(Platform::Windows);
        windows.stale.push(ReportEntry::stale(&moved, Transition::Move, now()));
        windows.moved.push(TransitionOutcome {
            transition: Transition::Move,
            account: moved,
            executed: false,
        });
        windows.ignored.push(ReportEntry::ignored(
            &IgnoredAccount {
                account: vmaster,
                reason: ExemptionReason::Name("vmaster".to_string()),
            },
            now(),
        ));
        windows.counts = PassCounts {
            stale: 2,
            reviewed: 1,
            ignored: 1,
            moved: 1,
            ..Default::default()
        };

        PassResult {
            started_at: now(),
            completed_at: now(),
            holding_location: holding.to_string(),
            thresholds: ThresholdDays::default().at(now()),
            dry_run: DryRun::all(),
            platforms: vec![windows, PlatformReport::new(Platform::NonWindows)],
            diagnostics: vec![Diagnostic::GuardSkipped {
                account: "PC09".to_string(),
                distinguished_name: format!("CN=PC09,{}", holding),
                kind: TransitionKind::Delete,
                reason: SkipReason::StillEnabled,
            }],
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_view_flattens_absent_values() {
        let view = ReportView::new(&result());
        let row = &view.platforms[0].sections[2].rows[0];
        assert_eq!(view.platforms[0].sections[2].heading, "Moved");
        assert_eq!(row.owner, "Jane Smith");
        assert_eq!(row.description, "");
        assert_eq!(row.created, "");
        assert_eq!(row.note, "report only");
        assert_eq!(view.thresholds[1].days, 60);
    }

    #[test]
    fn test_render_html_escapes_values() {
        let renderer = ReportRenderer::new().unwrap();
        let html = renderer.render_html(&result()).unwrap();

        assert!(html.contains("Dormant computer accounts"));
        assert!(html.contains("PC&lt;01&gt;"));
        assert!(!html.contains("PC<01>"));
        assert!(html.contains("name matches &#x27;vmaster&#x27;"));
        assert!(html.contains("Non-Windows"));
    }

    #[test]
    fn test_render_text() {
        let renderer = ReportRenderer::new().unwrap();
        let text = renderer.render_text(&result()).unwrap();

        assert!(text.contains("PC<01> (100 days)"));
        assert!(text.contains("report only, no changes applied"));
        assert!(text.contains("delete of PC09 skipped: account is still enabled"));
    }

    #[test]
    fn test_mode_label() {
        assert_eq!(mode_label(&DryRun::none()), "changes applied");
        let partial = DryRun {
            moves: false,
            ..DryRun::all()
        };
        assert_eq!(
            mode_label(&partial),
            "moves applied, disables report only, deletes report only"
        );
    }

    #[test]
    fn test_subject() {
        assert_eq!(
            subject(&result(), "[dormant]"),
            "[dormant] 2 stale computer accounts: 1 moved, 0 disabled, 0 deleted (report only)"
        );
        assert!(subject(&result(), "  ").starts_with("2 stale"));
    }
}
