//! Run command - execute one lifecycle pass

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use tracing::{info, warn};

use dormant_connector_ldap::LdapConnector;
use dormant_core::prelude::*;
use dormant_notify::{EmailNotifier, FileSink, ReportRenderer};

use crate::config::AppConfig;
use crate::error::CliResult;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "DORMANT_CONFIG", default_value = "dormant.yaml")]
    pub config: PathBuf,

    /// Apply moves into the holding location
    #[arg(long)]
    pub apply_moves: bool,

    /// Apply disables
    #[arg(long)]
    pub apply_disables: bool,

    /// Apply deletes
    #[arg(long)]
    pub apply_deletes: bool,

    /// Apply every transition
    #[arg(long, conflicts_with_all = ["apply_moves", "apply_disables", "apply_deletes"])]
    pub apply_all: bool,

    /// Write the HTML report to this path
    #[arg(long)]
    pub html: Option<PathBuf>,

    /// Write the JSON result to this path
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Do not send the report email
    #[arg(long)]
    pub no_email: bool,
}

impl RunArgs {
    /// Combine the configured dry-run flags with the command line. A flag
    /// can only switch a transition to applied, never back to report-only.
    pub fn dry_run(&self, configured: DryRun) -> DryRun {
        if self.apply_all {
            return DryRun::none();
        }
        DryRun {
            moves: configured.moves && !self.apply_moves,
            disables: configured.disables && !self.apply_disables,
            deletes: configured.deletes && !self.apply_deletes,
        }
    }
}

/// Build the report sinks for this run.
fn sinks(args: &RunArgs, config: &AppConfig) -> CliResult<Vec<Arc<dyn ReportSink>>> {
    let renderer = Arc::new(ReportRenderer::new()?);
    let mut sinks: Vec<Arc<dyn ReportSink>> = Vec::new();

    let mut file = FileSink::new(renderer.clone());
    if let Some(path) = args.html.as_ref().or(config.report.html_path.as_ref()) {
        file = file.with_html(path);
    }
    if let Some(path) = args.json.as_ref().or(config.report.json_path.as_ref()) {
        file = file.with_json(path);
    }
    if !file.is_empty() {
        sinks.push(Arc::new(file));
    }

    if config.notification.enabled && !args.no_email {
        sinks.push(Arc::new(EmailNotifier::new(
            config.notification.clone(),
            renderer,
        )?));
    }

    Ok(sinks)
}

fn print_summary(result: &PassResult) {
    println!("Holding location: {}", result.holding_location);
    for report in &result.platforms {
        let counts = report.counts;
        println!(
            "{:<12} stale {:>4}  ignored {:>4}  moved {:>4}  disabled {:>4}  deleted {:>4}  failed {:>4}",
            report.platform.label(),
            counts.stale,
            counts.ignored,
            counts.moved,
            counts.disabled,
            counts.deleted,
            counts.failed,
        );
    }
    for diagnostic in &result.diagnostics {
        println!("  ! {}", diagnostic);
    }
    for warning in &result.warnings {
        println!("  warning: {}", warning);
    }
    if !result.made_changes() {
        println!("No directory changes were made.");
    }
}

/// Execute the run command
pub async fn execute(args: RunArgs) -> CliResult<()> {
    let config = AppConfig::load(&args.config)?;
    let lifecycle = config
        .lifecycle
        .clone()
        .with_dry_run(args.dry_run(config.lifecycle.dry_run));
    let sinks = sinks(&args, &config)?;

    let gateway: Arc<dyn DirectoryGateway> = Arc::new(LdapConnector::new(config.directory.clone())?);
    let orchestrator = LifecycleOrchestrator::new(gateway.clone());

    let outcome = orchestrator.run_pass(&lifecycle).await;
    if let Err(e) = gateway.dispose().await {
        warn!(error = %e, "Failed to close directory connection");
    }
    let mut result = outcome?;

    publish(&mut result, &sinks).await;
    info!(
        stale = result.totals().stale,
        failed = result.totals().failed,
        warnings = result.warnings.len(),
        "Pass finished"
    );

    print_summary(&result);
    Ok(())
}
