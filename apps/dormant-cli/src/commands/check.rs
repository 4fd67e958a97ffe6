//! Check command - verify directory access and the holding location

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use dormant_connector_ldap::LdapConnector;
use dormant_core::prelude::*;

use crate::config::AppConfig;
use crate::error::CliResult;

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "DORMANT_CONFIG", default_value = "dormant.yaml")]
    pub config: PathBuf,
}

/// Execute the check command
pub async fn execute(args: CheckArgs) -> CliResult<()> {
    let config = AppConfig::load(&args.config)?;
    println!("Configuration: {} is valid", args.config.display());

    let gateway: Arc<dyn DirectoryGateway> = Arc::new(LdapConnector::new(config.directory.clone())?);
    let orchestrator = LifecycleOrchestrator::new(gateway.clone());

    let outcome = async {
        gateway.test_connection().await?;
        println!("Directory: connected to {}", config.directory.url());

        let holding = orchestrator
            .resolve_holding_location(&config.lifecycle.holding_location)
            .await?;
        println!("Holding location: {}", holding);
        Ok::<_, LifecycleError>(())
    }
    .await;

    let _ = gateway.dispose().await;
    outcome?;
    Ok(())
}
