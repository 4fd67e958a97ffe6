//! Application configuration loaded from YAML.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use dormant_connector_ldap::LdapConfig;
use dormant_core::LifecycleConfig;
use dormant_notify::NotificationConfig;

use crate::error::{CliError, CliResult};

pub const BIND_PASSWORD_ENV: &str = "DORMANT_BIND_PASSWORD";
pub const SMTP_PASSWORD_ENV: &str = "DORMANT_SMTP_PASSWORD";

/// Report file outputs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportOutput {
    #[serde(default)]
    pub html_path: Option<PathBuf>,

    #[serde(default)]
    pub json_path: Option<PathBuf>,
}

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub directory: LdapConfig,

    pub lifecycle: LifecycleConfig,

    #[serde(default)]
    pub notification: NotificationConfig,

    #[serde(default)]
    pub report: ReportOutput,
}

impl AppConfig {
    /// Parse YAML and apply environment overrides from `env`.
    pub fn from_yaml<F>(yaml: &str, env: F) -> CliResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: AppConfig = serde_yaml::from_str(yaml)
            .map_err(|e| CliError::Config(format!("invalid configuration: {}", e)))?;

        if let Some(password) = env(BIND_PASSWORD_ENV) {
            config.directory.bind_password = Some(password);
        }
        if let Some(password) = env(SMTP_PASSWORD_ENV) {
            config.notification.smtp_password = Some(password);
        }

        config.validate()?;
        Ok(config)
    }

    /// Read `path` and apply overrides read through `env`.
    pub fn from_reader<F>(path: &Path, env: F) -> CliResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let yaml = std::fs::read_to_string(path).map_err(|e| CliError::ConfigFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_yaml(&yaml, env)
    }

    /// Load `path`, honoring `.env` and the process environment.
    pub fn load(path: &Path) -> CliResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_reader(path, |key| std::env::var(key).ok())
    }

    pub fn validate(&self) -> CliResult<()> {
        self.directory.validate()?;
        self.lifecycle.validate()?;
        self.notification.validate()?;

        if self.directory.bind_password.is_none() {
            return Err(CliError::Config(format!(
                "directory.bind_password is not set (or set {})",
                BIND_PASSWORD_ENV
            )));
        }

        Ok(())
    }
}
