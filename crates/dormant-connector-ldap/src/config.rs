//! LDAP gateway configuration
//!
//! Connection and search settings for an Active Directory domain.

use serde::{Deserialize, Serialize};

use dormant_core::error::{LifecycleError, LifecycleResult};

/// Configuration for the LDAP gateway.
#[derive(Clone, Serialize, Deserialize)]
pub struct LdapConfig {
    /// Domain controller hostname or IP address.
    pub host: String,

    /// LDAP server port (389 for LDAP, 636 for LDAPS).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Use SSL/TLS (LDAPS).
    #[serde(default)]
    pub use_ssl: bool,

    /// Use STARTTLS upgrade on plain LDAP connection.
    #[serde(default)]
    pub use_starttls: bool,

    /// Base DN of the domain (e.g., "DC=example,DC=com").
    pub base_dn: String,

    /// Where computer accounts are searched. Defaults to `base_dn`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_base: Option<String>,

    /// Bind DN for authentication.
    pub bind_dn: String,

    /// Bind password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_password: Option<String>,

    /// Connection timeout in seconds.
    #[serde(default = "default_connection_timeout_secs")]
    pub connection_timeout_secs: u64,

    /// Page size for search operations.
    #[serde(default = "default_page_size")]
    pub page_size: i32,

    /// Remove accounts together with their leaf children (tree delete control).
    #[serde(default = "default_tree_delete")]
    pub tree_delete: bool,
}

impl std::fmt::Debug for LdapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapConfig")
            .field("host", &self.host)
            .field("port", &self.port())
            .field("use_ssl", &self.use_ssl)
            .field("use_starttls", &self.use_starttls)
            .field("base_dn", &self.base_dn)
            .field("search_base", &self.search_base)
            .field("bind_dn", &self.bind_dn)
            .field(
                "bind_password",
                &self.bind_password.as_ref().map(|_| "***REDACTED***"),
            )
            .field("connection_timeout_secs", &self.connection_timeout_secs)
            .field("page_size", &self.page_size)
            .field("tree_delete", &self.tree_delete)
            .finish()
    }
}

fn default_connection_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> i32 {
    500
}

fn default_tree_delete() -> bool {
    true
}

impl LdapConfig {
    /// Create a new LDAP config with required fields.
    pub fn new(
        host: impl Into<String>,
        base_dn: impl Into<String>,
        bind_dn: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: None,
            use_ssl: false,
            use_starttls: false,
            base_dn: base_dn.into(),
            search_base: None,
            bind_dn: bind_dn.into(),
            bind_password: None,
            connection_timeout_secs: default_connection_timeout_secs(),
            page_size: default_page_size(),
            tree_delete: default_tree_delete(),
        }
    }

    /// Set bind password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.bind_password = Some(password.into());
        self
    }

    /// Enable SSL (LDAPS).
    #[must_use]
    pub fn with_ssl(mut self) -> Self {
        self.use_ssl = true;
        self
    }

    /// Enable STARTTLS.
    #[must_use]
    pub fn with_starttls(mut self) -> Self {
        self.use_starttls = true;
        self
    }

    /// Restrict the account search to `dn`.
    pub fn with_search_base(mut self, dn: impl Into<String>) -> Self {
        self.search_base = Some(dn.into());
        self
    }

    /// DN under which computer accounts are searched.
    #[must_use]
    pub fn search_dn(&self) -> &str {
        self.search_base.as_deref().unwrap_or(&self.base_dn)
    }

    /// Effective port: explicit, else 636 for LDAPS and 389 otherwise.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(if self.use_ssl { 636 } else { 389 })
    }

    /// Get the LDAP URL.
    #[must_use]
    pub fn url(&self) -> String {
        let scheme = if self.use_ssl { "ldaps" } else { "ldap" };
        format!("{}://{}:{}", scheme, self.host, self.port())
    }

    pub fn validate(&self) -> LifecycleResult<()> {
        if self.host.is_empty() {
            return Err(LifecycleError::invalid_configuration("host is required"));
        }

        if self.base_dn.is_empty() {
            return Err(LifecycleError::invalid_configuration("base_dn is required"));
        }

        if self.bind_dn.is_empty() {
            return Err(LifecycleError::invalid_configuration("bind_dn is required"));
        }

        if self.use_ssl && self.use_starttls {
            return Err(LifecycleError::invalid_configuration(
                "cannot use both SSL and STARTTLS",
            ));
        }

        if self.page_size <= 0 {
            return Err(LifecycleError::invalid_configuration(
                "page_size must be positive",
            ));
        }

        Ok(())
    }

    /// Copy with the password masked, for logging.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.bind_password.is_some() {
            config.bind_password = Some("***REDACTED***".to_string());
        }
        config
    }
}
