//! LDAP gateway implementation
//!
//! Implements [`DirectoryGateway`] for Active Directory over LDAP.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ldap3::adapters::{Adapter, EntriesOnly, PagedResults};
use ldap3::controls::RawControl;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Mod, Scope, SearchEntry, SearchResult};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use dormant_core::account::{AccountRecord, Platform};
use dormant_core::error::{LifecycleError, LifecycleResult};
use dormant_core::gateway::{ContainerId, DirectoryGateway};

use crate::ad::{
    account_from_entry, computer_attributes, is_domain_controller_entry,
    organizational_unit_filter, stale_computer_filter, UserAccountControl,
};
use crate::config::LdapConfig;

/// LDAP_SERVER_TREE_DELETE_OID
const TREE_DELETE_OID: &str = "1.2.840.113556.1.4.805";

/// Map an LDAP result code to a lifecycle error.
fn check_rc(rc: u32, text: &str, operation: &str, dn: &str) -> LifecycleResult<()> {
    match rc {
        0 => Ok(()),
        32 => Err(LifecycleError::ObjectNotFound {
            identifier: dn.to_string(),
        }),
        49 => Err(LifecycleError::AuthenticationFailed),
        50 => Err(LifecycleError::InsufficientAccess {
            operation: operation.to_string(),
            identifier: dn.to_string(),
        }),
        rc => Err(LifecycleError::operation_failed(format!(
            "LDAP {} failed with code {}: {}",
            operation, rc, text
        ))),
    }
}

/// Directory gateway backed by an LDAP connection to Active Directory.
pub struct LdapConnector {
    /// Configuration.
    config: LdapConfig,

    /// Display name for this connector instance.
    display_name: String,

    /// Cached LDAP connection (lazily initialized).
    connection: Arc<RwLock<Option<Ldap>>>,

    /// Whether the connector has been disposed.
    disposed: Arc<RwLock<bool>>,
}

impl LdapConnector {
    /// Create a new LDAP connector with the given configuration.
    pub fn new(config: LdapConfig) -> LifecycleResult<Self> {
        config.validate()?;

        let display_name = format!("LDAP: {}", config.host);

        Ok(Self {
            config,
            display_name,
            connection: Arc::new(RwLock::new(None)),
            disposed: Arc::new(RwLock::new(false)),
        })
    }

    pub fn config(&self) -> &LdapConfig {
        &self.config
    }

    /// Get an LDAP connection, creating one if necessary.
    async fn get_connection(&self) -> LifecycleResult<Ldap> {
        if *self.disposed.read().await {
            return Err(LifecycleError::connection_failed(
                "LDAP connector has been disposed",
            ));
        }

        {
            let conn_guard = self.connection.read().await;
            if let Some(ref conn) = *conn_guard {
                return Ok(conn.clone());
            }
        }

        let conn = self.create_connection().await?;

        {
            let mut conn_guard = self.connection.write().await;
            *conn_guard = Some(conn.clone());
        }

        Ok(conn)
    }

    /// Create and bind a new LDAP connection.
    async fn create_connection(&self) -> LifecycleResult<Ldap> {
        let url = self.config.url();

        debug!(url = %url, "Connecting to LDAP server");

        let settings = LdapConnSettings::new()
            .set_conn_timeout(std::time::Duration::from_secs(
                self.config.connection_timeout_secs,
            ))
            .set_starttls(self.config.use_starttls);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|e| {
                LifecycleError::connection_failed_with_source(
                    format!("Failed to connect to LDAP server at {}", url),
                    e,
                )
            })?;

        // Spawn the connection driver
        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        let bind_dn = &self.config.bind_dn;
        let bind_password = self.config.bind_password.as_deref().unwrap_or("");

        debug!(bind_dn = %bind_dn, "Performing LDAP bind");

        let result = ldap
            .simple_bind(bind_dn, bind_password)
            .await
            .map_err(|e| {
                LifecycleError::connection_failed_with_source(
                    format!("LDAP bind failed for {}", bind_dn),
                    e,
                )
            })?;

        if result.rc != 0 {
            if result.rc == 49 {
                return Err(LifecycleError::AuthenticationFailed);
            }
            return Err(LifecycleError::connection_failed(format!(
                "LDAP bind failed with code {}: {}",
                result.rc, result.text
            )));
        }

        info!(host = %self.config.host, "LDAP connection established successfully");

        Ok(ldap)
    }

    /// Subtree search with server-side paging.
    async fn search_paged(
        &self,
        base: &str,
        filter: &str,
        attrs: Vec<&str>,
    ) -> LifecycleResult<Vec<SearchEntry>> {
        let mut ldap = self.get_connection().await?;

        debug!(base = %base, filter = %filter, "Paged LDAP search");

        let adapters: Vec<Box<dyn Adapter<_, _>>> = vec![
            Box::new(EntriesOnly::new()),
            Box::new(PagedResults::new(self.config.page_size)),
        ];
        let mut stream = ldap
            .streaming_search_with(adapters, base, Scope::Subtree, filter, attrs)
            .await
            .map_err(|e| LifecycleError::operation_failed_with_source("LDAP search failed", e))?;

        let mut entries = Vec::new();
        while let Some(entry) = stream
            .next()
            .await
            .map_err(|e| LifecycleError::operation_failed_with_source("LDAP search failed", e))?
        {
            entries.push(SearchEntry::construct(entry));
        }

        let result = stream.finish().await;
        check_rc(result.rc, &result.text, "search", base)?;

        Ok(entries)
    }

    /// Read a single entry by DN. `None` when the DN does not exist.
    async fn read_entry(&self, dn: &str, attrs: Vec<&str>) -> LifecycleResult<Option<SearchEntry>> {
        let mut ldap = self.get_connection().await?;

        let SearchResult(entries, result) = ldap
            .search(dn, Scope::Base, "(objectClass=*)", attrs)
            .await
            .map_err(|e| {
                LifecycleError::operation_failed_with_source(format!("Failed to read {}", dn), e)
            })?;

        if result.rc == 32 {
            return Ok(None);
        }
        check_rc(result.rc, &result.text, "read", dn)?;

        Ok(entries.into_iter().next().map(SearchEntry::construct))
    }

    /// Read the current userAccountControl value of an entry.
    async fn read_uac(&self, dn: &str) -> LifecycleResult<UserAccountControl> {
        let entry = self
            .read_entry(dn, vec!["userAccountControl"])
            .await?
            .ok_or_else(|| LifecycleError::ObjectNotFound {
                identifier: dn.to_string(),
            })?;

        let raw = entry
            .attrs
            .get("userAccountControl")
            .and_then(|values| values.first())
            .ok_or_else(|| LifecycleError::InvalidData {
                message: format!("userAccountControl missing on {}", dn),
            })?;

        UserAccountControl::parse(raw).ok_or_else(|| LifecycleError::InvalidData {
            message: format!("Invalid userAccountControl value: {}", raw),
        })
    }
}

#[async_trait]
impl DirectoryGateway for LdapConnector {
    fn display_name(&self) -> &str {
        &self.display_name
    }

    #[instrument(skip(self))]
    async fn test_connection(&self) -> LifecycleResult<()> {
        let entry = self.read_entry(&self.config.base_dn, vec!["1.1"]).await?;

        if entry.is_none() {
            return Err(LifecycleError::connection_failed(format!(
                "Base DN '{}' not found or not accessible",
                self.config.base_dn
            )));
        }

        info!("LDAP connection test successful");
        Ok(())
    }

    #[instrument(skip(self), fields(base = %self.config.search_dn()))]
    async fn query_accounts(
        &self,
        older_than: DateTime<Utc>,
        platform: Platform,
    ) -> LifecycleResult<Vec<AccountRecord>> {
        let filter = stale_computer_filter(older_than, platform);
        let entries = self
            .search_paged(self.config.search_dn(), &filter, computer_attributes())
            .await?;

        let mut accounts = Vec::with_capacity(entries.len());
        for entry in entries {
            if is_domain_controller_entry(&entry.attrs) {
                warn!(dn = %entry.dn, "Skipping domain controller");
                continue;
            }
            match account_from_entry(&entry.dn, &entry.attrs) {
                Ok(account) => accounts.push(account),
                Err(e) => warn!(dn = %entry.dn, error = %e, "Skipping computer entry"),
            }
        }

        info!(count = accounts.len(), "Computer search completed");
        Ok(accounts)
    }

    #[instrument(skip(self))]
    async fn resolve_container(&self, name: &str) -> LifecycleResult<Vec<ContainerId>> {
        // A full DN is verified as-is
        if name.contains('=') {
            let entry = self.read_entry(name, vec!["1.1"]).await?;
            return Ok(entry.into_iter().map(|e| e.dn).collect());
        }

        let entries = self
            .search_paged(
                &self.config.base_dn,
                &organizational_unit_filter(name),
                vec!["1.1"],
            )
            .await?;

        Ok(entries.into_iter().map(|e| e.dn).collect())
    }

    #[instrument(skip(self, account), fields(dn = %account.distinguished_name))]
    async fn relocate(&self, account: &AccountRecord, target: &str) -> LifecycleResult<()> {
        let mut ldap = self.get_connection().await?;
        let dn = &account.distinguished_name;

        debug!(target = %target, "Moving LDAP entry");

        let result = ldap
            .modifydn(dn, account.rdn(), true, Some(target))
            .await
            .map_err(|e| {
                LifecycleError::operation_failed_with_source(format!("Failed to move {}", dn), e)
            })?;
        check_rc(result.rc, &result.text, "move", dn)?;

        info!(target = %target, "LDAP entry moved successfully");
        Ok(())
    }

    #[instrument(skip(self, account), fields(dn = %account.distinguished_name))]
    async fn set_enabled(&self, account: &AccountRecord, enabled: bool) -> LifecycleResult<()> {
        let dn = &account.distinguished_name;

        // Read current userAccountControl, toggle ACCOUNTDISABLE only
        let current = self.read_uac(dn).await?;
        let updated = current.with_enabled(enabled);
        if updated == current {
            debug!(enabled, "userAccountControl already in requested state");
            return Ok(());
        }

        let value = u32::from(updated).to_string();
        let mut ldap = self.get_connection().await?;
        let result = ldap
            .modify(
                dn,
                vec![Mod::Replace(
                    "userAccountControl",
                    HashSet::from([value.as_str()]),
                )],
            )
            .await
            .map_err(|e| {
                LifecycleError::operation_failed_with_source(format!("Failed to update {}", dn), e)
            })?;
        check_rc(result.rc, &result.text, "modify", dn)?;

        info!(enabled, "AD account updated");
        Ok(())
    }

    #[instrument(skip(self, account), fields(dn = %account.distinguished_name))]
    async fn remove(&self, account: &AccountRecord) -> LifecycleResult<()> {
        let mut ldap = self.get_connection().await?;
        let dn = &account.distinguished_name;

        let request = if self.config.tree_delete {
            ldap.with_controls(RawControl {
                ctype: TREE_DELETE_OID.to_string(),
                crit: true,
                val: None,
            })
        } else {
            &mut ldap
        };

        let result = request.delete(dn).await.map_err(|e| {
            LifecycleError::operation_failed_with_source(format!("Failed to delete {}", dn), e)
        })?;
        check_rc(result.rc, &result.text, "delete", dn)?;

        info!("LDAP entry deleted successfully");
        Ok(())
    }

    async fn dispose(&self) -> LifecycleResult<()> {
        *self.disposed.write().await = true;

        let mut conn_guard = self.connection.write().await;
        if let Some(mut ldap) = conn_guard.take() {
            if let Err(e) = ldap.unbind().await {
                warn!(error = %e, "Error during LDAP unbind");
            }
        }

        info!("LDAP connector disposed");
        Ok(())
    }
}

impl std::fmt::Debug for LdapConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapConnector")
            .field("display_name", &self.display_name)
            .field("config", &self.config.redacted())
            .finish()
    }
}
