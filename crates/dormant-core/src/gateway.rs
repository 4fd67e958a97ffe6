//! Directory gateway capability
//!
//! The lifecycle engine never speaks a directory protocol itself. Everything
//! it reads or changes goes through an injected [`DirectoryGateway`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::account::{AccountRecord, Platform};
use crate::error::LifecycleResult;

/// Identifier of a directory container (a DN for LDAP directories).
pub type ContainerId = String;

/// Access to machine accounts in a directory service.
///
/// Each mutation is expected to fail independently and without side effects;
/// callers make exactly one attempt per account and never retry.
#[async_trait]
pub trait DirectoryGateway: Send + Sync {
    /// Human-readable name for logs.
    fn display_name(&self) -> &str;

    /// Verify that the directory is reachable and the bind succeeds.
    async fn test_connection(&self) -> LifecycleResult<()>;

    /// Machine accounts of `platform` whose credential was last rotated
    /// before `older_than`.
    async fn query_accounts(
        &self,
        older_than: DateTime<Utc>,
        platform: Platform,
    ) -> LifecycleResult<Vec<AccountRecord>>;

    /// Every container matching `name`. The caller decides what a match count
    /// other than one means.
    async fn resolve_container(&self, name: &str) -> LifecycleResult<Vec<ContainerId>>;

    /// Move `account` into `target`.
    async fn relocate(&self, account: &AccountRecord, target: &str) -> LifecycleResult<()>;

    /// Enable or disable `account`.
    async fn set_enabled(&self, account: &AccountRecord, enabled: bool) -> LifecycleResult<()>;

    /// Remove `account` from the directory.
    async fn remove(&self, account: &AccountRecord) -> LifecycleResult<()>;

    /// Release connections. Called once the pass is over.
    async fn dispose(&self) -> LifecycleResult<()> {
        Ok(())
    }
}
