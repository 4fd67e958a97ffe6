//! Shared test fixtures for lifecycle integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use dormant_core::account::{dn_eq, AccountRecord, Platform};
use dormant_core::classifier::TransitionKind;
use dormant_core::error::{LifecycleError, LifecycleResult};
use dormant_core::gateway::{ContainerId, DirectoryGateway};
use dormant_core::report::{PassResult, ReportSink};

pub const BASE_DN: &str = "DC=example,DC=com";
pub const WORKSTATIONS: &str = "OU=Workstations,DC=example,DC=com";
pub const SERVERS: &str = "OU=Servers,DC=example,DC=com";
pub const HOLDING: &str = "OU=Stale Computers,DC=example,DC=com";
pub const HOLDING_NAME: &str = "Stale Computers";

/// Fixed clock for every pass in the tests.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn aged(days: i64) -> DateTime<Utc> {
    now() - Duration::days(days)
}

pub fn windows(name: &str, container: &str, days: i64) -> AccountRecord {
    AccountRecord::new(name, container, aged(days)).with_operating_system("Windows 10 Enterprise")
}

pub fn linux(name: &str, container: &str, days: i64) -> AccountRecord {
    AccountRecord::new(name, container, aged(days)).with_operating_system("Ubuntu 22.04")
}

/// In-memory directory that applies mutations to its own state.
pub struct InMemoryGateway {
    name: String,
    accounts: Mutex<Vec<AccountRecord>>,
    containers: Mutex<Vec<ContainerId>>,
    failing: Mutex<HashSet<(String, TransitionKind)>>,
    query_error: AtomicBool,
    query_calls: AtomicUsize,
    resolve_calls: AtomicUsize,
    relocate_calls: AtomicUsize,
    set_enabled_calls: AtomicUsize,
    remove_calls: AtomicUsize,
    mutation_log: Mutex<Vec<(TransitionKind, String)>>,
}

impl InMemoryGateway {
    #[must_use]
    pub fn new(accounts: Vec<AccountRecord>) -> Self {
        Self {
            name: "in-memory".to_string(),
            accounts: Mutex::new(accounts),
            containers: Mutex::new(vec![HOLDING.to_string()]),
            failing: Mutex::new(HashSet::new()),
            query_error: AtomicBool::new(false),
            query_calls: AtomicUsize::new(0),
            resolve_calls: AtomicUsize::new(0),
            relocate_calls: AtomicUsize::new(0),
            set_enabled_calls: AtomicUsize::new(0),
            remove_calls: AtomicUsize::new(0),
            mutation_log: Mutex::new(Vec::new()),
        }
    }

    /// Containers returned for every holding-location lookup.
    pub fn with_containers(self, containers: &[&str]) -> Self {
        *self.containers.lock().unwrap() = containers.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Make `kind` fail for the account named `name`.
    pub fn with_failure(self, name: &str, kind: TransitionKind) -> Self {
        self.failing
            .lock()
            .unwrap()
            .insert((name.to_string(), kind));
        self
    }

    pub fn with_query_error(self) -> Self {
        self.query_error.store(true, Ordering::SeqCst);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn relocate_calls(&self) -> usize {
        self.relocate_calls.load(Ordering::SeqCst)
    }

    pub fn set_enabled_calls(&self) -> usize {
        self.set_enabled_calls.load(Ordering::SeqCst)
    }

    pub fn remove_calls(&self) -> usize {
        self.remove_calls.load(Ordering::SeqCst)
    }

    pub fn mutation_calls(&self) -> usize {
        self.relocate_calls() + self.set_enabled_calls() + self.remove_calls()
    }

    /// Mutations in the order they were attempted.
    pub fn mutation_log(&self) -> Vec<(TransitionKind, String)> {
        self.mutation_log.lock().unwrap().clone()
    }

    pub fn account(&self, name: &str) -> Option<AccountRecord> {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.name == name)
            .cloned()
    }

    fn attempt(&self, account: &AccountRecord, kind: TransitionKind) -> LifecycleResult<()> {
        self.mutation_log
            .lock()
            .unwrap()
            .push((kind, account.name.clone()));

        if self
            .failing
            .lock()
            .unwrap()
            .contains(&(account.name.clone(), kind))
        {
            return Err(LifecycleError::InsufficientAccess {
                operation: kind.to_string(),
                identifier: account.distinguished_name.clone(),
            });
        }
        Ok(())
    }

    fn update<F>(&self, account: &AccountRecord, f: F) -> LifecycleResult<()>
    where
        F: FnOnce(&mut AccountRecord),
    {
        let mut accounts = self.accounts.lock().unwrap();
        let stored = accounts
            .iter_mut()
            .find(|a| dn_eq(&a.distinguished_name, &account.distinguished_name))
            .ok_or_else(|| LifecycleError::ObjectNotFound {
                identifier: account.distinguished_name.clone(),
            })?;
        f(stored);
        Ok(())
    }
}

#[async_trait]
impl DirectoryGateway for InMemoryGateway {
    fn display_name(&self) -> &str {
        &self.name
    }

    async fn test_connection(&self) -> LifecycleResult<()> {
        Ok(())
    }

    async fn query_accounts(
        &self,
        older_than: DateTime<Utc>,
        platform: Platform,
    ) -> LifecycleResult<Vec<AccountRecord>> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        if self.query_error.load(Ordering::SeqCst) {
            return Err(LifecycleError::connection_failed("server down"));
        }

        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.credential_last_set < older_than && a.platform() == platform)
            .cloned()
            .collect())
    }

    async fn resolve_container(&self, _name: &str) -> LifecycleResult<Vec<ContainerId>> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.containers.lock().unwrap().clone())
    }

    async fn relocate(&self, account: &AccountRecord, target: &str) -> LifecycleResult<()> {
        self.relocate_calls.fetch_add(1, Ordering::SeqCst);
        self.attempt(account, TransitionKind::Move)?;
        self.update(account, |a| {
            a.distinguished_name = format!("{},{}", a.rdn(), target);
            a.container = target.to_string();
        })
    }

    async fn set_enabled(&self, account: &AccountRecord, enabled: bool) -> LifecycleResult<()> {
        self.set_enabled_calls.fetch_add(1, Ordering::SeqCst);
        self.attempt(account, TransitionKind::Disable)?;
        self.update(account, |a| a.enabled = enabled)
    }

    async fn remove(&self, account: &AccountRecord) -> LifecycleResult<()> {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);
        self.attempt(account, TransitionKind::Delete)?;
        let mut accounts = self.accounts.lock().unwrap();
        let before = accounts.len();
        accounts.retain(|a| !dn_eq(&a.distinguished_name, &account.distinguished_name));
        if accounts.len() == before {
            return Err(LifecycleError::ObjectNotFound {
                identifier: account.distinguished_name.clone(),
            });
        }
        Ok(())
    }
}

/// Sink that records deliveries, optionally failing each one.
pub struct RecordingSink {
    name: String,
    fail: bool,
    delivered: AtomicUsize,
}

impl RecordingSink {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fail: false,
            delivered: AtomicUsize::new(0),
        }
    }

    pub fn failing(name: &str) -> Self {
        Self {
            fail: true,
            ..Self::new(name)
        }
    }

    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReportSink for RecordingSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn publish(&self, _result: &PassResult) -> LifecycleResult<()> {
        if self.fail {
            return Err(LifecycleError::ReportDelivery {
                sink: self.name.clone(),
                message: "connection refused".to_string(),
            });
        }
        self.delivered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
