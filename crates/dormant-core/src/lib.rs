//! # Dormant machine-account lifecycle
//!
//! Finds machine accounts in a directory whose credentials have not been
//! rotated for a configurable number of days and moves each one through a
//! staged lifecycle:
//!
//! ```text
//! active -> review -> relocated -> disabled -> removed
//! ```
//!
//! The engine is protocol-agnostic. Directory access goes through a
//! [`DirectoryGateway`] implementation and results leave through one or more
//! [`ReportSink`]s.
//!
//! ## Example
//!
//! ```ignore
//! use dormant_core::prelude::*;
//!
//! let orchestrator = LifecycleOrchestrator::new(gateway);
//! let config = LifecycleConfig::new("Stale Computers")
//!     .with_dry_run(DryRun::all());
//!
//! let mut result = orchestrator.run_pass(&config).await?;
//! publish(&mut result, &sinks).await;
//! ```
//!
//! ## Crate Organization
//!
//! - [`account`] - Account snapshots, platform classification, DN helpers
//! - [`threshold`] - Threshold days and resolved comparison dates
//! - [`exemption`] - Glob exemption rules and the review/ignore partition
//! - [`classifier`] - Per-transition eligibility
//! - [`executor`] - Applies transitions through the gateway
//! - [`orchestrator`] - Sequences a full pass
//! - [`report`] - Pass results and the [`ReportSink`] boundary
//! - [`gateway`] - The [`DirectoryGateway`] capability
//! - [`config`] - Lifecycle settings
//! - [`error`] - Error types with fatal/recoverable classification

pub mod account;
pub mod classifier;
pub mod config;
pub mod error;
pub mod executor;
pub mod exemption;
pub mod gateway;
pub mod orchestrator;
pub mod report;
pub mod threshold;

pub use account::{AccountRecord, Platform};
pub use config::{DryRun, LifecycleConfig};
pub use error::{LifecycleError, LifecycleResult};
pub use gateway::DirectoryGateway;
pub use orchestrator::{publish, LifecycleOrchestrator};
pub use report::{PassResult, ReportSink};

/// Prelude module for convenient imports.
///
/// ```
/// use dormant_core::prelude::*;
/// ```
pub mod prelude {
    // Accounts
    pub use crate::account::{dn_eq, parent_dn, AccountRecord, Platform};

    // Error handling
    pub use crate::error::{LifecycleError, LifecycleResult};

    // Traits
    pub use crate::gateway::{ContainerId, DirectoryGateway};
    pub use crate::report::ReportSink;

    // Configuration
    pub use crate::config::{DryRun, LifecycleConfig};
    pub use crate::exemption::{ExemptionConfig, ExemptionReason, ExemptionRules};
    pub use crate::threshold::{ThresholdDays, ThresholdSet};

    // Classification and execution
    pub use crate::classifier::{Eligibility, SkipReason, Transition, TransitionKind};
    pub use crate::executor::{ExecutionReport, TransitionExecutor};
    pub use crate::orchestrator::{publish, LifecycleOrchestrator};

    // Results
    pub use crate::report::{
        Diagnostic, MutationFailure, PassCounts, PassResult, PlatformReport, ReportEntry,
        TransitionOutcome,
    };

    // Re-export async_trait for gateway and sink implementations
    pub use async_trait::async_trait;
}
