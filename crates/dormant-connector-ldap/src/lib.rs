//! # LDAP Gateway
//!
//! Active Directory implementation of the lifecycle
//! [`DirectoryGateway`](dormant_core::gateway::DirectoryGateway).
//!
//! ## Features
//!
//! - SSL/TLS and STARTTLS
//! - Paged computer searches split by operating system
//! - `pwdLastSet` (FILETIME) based staleness
//! - Move via modify-DN, disable via `userAccountControl`
//! - Tree delete for accounts with leaf children
//!
//! ## Example
//!
//! ```ignore
//! use dormant_connector_ldap::{LdapConfig, LdapConnector};
//! use dormant_core::prelude::*;
//!
//! let config = LdapConfig::new(
//!     "dc01.example.com",
//!     "DC=example,DC=com",
//!     "CN=svc-dormant,OU=Service,DC=example,DC=com",
//! )
//! .with_password("secret")
//! .with_ssl();
//!
//! let connector = LdapConnector::new(config)?;
//! connector.test_connection().await?;
//! ```

pub mod ad;
pub mod config;
pub mod connector;

// Re-exports
pub use config::LdapConfig;
pub use connector::LdapConnector;
