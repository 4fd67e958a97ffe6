//! Active Directory specific modules
//!
//! - computer filters and entry mapping
//! - FILETIME and GeneralizedTime parsing
//! - userAccountControl bitfield handling

pub mod computer;
pub mod time;
pub mod user_account_control;

pub use computer::{
    account_from_entry, computer_attributes, escape_ldap_value, is_domain_controller_entry,
    organizational_unit_filter, stale_computer_filter,
};
pub use user_account_control::UserAccountControl;
