//! Computer object mapping
//!
//! Builds LDAP filters for stale computer accounts and maps search entries
//! to [`AccountRecord`] snapshots.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use dormant_core::account::{parent_dn, split_dn, AccountRecord, Platform};
use dormant_core::error::{LifecycleError, LifecycleResult};

use super::time::{parse_filetime, parse_generalized_time, to_filetime};
use super::user_account_control::{UserAccountControl, SERVER_TRUST_ACCOUNT};

/// LDAP_MATCHING_RULE_BIT_AND
const MATCHING_RULE_BIT_AND: &str = "1.2.840.113556.1.4.803";

/// Attributes requested for every computer search.
pub fn computer_attributes() -> Vec<&'static str> {
    vec![
        "cn",
        "description",
        "operatingSystem",
        "pwdLastSet",
        "userAccountControl",
        "managedBy",
        "whenCreated",
        "whenChanged",
    ]
}

/// Filter for computer accounts of `platform` whose password was last set
/// strictly before `older_than`. Accounts that never set a password
/// (`pwdLastSet=0`) and domain controllers are excluded.
pub fn stale_computer_filter(older_than: DateTime<Utc>, platform: Platform) -> String {
    let cutoff = to_filetime(older_than) - 1;
    let os_clause = match platform {
        Platform::Windows => "(operatingSystem=*Windows*)",
        Platform::NonWindows => "(!(operatingSystem=*Windows*))",
    };
    format!(
        "(&(objectCategory=computer)(!(userAccountControl:{}:={}))(pwdLastSet>=1)(pwdLastSet<={}){})",
        MATCHING_RULE_BIT_AND, SERVER_TRUST_ACCOUNT, cutoff, os_clause
    )
}

/// Filter for an organizational unit named `name`.
pub fn organizational_unit_filter(name: &str) -> String {
    format!(
        "(&(objectClass=organizationalUnit)(ou={}))",
        escape_ldap_value(name)
    )
}

/// Escape special characters in LDAP filter values (RFC 4515).
pub fn escape_ldap_value(value: &str) -> String {
    value
        .replace('\\', "\\5c")
        .replace('*', "\\2a")
        .replace('(', "\\28")
        .replace(')', "\\29")
        .replace('\0', "\\00")
}

/// Value of the first RDN of `dn` (`"CN=PC01,OU=x"` -> `"PC01"`).
pub fn rdn_value(dn: &str) -> &str {
    let rdn = split_dn(dn).0;
    rdn.split_once('=').map_or(rdn, |(_, value)| value.trim())
}

fn first<'a>(attrs: &'a HashMap<String, Vec<String>>, name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .and_then(|(_, values)| values.first())
        .map(String::as_str)
}

/// Whether the entry is a domain controller. These are never lifecycle
/// candidates, even if the search filter let one through.
pub fn is_domain_controller_entry(attrs: &HashMap<String, Vec<String>>) -> bool {
    first(attrs, "userAccountControl")
        .and_then(UserAccountControl::parse)
        .is_some_and(|uac| uac.is_domain_controller())
}

/// Map a computer search entry to an account snapshot.
///
/// A missing or unparseable `pwdLastSet` is an error; the caller decides
/// whether to skip the entry. Every other attribute is optional.
pub fn account_from_entry(
    dn: &str,
    attrs: &HashMap<String, Vec<String>>,
) -> LifecycleResult<AccountRecord> {
    let credential_last_set = first(attrs, "pwdLastSet")
        .and_then(parse_filetime)
        .ok_or_else(|| LifecycleError::InvalidData {
            message: format!("missing or invalid pwdLastSet on {}", dn),
        })?;

    let uac = first(attrs, "userAccountControl")
        .and_then(UserAccountControl::parse)
        .unwrap_or_default();

    let name = first(attrs, "cn").unwrap_or_else(|| rdn_value(dn));

    Ok(AccountRecord {
        name: name.to_string(),
        distinguished_name: dn.to_string(),
        credential_last_set,
        enabled: uac.is_active(),
        description: first(attrs, "description").map(str::to_string),
        operating_system: first(attrs, "operatingSystem").map(str::to_string),
        container: parent_dn(dn).to_string(),
        owner: first(attrs, "managedBy").map(|owner| rdn_value(owner).to_string()),
        created: first(attrs, "whenCreated").and_then(parse_generalized_time),
        modified: first(attrs, "whenChanged").and_then(parse_generalized_time),
    })
}
