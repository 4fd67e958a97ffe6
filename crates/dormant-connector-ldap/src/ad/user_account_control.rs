//! `userAccountControl` bitfield

/// Account is disabled.
pub const ACCOUNTDISABLE: u32 = 0x0002;
/// Computer account for a workstation or member server.
pub const WORKSTATION_TRUST_ACCOUNT: u32 = 0x1000;
/// Computer account for a domain controller.
pub const SERVER_TRUST_ACCOUNT: u32 = 0x2000;

/// Parsed `userAccountControl` value. Unknown bits are preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserAccountControl {
    pub value: u32,
}

impl UserAccountControl {
    pub fn from_value(value: u32) -> Self {
        Self { value }
    }

    /// Parse the decimal string form AD returns.
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse::<u32>().ok().map(Self::from_value)
    }

    pub fn is_disabled(&self) -> bool {
        self.value & ACCOUNTDISABLE != 0
    }

    pub fn is_active(&self) -> bool {
        !self.is_disabled()
    }

    pub fn is_domain_controller(&self) -> bool {
        self.value & SERVER_TRUST_ACCOUNT != 0
    }

    #[must_use]
    pub fn disable(self) -> Self {
        Self::from_value(self.value | ACCOUNTDISABLE)
    }

    #[must_use]
    pub fn enable(self) -> Self {
        Self::from_value(self.value & !ACCOUNTDISABLE)
    }

    #[must_use]
    pub fn with_enabled(self, enabled: bool) -> Self {
        if enabled {
            self.enable()
        } else {
            self.disable()
        }
    }
}

impl Default for UserAccountControl {
    fn default() -> Self {
        Self::from_value(WORKSTATION_TRUST_ACCOUNT)
    }
}

impl From<u32> for UserAccountControl {
    fn from(value: u32) -> Self {
        Self::from_value(value)
    }
}

impl From<UserAccountControl> for u32 {
    fn from(uac: UserAccountControl) -> Self {
        uac.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DONT_EXPIRE_PASSWORD: u32 = 0x1_0000;

    #[test]
    fn test_disable_enable_workstation() {
        let initial = UserAccountControl::default();
        assert!(initial.is_active());

        let disabled = initial.disable();
        assert!(disabled.is_disabled());
        assert_eq!(u32::from(disabled), 0x1002);

        let enabled = UserAccountControl::from(0x1002).enable();
        assert!(enabled.is_active());
        assert_eq!(u32::from(enabled), 0x1000);
    }

    #[test]
    fn test_toggle_preserves_other_flags() {
        let uac = UserAccountControl::from(WORKSTATION_TRUST_ACCOUNT | DONT_EXPIRE_PASSWORD);
        let disabled = uac.with_enabled(false);
        assert_eq!(
            u32::from(disabled),
            WORKSTATION_TRUST_ACCOUNT | DONT_EXPIRE_PASSWORD | ACCOUNTDISABLE
        );
        assert_eq!(disabled.with_enabled(true), uac);
    }

    #[test]
    fn test_disable_is_idempotent() {
        let disabled = UserAccountControl::from(0x1002);
        assert_eq!(disabled.disable(), disabled);
    }

    #[test]
    fn test_parse() {
        assert_eq!(UserAccountControl::parse("4096"), Some(UserAccountControl::from(0x1000)));
        assert_eq!(UserAccountControl::parse(" 4098 ").map(|u| u.is_disabled()), Some(true));
        assert!(UserAccountControl::parse("abc").is_none());
        assert!(UserAccountControl::from(0x2000 | ACCOUNTDISABLE).is_domain_controller());
        assert!(!UserAccountControl::default().is_domain_controller());
    }
}
