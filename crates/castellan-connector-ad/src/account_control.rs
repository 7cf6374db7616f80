//! userAccountControl bitmask handling.
//!
//! AD encodes account state in a single integer attribute. New accounts are
//! always created `NORMAL_ACCOUNT | ACCOUNTDISABLE`; the intended state is
//! applied by the deferred update once the password has been set, because
//! the directory refuses a password together with an enabled state in the
//! same unauthenticated creation step.

/// Account-control bitmask for an AD account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserAccountControl(u32);

impl UserAccountControl {
    /// Standard account type.
    pub const NORMAL_ACCOUNT: u32 = 0x0200;
    /// The account is disabled.
    pub const ACCOUNTDISABLE: u32 = 0x0002;
    /// The account is locked out.
    pub const LOCKOUT: u32 = 0x0010;
    /// No password is required.
    pub const PASSWD_NOTREQD: u32 = 0x0020;
    /// The password never expires.
    pub const DONT_EXPIRE_PASSWORD: u32 = 0x10000;
    /// A smart card is required for logon.
    pub const SMARTCARD_REQUIRED: u32 = 0x40000;

    /// Control value for a new account: normal, optionally disabled.
    #[must_use]
    pub fn new_account(disabled: bool) -> Self {
        let mut uac = Self::NORMAL_ACCOUNT;
        if disabled {
            uac |= Self::ACCOUNTDISABLE;
        }
        Self(uac)
    }

    /// The forced creation-time value: normal account, disabled.
    #[must_use]
    pub fn creation_value() -> Self {
        Self::new_account(true)
    }

    /// Set the disable bit, preserving all other flags.
    #[must_use]
    pub fn disable(self) -> Self {
        Self(self.0 | Self::ACCOUNTDISABLE)
    }

    /// Clear the disable bit, preserving all other flags.
    #[must_use]
    pub fn enable(self) -> Self {
        Self(self.0 & !Self::ACCOUNTDISABLE)
    }

    /// Whether the disable bit is set.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.0 & Self::ACCOUNTDISABLE != 0
    }

    /// Whether the lockout bit is set.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.0 & Self::LOCKOUT != 0
    }

    /// Whether a given flag is set.
    #[must_use]
    pub fn has(&self, flag: u32) -> bool {
        self.0 & flag != 0
    }

    /// Decimal string form as sent on the wire.
    #[must_use]
    pub fn to_wire(self) -> String {
        self.0.to_string()
    }
}

impl From<u32> for UserAccountControl {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<UserAccountControl> for u32 {
    fn from(uac: UserAccountControl) -> Self {
        uac.0
    }
}

impl std::fmt::Display for UserAccountControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_enabled() {
        let uac = UserAccountControl::new_account(false);
        assert_eq!(u32::from(uac), 0x200);
        assert!(!uac.is_disabled());
    }

    #[test]
    fn test_new_account_disabled() {
        let uac = UserAccountControl::new_account(true);
        assert_eq!(u32::from(uac), 0x202);
        assert!(uac.is_disabled());
    }

    #[test]
    fn test_creation_value_is_disabled() {
        let uac = UserAccountControl::creation_value();
        assert!(uac.is_disabled());
        assert!(uac.has(UserAccountControl::NORMAL_ACCOUNT));
        assert_eq!(uac.to_wire(), "514");
    }

    #[test]
    fn test_disable_enable_roundtrip() {
        let uac = UserAccountControl::from(0x200u32).disable();
        assert!(uac.is_disabled());
        assert_eq!(u32::from(uac), 0x202);

        let back = uac.enable();
        assert!(!back.is_disabled());
        assert_eq!(u32::from(back), 0x200);
    }

    #[test]
    fn test_preserves_other_flags() {
        let uac = UserAccountControl::from(0x200 | 0x10000).disable();
        assert!(uac.has(UserAccountControl::DONT_EXPIRE_PASSWORD));
        assert_eq!(u32::from(uac), 0x200 | 0x2 | 0x10000);

        let enabled = uac.enable();
        assert!(enabled.has(UserAccountControl::DONT_EXPIRE_PASSWORD));
        assert_eq!(u32::from(enabled), 0x200 | 0x10000);
    }

    #[test]
    fn test_lockout_flag() {
        assert!(UserAccountControl::from(0x210u32).is_locked());
        assert!(!UserAccountControl::from(0x200u32).is_locked());
    }
}
