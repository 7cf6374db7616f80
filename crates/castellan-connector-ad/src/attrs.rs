//! Attribute vocabulary for the AD provisioning engine.
//!
//! Two name spaces meet in the classifier: the generic, schema-agnostic
//! operational names callers put in an [`AttributeSet`], and the native AD
//! attribute types the engine emits on the wire. Both are matched
//! case-insensitively.
//!
//! [`AttributeSet`]: castellan_connector::operation::AttributeSet

/// Generic operational attribute names recognized in caller input.
pub mod op {
    /// Mandatory entry name (short name or full DN).
    pub const NAME: &str = "name";

    /// Caller-supplied unique identifier.
    pub const UID: &str = "uid";

    /// Common-name override: used only while computing the entry DN, never
    /// sent to the directory.
    pub const COMMON_NAME: &str = "commonName";

    /// Cleartext password for the deferred password/state update.
    pub const PASSWORD: &str = "password";

    /// Enable/disable boolean; consulted only when no explicit
    /// userAccountControl value is supplied.
    pub const ENABLED: &str = "enabled";

    /// "User cannot change password" boolean (security-descriptor bit).
    pub const CANNOT_CHANGE_PASSWORD: &str = "cannotChangePassword";

    /// Force a password change at next logon.
    pub const FORCE_PASSWORD_CHANGE: &str = "forcePasswordChange";

    /// Account lock boolean.
    pub const LOCK_OUT: &str = "lockOut";

    /// DN of the account's primary group.
    pub const PRIMARY_GROUP_DN: &str = "primaryGroupDn";

    /// Multi-valued list of group DNs the entry should be a member of.
    pub const LDAP_GROUPS: &str = "ldapGroups";
}

/// Native AD attribute type names.
pub mod native {
    /// Account-control bitmask.
    pub const USER_ACCOUNT_CONTROL: &str = "userAccountControl";

    /// Store-generated binary identifier; output-only, never accepted from
    /// caller input.
    pub const OBJECT_GUID: &str = "objectGUID";

    /// Binary security identifier.
    pub const OBJECT_SID: &str = "objectSid";

    /// Entry security descriptor.
    pub const SECURITY_DESCRIPTOR: &str = "nTSecurityDescriptor";

    /// Lockout timestamp (FILETIME).
    pub const LOCKOUT_TIME: &str = "lockoutTime";

    /// Password-last-set timestamp; 0 forces a change at next logon.
    pub const PWD_LAST_SET: &str = "pwdLastSet";

    /// Password attribute (quoted UTF-16LE over LDAPS only).
    pub const UNICODE_PWD: &str = "unicodePwd";

    /// Group membership attribute on group entries.
    pub const MEMBER: &str = "member";

    /// RID of the account's primary group.
    pub const PRIMARY_GROUP_ID: &str = "primaryGroupID";

    /// Structural class attribute.
    pub const OBJECT_CLASS: &str = "objectClass";
}

/// Sentinel written to lockoutTime for a locked account: a non-zero FILETIME
/// far in the past, so the lockout window always reads as already elapsed.
pub const LOCKOUT_TIME_SENTINEL: &str = "1";

/// pwdLastSet value that forces a password change at next logon.
pub const PWD_LAST_SET_EXPIRED: &str = "0";

/// Whether an attribute name designates the group-membership reference list.
///
/// A name predicate rather than an exact literal: matching ignores case, so
/// `ldapgroups`, `LDAPGroups` and the canonical spelling all classify.
pub fn is_group_membership_attr(name: &str) -> bool {
    name.eq_ignore_ascii_case(op::LDAP_GROUPS)
}
