//! Attribute classification for entry creation.
//!
//! Partitions the caller's generic attribute set into the typed fields the
//! create engine sequences over: name, identifiers, password, account-state
//! flags, group references, and the residual directory-native attributes.
//! Classification is order-independent; precedence between the explicit
//! account-control value and the enable flag is applied after the whole set
//! has been seen.

use tracing::debug;

use castellan_connector::error::{ConnectorError, ConnectorResult};
use castellan_connector::operation::{AttributeSet, AttributeValue, NativeAttribute, Uid};
use castellan_connector::traits::SchemaMapper;
use castellan_connector::types::ObjectKind;

use crate::account_control::UserAccountControl;
use crate::attrs::{self, native, op};

/// The typed outcome of classifying a create attribute set.
#[derive(Debug, Default)]
pub struct ClassifiedCreate {
    /// The mandatory name value (short name or full DN).
    pub name: String,
    /// Common-name override; consumed during DN computation only.
    pub cn_override: Option<String>,
    /// Caller-supplied unique identifier.
    pub uid: Option<Uid>,
    /// Cleartext password for the deferred update.
    pub password: Option<String>,
    /// Explicit userAccountControl value from the input.
    pub explicit_account_control: Option<u32>,
    /// Enable flag; `Some(true)` also covers the present-but-empty case.
    pub enabled: Option<bool>,
    /// "User cannot change password" flag.
    pub cannot_change_password: Option<bool>,
    /// Force a password change at next logon.
    pub force_password_change: bool,
    /// Account lock flag.
    pub locked: bool,
    /// Group membership references, in input order.
    pub groups: Vec<String>,
    /// DN of the primary group.
    pub primary_group_dn: Option<String>,
    /// The classified id attribute (also present in `native`).
    pub id_attribute: Option<NativeAttribute>,
    /// Residual directory-native attributes for entry creation.
    pub native: Vec<NativeAttribute>,
}

impl ClassifiedCreate {
    /// The account-control value the caller intends, if any was expressed.
    ///
    /// An explicit value always wins over the enable flag.
    pub fn intended_account_control(&self) -> Option<UserAccountControl> {
        if let Some(value) = self.explicit_account_control {
            return Some(UserAccountControl::from(value));
        }
        self.enabled
            .map(|enabled| UserAccountControl::new_account(!enabled))
    }

    /// The control value for the deferred update: the intended value, or a
    /// plain normal account when none was ever classified.
    pub fn final_account_control(&self) -> UserAccountControl {
        self.intended_account_control()
            .unwrap_or_else(|| UserAccountControl::new_account(false))
    }
}

/// Classify a create attribute set for the given object kind.
///
/// # Errors
/// `InvalidInput` when the name attribute is missing or empty, or when an
/// explicit account-control value does not parse as an integer.
pub fn classify(
    kind: ObjectKind,
    mut input: AttributeSet,
    mapper: &dyn SchemaMapper,
) -> ConnectorResult<ClassifiedCreate> {
    let name = input
        .remove(op::NAME)
        .as_ref()
        .and_then(first_string)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ConnectorError::invalid_input("no name attribute provided"))?;

    let cn_override = input.remove(op::COMMON_NAME).as_ref().and_then(first_string);

    let uid = input
        .remove(op::UID)
        .as_ref()
        .and_then(first_string)
        .map(Uid::from_value);

    let mut out = ClassifiedCreate {
        name,
        cn_override,
        uid,
        ..ClassifiedCreate::default()
    };

    let id_attr_name = mapper.id_attribute_name(kind).to_string();

    for (attr_name, value) in input.iter() {
        if attr_name.eq_ignore_ascii_case(op::CANNOT_CHANGE_PASSWORD) {
            out.cannot_change_password = first_flag(value);
        } else if attr_name.eq_ignore_ascii_case(op::PRIMARY_GROUP_DN) {
            out.primary_group_dn = first_string(value);
        } else if attr_name.eq_ignore_ascii_case(op::FORCE_PASSWORD_CHANGE) {
            if first_flag(value) == Some(true) {
                out.force_password_change = true;
            }
        } else if attr_name.eq_ignore_ascii_case(op::LOCK_OUT) {
            if first_flag(value) == Some(true) {
                out.locked = true;
            }
        } else if attrs::is_group_membership_attr(attr_name) {
            out.groups = value.as_strings().iter().map(|s| s.to_string()).collect();
        } else if attr_name.eq_ignore_ascii_case(op::PASSWORD) {
            out.password = first_string(value);
        } else if attr_name.eq_ignore_ascii_case(native::USER_ACCOUNT_CONTROL)
            && kind.is_account()
        {
            out.explicit_account_control = parse_account_control(value)?;
        } else if attr_name.eq_ignore_ascii_case(op::ENABLED) && kind.is_account() {
            // Present with no value counts as enabled.
            out.enabled = Some(first_flag(value).unwrap_or(true));
        } else if attr_name.eq_ignore_ascii_case(native::OBJECT_GUID) {
            // Store-generated identifier is output-only; drop silently.
            debug!("ignoring caller-supplied objectGUID");
        } else {
            let encoded = mapper.encode_attribute(kind, attr_name, value);
            if let Some(encoded) = encoded {
                if !encoded.is_empty() {
                    if encoded.is(&id_attr_name) {
                        out.id_attribute = Some(encoded.clone());
                    }
                    out.native.push(encoded);
                }
            }
        }
    }

    // The lock flag becomes the native lockout attribute with the
    // already-elapsed sentinel timestamp.
    if out.locked {
        out.native.push(NativeAttribute::new(
            native::LOCKOUT_TIME,
            attrs::LOCKOUT_TIME_SENTINEL,
        ));
    }

    Ok(out)
}

/// First scalar value as an owned string.
fn first_string(value: &AttributeValue) -> Option<String> {
    match value.first()? {
        AttributeValue::String(s) => Some(s.clone()),
        AttributeValue::Integer(i) => Some(i.to_string()),
        _ => None,
    }
}

/// First scalar value interpreted as a boolean flag.
///
/// Strings parse the way the directory's lenient boolean does: "true"
/// (any case) is true, everything else false.
fn first_flag(value: &AttributeValue) -> Option<bool> {
    match value.first()? {
        AttributeValue::Boolean(b) => Some(*b),
        AttributeValue::String(s) => Some(s.eq_ignore_ascii_case("true")),
        _ => None,
    }
}

/// Parse an explicit userAccountControl value; an empty value list yields
/// `None` (the enable flag then decides).
fn parse_account_control(value: &AttributeValue) -> ConnectorResult<Option<u32>> {
    let Some(first) = value.first() else {
        return Ok(None);
    };
    match first {
        AttributeValue::Integer(i) => u32::try_from(*i).map(Some).map_err(|_| {
            ConnectorError::invalid_input(format!("account-control value out of range: {i}"))
        }),
        AttributeValue::String(s) => s.parse::<u32>().map(Some).map_err(|_| {
            ConnectorError::invalid_input(format!("account-control value not an integer: {s}"))
        }),
        other => Err(ConnectorError::invalid_input(format!(
            "account-control value has unsupported type: {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdConfig;
    use crate::mapping::AdSchemaMapper;

    fn mapper() -> AdSchemaMapper {
        AdSchemaMapper::new(AdConfig::new("h", "DC=example,DC=com", "cn=admin"))
    }

    fn base_input(name: &str) -> AttributeSet {
        AttributeSet::new().with(op::NAME, name)
    }

    #[test]
    fn test_missing_name_is_invalid_input() {
        let err = classify(ObjectKind::Account, AttributeSet::new(), &mapper()).unwrap_err();
        assert!(matches!(err, ConnectorError::InvalidInput { .. }));

        let blank = AttributeSet::new().with(op::NAME, "   ");
        let err = classify(ObjectKind::Account, blank, &mapper()).unwrap_err();
        assert!(matches!(err, ConnectorError::InvalidInput { .. }));
    }

    #[test]
    fn test_cn_override_not_passed_through() {
        let input = base_input("alice").with(op::COMMON_NAME, "Alice Smith");
        let out = classify(ObjectKind::Account, input, &mapper()).unwrap();

        assert_eq!(out.cn_override.as_deref(), Some("Alice Smith"));
        assert!(!out.native.iter().any(|a| a.is(op::COMMON_NAME)));
    }

    #[test]
    fn test_object_guid_ignored_entirely() {
        let input = base_input("alice").with(native::OBJECT_GUID, vec![0u8; 16]);
        let out = classify(ObjectKind::Account, input, &mapper()).unwrap();

        assert!(!out.native.iter().any(|a| a.is(native::OBJECT_GUID)));
        assert!(out.uid.is_none());
    }

    #[test]
    fn test_explicit_control_beats_enable_flag() {
        let input = base_input("alice")
            .with(op::ENABLED, false)
            .with(native::USER_ACCOUNT_CONTROL, "66048");
        let out = classify(ObjectKind::Account, input, &mapper()).unwrap();

        assert_eq!(out.explicit_account_control, Some(66048));
        assert_eq!(
            u32::from(out.intended_account_control().unwrap()),
            66048
        );
    }

    #[test]
    fn test_enable_flag_when_no_explicit_control() {
        let enabled = base_input("alice").with(op::ENABLED, true);
        let out = classify(ObjectKind::Account, enabled, &mapper()).unwrap();
        assert_eq!(
            u32::from(out.intended_account_control().unwrap()),
            UserAccountControl::NORMAL_ACCOUNT
        );

        let disabled = base_input("alice").with(op::ENABLED, false);
        let out = classify(ObjectKind::Account, disabled, &mapper()).unwrap();
        assert_eq!(
            u32::from(out.intended_account_control().unwrap()),
            UserAccountControl::NORMAL_ACCOUNT | UserAccountControl::ACCOUNTDISABLE
        );
    }

    #[test]
    fn test_enable_flag_present_but_empty_counts_enabled() {
        let input = base_input("alice").with(op::ENABLED, AttributeValue::Array(vec![]));
        let out = classify(ObjectKind::Account, input, &mapper()).unwrap();
        assert_eq!(out.enabled, Some(true));
    }

    #[test]
    fn test_no_control_classified() {
        let out = classify(ObjectKind::Account, base_input("alice"), &mapper()).unwrap();
        assert!(out.intended_account_control().is_none());
        assert_eq!(
            u32::from(out.final_account_control()),
            UserAccountControl::NORMAL_ACCOUNT
        );
    }

    #[test]
    fn test_explicit_control_empty_falls_back_to_enable() {
        let input = base_input("alice")
            .with(native::USER_ACCOUNT_CONTROL, AttributeValue::Array(vec![]))
            .with(op::ENABLED, false);
        let out = classify(ObjectKind::Account, input, &mapper()).unwrap();
        assert_eq!(out.explicit_account_control, None);
        assert!(out.intended_account_control().unwrap().is_disabled());
    }

    #[test]
    fn test_explicit_control_unparsable_is_invalid_input() {
        let input = base_input("alice").with(native::USER_ACCOUNT_CONTROL, "not-a-number");
        let err = classify(ObjectKind::Account, input, &mapper()).unwrap_err();
        assert!(matches!(err, ConnectorError::InvalidInput { .. }));
    }

    #[test]
    fn test_control_attrs_pass_through_for_groups() {
        // For non-account kinds the control attributes are not intercepted.
        let input = base_input("devs").with(native::USER_ACCOUNT_CONTROL, "512");
        let out = classify(ObjectKind::Group, input, &mapper()).unwrap();
        assert!(out.explicit_account_control.is_none());
        assert!(out
            .native
            .iter()
            .any(|a| a.is(native::USER_ACCOUNT_CONTROL)));
    }

    #[test]
    fn test_lock_flag_sentinel() {
        let input = base_input("alice").with(op::LOCK_OUT, true);
        let out = classify(ObjectKind::Account, input, &mapper()).unwrap();

        let lockout: Vec<_> = out
            .native
            .iter()
            .filter(|a| a.is(native::LOCKOUT_TIME))
            .collect();
        assert_eq!(lockout.len(), 1);
        assert_eq!(
            lockout[0].values[0].as_string(),
            Some(attrs::LOCKOUT_TIME_SENTINEL)
        );
    }

    #[test]
    fn test_lock_flag_false_sends_nothing() {
        let input = base_input("alice").with(op::LOCK_OUT, false);
        let out = classify(ObjectKind::Account, input, &mapper()).unwrap();
        assert!(!out.native.iter().any(|a| a.is(native::LOCKOUT_TIME)));
    }

    #[test]
    fn test_group_references_collected() {
        let input = base_input("alice").with(
            "LDAPGroups",
            vec!["cn=g1,dc=x".to_string(), "cn=g2,dc=x".to_string()],
        );
        let out = classify(ObjectKind::Account, input, &mapper()).unwrap();
        assert_eq!(out.groups, vec!["cn=g1,dc=x", "cn=g2,dc=x"]);
        assert!(!out.native.iter().any(|a| a.is(op::LDAP_GROUPS)));
    }

    #[test]
    fn test_force_password_change_captured_not_sent() {
        let input = base_input("alice").with(op::FORCE_PASSWORD_CHANGE, true);
        let out = classify(ObjectKind::Account, input, &mapper()).unwrap();
        assert!(out.force_password_change);
        assert!(!out.native.iter().any(|a| a.is(native::PWD_LAST_SET)));
    }

    #[test]
    fn test_residual_attributes_encoded() {
        let input = base_input("alice")
            .with("givenName", "Alice")
            .with("description", AttributeValue::Array(vec![]));
        let out = classify(ObjectKind::Account, input, &mapper()).unwrap();

        assert!(out.native.iter().any(|a| a.is("givenName")));
        // Attributes encoding to empty are dropped, not sent.
        assert!(!out.native.iter().any(|a| a.is("description")));
    }

    #[test]
    fn test_id_attribute_captured_and_passed_through() {
        let input = base_input("alice").with("sAMAccountName", "alice");
        let out = classify(ObjectKind::Account, input, &mapper()).unwrap();

        assert!(out.id_attribute.is_some());
        assert!(out.native.iter().any(|a| a.is("sAMAccountName")));
    }

    #[test]
    fn test_supplied_uid_captured() {
        let input = base_input("alice").with(op::UID, "alice");
        let out = classify(ObjectKind::Account, input, &mapper()).unwrap();
        assert_eq!(out.uid.as_ref().map(|u| u.value()), Some("alice"));
    }
}
