//! Distinguished-name handling: structural validation, RFC 4514 value
//! escaping, and resolution of the entry DN for a create operation.

use tracing::debug;

use castellan_connector::error::{ConnectorError, ConnectorResult};
use castellan_connector::types::ObjectKind;

use crate::config::AdConfig;

/// One relative distinguished name component: attribute type and raw value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rdn {
    pub attribute: String,
    pub value: String,
}

/// Whether a string parses as a structurally valid DN.
pub fn is_dn(value: &str) -> bool {
    parse_dn(value).is_ok()
}

/// Parse a DN into its RDN components.
///
/// Splits on unescaped commas; each component must be `type=value` with a
/// valid attribute type (descriptor or numeric OID). Escaped characters in
/// values are kept as written.
pub fn parse_dn(value: &str) -> ConnectorResult<Vec<Rdn>> {
    if value.trim().is_empty() {
        return Err(ConnectorError::InvalidDn {
            value: value.to_string(),
        });
    }

    let mut rdns = Vec::new();
    for component in split_unescaped(value, ',') {
        let component = component.trim();
        let (attr, val) = split_rdn(component).ok_or_else(|| ConnectorError::InvalidDn {
            value: value.to_string(),
        })?;

        if !is_valid_attribute_type(attr) {
            return Err(ConnectorError::InvalidDn {
                value: value.to_string(),
            });
        }

        rdns.push(Rdn {
            attribute: attr.to_string(),
            value: val.to_string(),
        });
    }

    Ok(rdns)
}

/// Split a string on a separator, honoring backslash escapes.
fn split_unescaped(value: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escaped = false;

    for ch in value.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
        } else if ch == '\\' {
            current.push(ch);
            escaped = true;
        } else if ch == sep {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    parts.push(current);
    parts
}

/// Split one RDN component at its first unescaped '='.
fn split_rdn(component: &str) -> Option<(&str, &str)> {
    let mut escaped = false;
    for (i, ch) in component.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == '=' {
            let attr = component[..i].trim();
            let value = &component[i + 1..];
            if attr.is_empty() || value.is_empty() {
                return None;
            }
            return Some((attr, value));
        }
    }
    None
}

/// An attribute type is a descriptor (letter, then letters/digits/hyphens)
/// or a numeric OID.
fn is_valid_attribute_type(attr: &str) -> bool {
    let mut chars = attr.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
        }
        Some(c) if c.is_ascii_digit() => attr
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.'),
        _ => false,
    }
}

/// Escape special characters in a DN attribute value per RFC 4514.
///
/// Always escaped: `, + " \ < > ; =`. NUL is hex-escaped. Space needs
/// escaping only at the start or end, `#` only at the start.
pub fn escape_dn_value(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }

    let char_count = value.chars().count();
    let mut result = String::with_capacity(value.len() * 2);

    for (i, ch) in value.chars().enumerate() {
        let is_first = i == 0;
        let is_last = i == char_count - 1;

        match ch {
            ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=' => {
                result.push('\\');
                result.push(ch);
            }
            '\0' => {
                result.push_str("\\00");
            }
            ' ' if is_first || is_last => {
                result.push_str("\\20");
            }
            '#' if is_first => {
                result.push_str("\\23");
            }
            _ => {
                result.push(ch);
            }
        }
    }

    result
}

/// The naming attribute used for computed RDNs. Accounts, groups and other
/// entries are all CN-named in AD containers.
fn naming_attribute(_kind: ObjectKind) -> &'static str {
    "CN"
}

/// Resolve the entry DN for a create operation.
///
/// A name that already parses as a DN is used verbatim. Otherwise the RDN is
/// built from the common-name override (if supplied) or the name itself,
/// escaped, and combined with the configured container for the kind.
///
/// # Errors
/// `InvalidDn` when the supplied or computed value is not structurally valid.
pub fn resolve_entry_dn(
    config: &AdConfig,
    kind: ObjectKind,
    name: &str,
    cn_override: Option<&str>,
) -> ConnectorResult<String> {
    // A name carrying '=' is a path, not a short name; it must parse.
    if name.contains('=') {
        parse_dn(name)?;
        debug!(dn = %name, "using caller-supplied DN verbatim");
        return Ok(name.to_string());
    }

    let rdn_value = cn_override.unwrap_or(name);
    if rdn_value.trim().is_empty() {
        return Err(ConnectorError::InvalidDn {
            value: rdn_value.to_string(),
        });
    }

    let dn = format!(
        "{}={},{}",
        naming_attribute(kind),
        escape_dn_value(rdn_value),
        config.container_for(kind)
    );

    // The computed value must itself be a valid DN; a malformed container
    // configuration surfaces here rather than at the directory.
    parse_dn(&dn)?;

    debug!(dn = %dn, "computed entry DN");
    Ok(dn)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AdConfig {
        AdConfig::new("dc01", "DC=example,DC=com", "cn=admin").with_user_container("CN=Users")
    }

    #[test]
    fn test_is_dn() {
        assert!(is_dn("cn=bob,ou=people,dc=x"));
        assert!(is_dn("CN=Doe\\, John,OU=Users,DC=example,DC=com"));
        assert!(is_dn("0.9.2342.19200300.100.1.1=bob,dc=x"));
        assert!(!is_dn("alice"));
        assert!(!is_dn(""));
        assert!(!is_dn("cn=,dc=x"));
        assert!(!is_dn("=value,dc=x"));
        assert!(!is_dn("cn=a,,dc=x"));
    }

    #[test]
    fn test_parse_dn_components() {
        let rdns = parse_dn("CN=Alice,OU=People,DC=example,DC=com").unwrap();
        assert_eq!(rdns.len(), 4);
        assert_eq!(rdns[0].attribute, "CN");
        assert_eq!(rdns[0].value, "Alice");
        assert_eq!(rdns[3].attribute, "DC");
        assert_eq!(rdns[3].value, "com");
    }

    #[test]
    fn test_parse_dn_escaped_comma() {
        let rdns = parse_dn("CN=Doe\\, John,DC=example,DC=com").unwrap();
        assert_eq!(rdns.len(), 3);
        assert_eq!(rdns[0].value, "Doe\\, John");
    }

    #[test]
    fn test_escape_dn_value_simple() {
        assert_eq!(escape_dn_value("John Doe"), "John Doe");
        assert_eq!(escape_dn_value(""), "");
    }

    #[test]
    fn test_escape_dn_value_special_chars() {
        assert_eq!(escape_dn_value("a,b"), "a\\,b");
        assert_eq!(escape_dn_value("a+b"), "a\\+b");
        assert_eq!(escape_dn_value("a\"b"), "a\\\"b");
        assert_eq!(escape_dn_value("a\\b"), "a\\\\b");
        assert_eq!(escape_dn_value("a<b"), "a\\<b");
        assert_eq!(escape_dn_value("a>b"), "a\\>b");
        assert_eq!(escape_dn_value("a;b"), "a\\;b");
        assert_eq!(escape_dn_value("a=b"), "a\\=b");
        assert_eq!(escape_dn_value("a\0b"), "a\\00b");
    }

    #[test]
    fn test_escape_dn_value_positional() {
        assert_eq!(escape_dn_value(" admin"), "\\20admin");
        assert_eq!(escape_dn_value("admin "), "admin\\20");
        assert_eq!(escape_dn_value("#admin"), "\\23admin");
        assert_eq!(escape_dn_value("admin#1"), "admin#1");
        assert_eq!(escape_dn_value("John Doe"), "John Doe");
    }

    #[test]
    fn test_escape_dn_injection_attempt() {
        assert_eq!(
            escape_dn_value("admin,dc=evil,dc=com"),
            "admin\\,dc\\=evil\\,dc\\=com"
        );
    }

    #[test]
    fn test_resolve_full_dn_passthrough() {
        let dn = resolve_entry_dn(
            &config(),
            ObjectKind::Account,
            "cn=bob,ou=people,dc=x",
            None,
        )
        .unwrap();
        assert_eq!(dn, "cn=bob,ou=people,dc=x");
    }

    #[test]
    fn test_resolve_short_name() {
        let dn = resolve_entry_dn(&config(), ObjectKind::Account, "alice", None).unwrap();
        assert_eq!(dn, "CN=alice,CN=Users,DC=example,DC=com");
    }

    #[test]
    fn test_resolve_short_name_with_cn_override() {
        let dn =
            resolve_entry_dn(&config(), ObjectKind::Account, "alice", Some("Alice Smith")).unwrap();
        assert_eq!(dn, "CN=Alice Smith,CN=Users,DC=example,DC=com");
    }

    #[test]
    fn test_resolve_escapes_rdn() {
        let dn = resolve_entry_dn(&config(), ObjectKind::Account, "Doe, John", None).unwrap();
        assert_eq!(dn, "CN=Doe\\, John,CN=Users,DC=example,DC=com");
    }

    #[test]
    fn test_resolve_group_container() {
        let cfg = config().with_group_container("OU=Groups");
        let dn = resolve_entry_dn(&cfg, ObjectKind::Group, "devs", None).unwrap();
        assert_eq!(dn, "CN=devs,OU=Groups,DC=example,DC=com");
    }

    #[test]
    fn test_resolve_empty_name_fails() {
        let err = resolve_entry_dn(&config(), ObjectKind::Account, "  ", None).unwrap_err();
        assert!(matches!(
            err,
            castellan_connector::error::ConnectorError::InvalidDn { .. }
        ));
    }

    #[test]
    fn test_resolve_malformed_dn_fails() {
        // Contains '=' so it is treated as a DN attempt, but does not parse.
        let err =
            resolve_entry_dn(&config(), ObjectKind::Account, "cn=a,,dc=x", None).unwrap_err();
        assert!(matches!(
            err,
            castellan_connector::error::ConnectorError::InvalidDn { .. }
        ));
    }
}
