//! Generic-to-native attribute mapping for AD.

use castellan_connector::operation::{AttributeValue, NativeAttribute, Uid};
use castellan_connector::traits::SchemaMapper;
use castellan_connector::types::ObjectKind;

use crate::config::AdConfig;

/// Config-driven [`SchemaMapper`] for Active Directory.
///
/// Generic attribute names are assumed to already be native AD attribute
/// types (the classifier has consumed every operational name before the
/// residual set reaches this mapper); encoding flattens values to the wire
/// scalars and drops whatever encodes to nothing.
#[derive(Debug, Clone)]
pub struct AdSchemaMapper {
    config: AdConfig,
}

impl AdSchemaMapper {
    /// Create a mapper over the given configuration.
    pub fn new(config: AdConfig) -> Self {
        Self { config }
    }

    /// Flatten a generic value into wire scalars.
    ///
    /// Booleans become the directory's upper-case literals; integers their
    /// decimal form; binary passes through untouched; nulls vanish.
    fn flatten(value: &AttributeValue) -> Vec<AttributeValue> {
        match value {
            AttributeValue::Null => vec![],
            AttributeValue::String(s) => vec![AttributeValue::String(s.clone())],
            AttributeValue::Integer(i) => vec![AttributeValue::String(i.to_string())],
            AttributeValue::Boolean(b) => vec![AttributeValue::String(
                if *b { "TRUE" } else { "FALSE" }.to_string(),
            )],
            AttributeValue::Binary(b) => vec![AttributeValue::Binary(b.clone())],
            AttributeValue::Array(arr) => arr.iter().flat_map(Self::flatten).collect(),
        }
    }
}

impl SchemaMapper for AdSchemaMapper {
    fn encode_attribute(
        &self,
        _kind: ObjectKind,
        name: &str,
        value: &AttributeValue,
    ) -> Option<NativeAttribute> {
        let values = Self::flatten(value);
        if values.is_empty() {
            return None;
        }
        Some(NativeAttribute::multi(name, values))
    }

    fn id_attribute_name(&self, kind: ObjectKind) -> &str {
        self.config.id_attribute_for(kind)
    }

    fn uid_source_attribute(&self, _kind: ObjectKind) -> &str {
        &self.config.uid_attribute
    }

    fn derive_unique_id(&self, _kind: ObjectKind, dn: &str) -> Uid {
        Uid::from_dn(dn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> AdSchemaMapper {
        AdSchemaMapper::new(AdConfig::new("h", "DC=example,DC=com", "cn=admin"))
    }

    #[test]
    fn test_encode_string() {
        let encoded = mapper()
            .encode_attribute(
                ObjectKind::Account,
                "givenName",
                &AttributeValue::String("Alice".to_string()),
            )
            .unwrap();
        assert_eq!(encoded.name, "givenName");
        assert_eq!(encoded.values, vec![AttributeValue::String("Alice".into())]);
    }

    #[test]
    fn test_encode_boolean_and_integer() {
        let b = mapper()
            .encode_attribute(ObjectKind::Account, "x", &AttributeValue::Boolean(true))
            .unwrap();
        assert_eq!(b.values[0].as_string(), Some("TRUE"));

        let i = mapper()
            .encode_attribute(ObjectKind::Account, "x", &AttributeValue::Integer(42))
            .unwrap();
        assert_eq!(i.values[0].as_string(), Some("42"));
    }

    #[test]
    fn test_encode_multi_valued() {
        let value = AttributeValue::Array(vec![
            AttributeValue::String("a".to_string()),
            AttributeValue::String("b".to_string()),
        ]);
        let encoded = mapper()
            .encode_attribute(ObjectKind::Account, "otherMailbox", &value)
            .unwrap();
        assert_eq!(encoded.values.len(), 2);
    }

    #[test]
    fn test_encode_empty_dropped() {
        assert!(mapper()
            .encode_attribute(ObjectKind::Account, "x", &AttributeValue::Null)
            .is_none());
        assert!(mapper()
            .encode_attribute(ObjectKind::Account, "x", &AttributeValue::Array(vec![]))
            .is_none());
    }

    #[test]
    fn test_encode_binary_passthrough() {
        let encoded = mapper()
            .encode_attribute(
                ObjectKind::Account,
                "jpegPhoto",
                &AttributeValue::Binary(vec![1, 2, 3]),
            )
            .unwrap();
        assert_eq!(encoded.values[0].as_binary(), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn test_id_attribute_names() {
        let m = mapper();
        assert_eq!(m.id_attribute_name(ObjectKind::Account), "sAMAccountName");
        assert_eq!(m.id_attribute_name(ObjectKind::Other), "cn");
    }

    #[test]
    fn test_derive_unique_id() {
        let uid = mapper().derive_unique_id(ObjectKind::Account, "CN=a,DC=x");
        assert_eq!(uid.attribute_name(), "dn");
        assert_eq!(uid.value(), "CN=a,DC=x");
    }
}
