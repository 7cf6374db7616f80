//! Provisioning operation types
//!
//! Types flowing through create/update operations: unique identifiers,
//! generic attribute sets, and directory-native attributes.
//!
//! Attribute names are case-insensitive identifiers (LDAP attribute types
//! are matched case-insensitively per RFC 4512). [`AttributeSet`] keys by a
//! lowercased name internally while preserving the first-seen spelling for
//! iteration and wire output.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Unique identifier for an entry in a directory.
///
/// Directories use different identifier schemes: a distinguished name, a
/// store-generated binary id (objectGUID, entryUUID), or a plain id
/// attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Uid {
    /// The attribute name the identifier is drawn from (e.g. "dn",
    /// "objectGUID", "sAMAccountName").
    attribute_name: String,
    /// The identifier value.
    value: String,
}

impl Uid {
    /// Create a new UID with the given attribute name and value.
    pub fn new(attribute_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            value: value.into(),
        }
    }

    /// Create a UID using the default "uid" attribute name.
    pub fn from_value(value: impl Into<String>) -> Self {
        Self::new("uid", value)
    }

    /// Create a UID holding a distinguished name.
    pub fn from_dn(dn: impl Into<String>) -> Self {
        Self::new("dn", dn)
    }

    /// Get the attribute name.
    pub fn attribute_name(&self) -> &str {
        &self.attribute_name
    }

    /// Get the value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for Uid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.attribute_name, self.value)
    }
}

/// A value for an attribute, which may be single or multi-valued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// No value (null).
    Null,
    /// A single string value.
    String(String),
    /// A single integer value.
    Integer(i64),
    /// A single boolean value.
    Boolean(bool),
    /// Binary data (base64 encoded in JSON).
    Binary(Vec<u8>),
    /// Multiple values.
    Array(Vec<AttributeValue>),
}

impl AttributeValue {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// Get as a string if this is a single string value.
    pub fn as_string(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as strings (works for both single and multi-valued).
    pub fn as_strings(&self) -> Vec<&str> {
        match self {
            AttributeValue::String(s) => vec![s.as_str()],
            AttributeValue::Array(arr) => arr.iter().filter_map(|v| v.as_string()).collect(),
            _ => vec![],
        }
    }

    /// Get as an integer if this is an integer value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as a boolean if this is a boolean value.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            AttributeValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as binary if this is a binary value.
    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            AttributeValue::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// The first scalar value, unwrapping a surrounding array.
    ///
    /// Returns `None` for `Null` and for empty arrays; a multi-valued
    /// attribute yields its first element.
    pub fn first(&self) -> Option<&AttributeValue> {
        match self {
            AttributeValue::Null => None,
            AttributeValue::Array(arr) => arr.iter().find(|v| !v.is_null()),
            other => Some(other),
        }
    }

    /// Whether the value carries no usable content (null or empty array).
    pub fn is_empty(&self) -> bool {
        match self {
            AttributeValue::Null => true,
            AttributeValue::Array(arr) => arr.iter().all(|v| v.is_empty()),
            _ => false,
        }
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::String(s)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Integer(i)
    }
}

impl From<i32> for AttributeValue {
    fn from(i: i32) -> Self {
        AttributeValue::Integer(i as i64)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Boolean(b)
    }
}

impl From<Vec<u8>> for AttributeValue {
    fn from(bytes: Vec<u8>) -> Self {
        AttributeValue::Binary(bytes)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(vec: Vec<String>) -> Self {
        AttributeValue::Array(vec.into_iter().map(AttributeValue::String).collect())
    }
}

/// One named attribute with its preserved spelling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Attribute {
    name: String,
    value: AttributeValue,
}

/// A set of generic attributes describing the desired state of one entry.
///
/// Lookup, removal and replacement are case-insensitive on the attribute
/// name; the spelling used at first insertion is preserved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributeSet {
    attributes: HashMap<String, Attribute>,
}

impl AttributeSet {
    /// Create a new empty attribute set.
    pub fn new() -> Self {
        Self {
            attributes: HashMap::new(),
        }
    }

    /// Set an attribute value, replacing any existing value under the same
    /// (case-insensitive) name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        let name = name.into();
        self.attributes.insert(
            name.to_lowercase(),
            Attribute {
                name,
                value: value.into(),
            },
        );
    }

    /// Set an attribute using builder pattern.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Get an attribute value.
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes
            .get(&name.to_lowercase())
            .map(|a| &a.value)
    }

    /// Get a single-valued string attribute.
    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.as_string())
    }

    /// Check if an attribute exists.
    pub fn has(&self, name: &str) -> bool {
        self.attributes.contains_key(&name.to_lowercase())
    }

    /// Remove an attribute, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        self.attributes
            .remove(&name.to_lowercase())
            .map(|a| a.value)
    }

    /// Get the number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Iterate over all attributes as (preserved name, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.attributes.values().map(|a| (a.name.as_str(), &a.value))
    }
}

impl FromIterator<(String, AttributeValue)> for AttributeSet {
    fn from_iter<T: IntoIterator<Item = (String, AttributeValue)>>(iter: T) -> Self {
        let mut set = Self::new();
        for (name, value) in iter {
            set.set(name, value);
        }
        set
    }
}

/// A directory-native attribute ready to be sent on the wire: an exact
/// attribute type name plus its scalar values.
///
/// Produced by the schema-mapping layer; an attribute whose encoding yields
/// no values is dropped rather than sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeAttribute {
    /// Directory attribute type name (exact spelling).
    pub name: String,
    /// Scalar values (strings or binary).
    pub values: Vec<AttributeValue>,
}

impl NativeAttribute {
    /// Create a single-valued native attribute.
    pub fn new(name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self {
            name: name.into(),
            values: vec![value.into()],
        }
    }

    /// Create a multi-valued native attribute.
    pub fn multi(name: impl Into<String>, values: Vec<AttributeValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Whether the attribute carries no values and must not be sent.
    pub fn is_empty(&self) -> bool {
        self.values.iter().all(|v| v.is_empty())
    }

    /// Case-insensitive name comparison.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}
