//! Core enums shared across the provisioning framework.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of directory object being provisioned.
///
/// The kind decides which id attribute is mapped for the entry and which
/// account-control defaults apply at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// A user account.
    Account,
    /// A group.
    Group,
    /// Anything else (organizational units, contacts, ...).
    Other,
}

impl ObjectKind {
    /// All supported object kinds.
    pub fn all() -> &'static [ObjectKind] {
        &[ObjectKind::Account, ObjectKind::Group, ObjectKind::Other]
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Account => "account",
            ObjectKind::Group => "group",
            ObjectKind::Other => "other",
        }
    }

    /// Whether account-control semantics (disabled-at-creation, deferred
    /// password/state update) apply to this kind.
    pub fn is_account(&self) -> bool {
        matches!(self, ObjectKind::Account)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an [`ObjectKind`] from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseObjectKindError(String);

impl fmt::Display for ParseObjectKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown object kind: {}", self.0)
    }
}

impl std::error::Error for ParseObjectKindError {}

impl FromStr for ObjectKind {
    type Err = ParseObjectKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "account" | "user" => Ok(ObjectKind::Account),
            "group" => Ok(ObjectKind::Group),
            "other" => Ok(ObjectKind::Other),
            _ => Err(ParseObjectKindError(s.to_string())),
        }
    }
}
