//! Collaborator contracts for the provisioning engine.
//!
//! The create engine never talks to a directory directly; it drives the
//! contracts below. Concrete implementations live in protocol crates
//! (e.g. the AD crate's ldap3-backed `LdapDirectory`), and tests supply
//! in-memory mocks.

use async_trait::async_trait;

use crate::error::ConnectorResult;
use crate::operation::{AttributeSet, AttributeValue, NativeAttribute, Uid};
use crate::types::ObjectKind;

/// Base trait for all connectors.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Get the display name for this connector instance.
    fn display_name(&self) -> &str;

    /// Test the connection to the directory.
    async fn test_connection(&self) -> ConnectorResult<()>;

    /// Dispose of connector resources (close connections, release pools).
    async fn dispose(&self) -> ConnectorResult<()>;
}

/// Transport-level entry operations against the directory.
///
/// One call performs one synchronous directory round-trip; no retries, no
/// caching. Timeouts are whatever the underlying connection enforces.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Create an entry at `dn` with the given native attributes.
    ///
    /// Returns the distinguished name the store assigned to the entry.
    async fn create_entry(
        &self,
        kind: ObjectKind,
        dn: &str,
        attrs: Vec<NativeAttribute>,
    ) -> ConnectorResult<String>;

    /// Replace one attribute of an existing entry.
    async fn modify_entry(
        &self,
        dn: &str,
        attr: &str,
        values: Vec<AttributeValue>,
    ) -> ConnectorResult<()>;

    /// Read a single attribute from an entry.
    ///
    /// Returns `Ok(None)` when the entry exists but the attribute is absent.
    async fn read_attribute(&self, dn: &str, attr: &str)
        -> ConnectorResult<Option<AttributeValue>>;
}

/// Generic-to-native attribute mapping.
///
/// Pure, synchronous: encoding consults only configuration and the value
/// itself, never the directory.
pub trait SchemaMapper: Send + Sync {
    /// Encode one generic attribute into directory-native form.
    ///
    /// Returns `None` when the attribute encodes to nothing and must be
    /// dropped rather than sent.
    fn encode_attribute(
        &self,
        kind: ObjectKind,
        name: &str,
        value: &AttributeValue,
    ) -> Option<NativeAttribute>;

    /// The configured id attribute name for this kind (e.g. sAMAccountName).
    fn id_attribute_name(&self, kind: ObjectKind) -> &str;

    /// The attribute the caller-visible unique identifier is sourced from.
    ///
    /// When this is the store-generated binary identifier, the engine must
    /// reread it after creation; otherwise the identifier is derived via
    /// [`SchemaMapper::derive_unique_id`].
    fn uid_source_attribute(&self, kind: ObjectKind) -> &str;

    /// Derive the unique identifier for an entry from its resolved path.
    fn derive_unique_id(&self, kind: ObjectKind, dn: &str) -> Uid;
}

/// Group-membership writes for a newly created entry.
#[async_trait]
pub trait MembershipOps: Send + Sync {
    /// Add the entry at `entry_dn` to each of the given groups, in order.
    async fn add_memberships(&self, entry_dn: &str, group_dns: &[String]) -> ConnectorResult<()>;
}

/// The generic entry-update operation.
///
/// The create engine reenters this for the deferred password/state update;
/// errors it raises are surfaced unchanged.
#[async_trait]
pub trait UpdateEntry: Send + Sync {
    /// Apply `attrs` to the entry identified by `uid` with replace
    /// semantics. Returns the (possibly unchanged) identifier.
    async fn update(
        &self,
        kind: ObjectKind,
        uid: &Uid,
        attrs: AttributeSet,
    ) -> ConnectorResult<Uid>;
}
