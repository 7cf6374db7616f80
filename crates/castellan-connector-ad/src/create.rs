//! The entry-creation engine.
//!
//! AD cannot apply everything a caller asks for in one atomic add: the
//! password, the real account-control state, group memberships, the primary
//! group and the security descriptor all have to follow the entry into
//! existence as separate round-trips. The engine encodes that sequencing:
//!
//! 1. classify the caller's attribute set;
//! 2. resolve the entry DN;
//! 3. create the entry — accounts always start `NORMAL | ACCOUNTDISABLE`;
//! 4. post-creation steps in fixed order: security descriptor, group
//!    memberships, primaryGroupID;
//! 5. resolve the caller-visible unique identifier (objectGUID reread when
//!    the store generates it);
//! 6. deferred password/state update through the generic update operation.
//!
//! Once the entry exists, a failing step surfaces as an error but the entry
//! is not rolled back: at-least-created semantics, the caller sees which
//! step failed and the entry stays.

use tracing::{debug, info, instrument};

use castellan_connector::error::{ConnectorError, ConnectorResult, CreateStep};
use castellan_connector::operation::{AttributeSet, AttributeValue, NativeAttribute, Uid};
use castellan_connector::traits::{EntryStore, MembershipOps, SchemaMapper, UpdateEntry};
use castellan_connector::types::ObjectKind;

use crate::account_control::UserAccountControl;
use crate::attrs::{native, op, PWD_LAST_SET_EXPIRED};
use crate::classify::{classify, ClassifiedCreate};
use crate::config::AdConfig;
use crate::dn::resolve_entry_dn;
use crate::guid::decode_guid;
use crate::security;

/// The create operation over its collaborator contracts.
///
/// Holds no state beyond borrowed collaborators; one instance serves one
/// call or many, interchangeably.
pub struct AdCreate<'a> {
    config: &'a AdConfig,
    store: &'a dyn EntryStore,
    mapper: &'a dyn SchemaMapper,
    memberships: &'a dyn MembershipOps,
    updater: &'a dyn UpdateEntry,
}

impl<'a> AdCreate<'a> {
    /// Assemble the engine from its collaborators.
    pub fn new(
        config: &'a AdConfig,
        store: &'a dyn EntryStore,
        mapper: &'a dyn SchemaMapper,
        memberships: &'a dyn MembershipOps,
        updater: &'a dyn UpdateEntry,
    ) -> Self {
        Self {
            config,
            store,
            mapper,
            memberships,
            updater,
        }
    }

    /// Create one entry and return its caller-visible unique identifier.
    #[instrument(skip(self, attrs), fields(kind = %kind))]
    pub async fn execute(&self, kind: ObjectKind, attrs: AttributeSet) -> ConnectorResult<Uid> {
        let mut classified = classify(kind, attrs, self.mapper)?;

        let dn = resolve_entry_dn(
            self.config,
            kind,
            &classified.name,
            classified.cn_override.as_deref(),
        )?;

        // A short name doubles as the unique id when none was supplied.
        let name_is_dn = classified.name.contains('=');
        if classified.uid.is_none() && !name_is_dn {
            classified.uid = Some(Uid::from_value(classified.name.clone()));
        }

        // Synthesize the id attribute when the input carried none but an
        // identifier was established.
        if classified.id_attribute.is_none() {
            if let Some(uid) = &classified.uid {
                let id_attr =
                    NativeAttribute::new(self.mapper.id_attribute_name(kind), uid.value());
                classified.native.push(id_attr.clone());
                classified.id_attribute = Some(id_attr);
            }
        }

        let entry_dn = self.create_entry(kind, &dn, &classified).await?;
        info!(dn = %entry_dn, "entry created");

        // Post-creation steps, fixed order; each runs only when its
        // triggering attribute was classified.
        if let Some(cannot_change) = classified.cannot_change_password {
            self.apply_security_descriptor(&entry_dn, cannot_change)
                .await
                .map_err(|e| ConnectorError::post_create_step(CreateStep::SecurityDescriptor, e))?;
        }

        if !classified.groups.is_empty() {
            self.memberships
                .add_memberships(&entry_dn, &classified.groups)
                .await
                .map_err(|e| ConnectorError::post_create_step(CreateStep::GroupMembership, e))?;
        }

        if let Some(group_dn) = classified
            .primary_group_dn
            .as_deref()
            .filter(|s| !s.trim().is_empty())
        {
            self.apply_primary_group(&entry_dn, group_dn)
                .await
                .map_err(|e| ConnectorError::post_create_step(CreateStep::PrimaryGroup, e))?;
        }

        let uid = self.resolve_unique_id(kind, &entry_dn).await?;

        if kind.is_account() && classified.password.is_some() {
            // Errors from the generic update surface unchanged.
            self.finalize_account(kind, &uid, &classified).await?;
        }

        Ok(uid)
    }

    /// Build the native attribute collection and create the entry.
    async fn create_entry(
        &self,
        kind: ObjectKind,
        dn: &str,
        classified: &ClassifiedCreate,
    ) -> ConnectorResult<String> {
        let mut natives = Vec::with_capacity(classified.native.len() + 2);

        natives.push(NativeAttribute::multi(
            native::OBJECT_CLASS,
            self.config
                .object_classes_for(kind)
                .iter()
                .map(|oc| AttributeValue::String(oc.clone()))
                .collect(),
        ));
        natives.extend(classified.native.iter().cloned());

        // Accounts are always created disabled; the intended state is applied
        // by the deferred update once the password is in place.
        if kind.is_account() {
            natives.push(NativeAttribute::new(
                native::USER_ACCOUNT_CONTROL,
                UserAccountControl::creation_value().to_wire(),
            ));
        }

        debug!(dn = %dn, attrs = natives.len(), "creating entry");

        self.store
            .create_entry(kind, dn, natives)
            .await
            .map_err(|e| {
                ConnectorError::create_failed_with_source(
                    format!("directory rejected creation of {dn}"),
                    e,
                )
            })
    }

    /// Patch the entry's security descriptor for the
    /// user-cannot-change-password flag.
    async fn apply_security_descriptor(
        &self,
        entry_dn: &str,
        cannot_change: bool,
    ) -> ConnectorResult<()> {
        let current = self
            .store
            .read_attribute(entry_dn, native::SECURITY_DESCRIPTOR)
            .await?
            .ok_or_else(|| {
                ConnectorError::operation_failed(format!(
                    "{} missing on {entry_dn}",
                    native::SECURITY_DESCRIPTOR
                ))
            })?;

        let raw = current.as_binary().ok_or_else(|| {
            ConnectorError::operation_failed(format!(
                "{} is not binary on {entry_dn}",
                native::SECURITY_DESCRIPTOR
            ))
        })?;

        let patched = security::set_cannot_change_password(raw, cannot_change)?;

        debug!(dn = %entry_dn, cannot_change, "updating security descriptor");
        self.store
            .modify_entry(
                entry_dn,
                native::SECURITY_DESCRIPTOR,
                vec![AttributeValue::Binary(patched)],
            )
            .await
    }

    /// Resolve the primary group's RID and point the entry at it.
    async fn apply_primary_group(&self, entry_dn: &str, group_dn: &str) -> ConnectorResult<()> {
        let sid = self
            .store
            .read_attribute(group_dn, native::OBJECT_SID)
            .await?
            .ok_or_else(|| {
                ConnectorError::operation_failed(format!(
                    "{} missing on {group_dn}",
                    native::OBJECT_SID
                ))
            })?;

        let raw = sid.as_binary().ok_or_else(|| {
            ConnectorError::operation_failed(format!(
                "{} is not binary on {group_dn}",
                native::OBJECT_SID
            ))
        })?;

        let rid = security::rid_from_object_sid(raw)?;

        debug!(dn = %entry_dn, rid, "assigning primary group");
        self.store
            .modify_entry(
                entry_dn,
                native::PRIMARY_GROUP_ID,
                vec![AttributeValue::String(rid.to_string())],
            )
            .await
    }

    /// Determine the caller-visible unique identifier for the new entry.
    ///
    /// GUID-keyed stores assign the identifier at creation; it has to be
    /// reread, and a missing value is fatal to the create.
    async fn resolve_unique_id(&self, kind: ObjectKind, entry_dn: &str) -> ConnectorResult<Uid> {
        if !self
            .mapper
            .uid_source_attribute(kind)
            .eq_ignore_ascii_case(native::OBJECT_GUID)
        {
            return Ok(self.mapper.derive_unique_id(kind, entry_dn));
        }

        let value = self
            .store
            .read_attribute(entry_dn, native::OBJECT_GUID)
            .await
            .map_err(|e| {
                ConnectorError::create_failed_with_source(
                    format!("failed to read {} from {entry_dn}", native::OBJECT_GUID),
                    e,
                )
            })?
            .ok_or_else(|| {
                ConnectorError::create_failed(format!(
                    "{} missing on newly created {entry_dn}",
                    native::OBJECT_GUID
                ))
            })?;

        let raw = value.as_binary().ok_or_else(|| {
            ConnectorError::create_failed(format!(
                "{} is not binary on {entry_dn}",
                native::OBJECT_GUID
            ))
        })?;

        Ok(Uid::new(native::OBJECT_GUID, decode_guid(raw)?))
    }

    /// Deferred password/state update through the generic update operation.
    async fn finalize_account(
        &self,
        kind: ObjectKind,
        uid: &Uid,
        classified: &ClassifiedCreate,
    ) -> ConnectorResult<()> {
        let mut update = AttributeSet::new();

        update.set(
            native::USER_ACCOUNT_CONTROL,
            classified.final_account_control().to_wire(),
        );

        if let Some(password) = &classified.password {
            update.set(op::PASSWORD, password.clone());
        }

        if let Some(id_attr) = &classified.id_attribute {
            let value = if id_attr.values.len() == 1 {
                id_attr.values[0].clone()
            } else {
                AttributeValue::Array(id_attr.values.clone())
            };
            update.set(id_attr.name.clone(), value);
        }

        if classified.force_password_change {
            update.set(native::PWD_LAST_SET, PWD_LAST_SET_EXPIRED);
        }

        debug!(uid = %uid, "applying deferred password/state update");
        self.updater.update(kind, uid, update).await?;
        Ok(())
    }
}
