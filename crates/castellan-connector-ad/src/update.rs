//! The generic entry-update operation.
//!
//! Replace-semantics update of an existing entry, addressed by any of the
//! identifier forms the engine produces. The create engine reenters this
//! operation for its deferred password/state update.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use ldap3::Mod;
use tracing::{debug, instrument};

use castellan_connector::error::ConnectorResult;
use castellan_connector::operation::{AttributeSet, AttributeValue, Uid};
use castellan_connector::traits::{SchemaMapper, UpdateEntry};
use castellan_connector::types::ObjectKind;

use crate::attrs::{native, op};
use crate::directory::LdapDirectory;
use crate::mapping::AdSchemaMapper;
use crate::password::{encode_password, validate_password_connection};

/// Replace-semantics updates over the directory transport.
pub struct AdUpdate {
    directory: Arc<LdapDirectory>,
    mapper: AdSchemaMapper,
}

impl AdUpdate {
    /// Create an update operation over the shared directory handle.
    pub fn new(directory: Arc<LdapDirectory>, mapper: AdSchemaMapper) -> Self {
        Self { directory, mapper }
    }

    /// Resolve the target DN for an identifier.
    ///
    /// A `dn` identifier is used directly; a GUID identifier uses AD's
    /// `<GUID=...>` addressing form; anything else is located by attribute
    /// search.
    async fn target_dn(&self, uid: &Uid) -> ConnectorResult<String> {
        if uid.attribute_name().eq_ignore_ascii_case("dn") {
            return Ok(uid.value().to_string());
        }
        if uid.attribute_name().eq_ignore_ascii_case(native::OBJECT_GUID) {
            return Ok(format!("<GUID={}>", uid.value()));
        }
        self.directory
            .find_dn(uid.attribute_name(), uid.value())
            .await
    }
}

#[async_trait]
impl UpdateEntry for AdUpdate {
    #[instrument(skip(self, attrs), fields(kind = %kind, uid = %uid))]
    async fn update(
        &self,
        kind: ObjectKind,
        uid: &Uid,
        attrs: AttributeSet,
    ) -> ConnectorResult<Uid> {
        let dn = self.target_dn(uid).await?;

        let mut mods: Vec<Mod<Vec<u8>>> = Vec::with_capacity(attrs.len());

        for (name, value) in attrs.iter() {
            if name.eq_ignore_ascii_case(op::PASSWORD) {
                // Passwords go out as unicodePwd, LDAPS only.
                let password = value.as_strings().first().copied().unwrap_or_default();
                validate_password_connection(self.directory.config().use_ssl)?;
                let encoded = encode_password(password)?;
                let values: HashSet<Vec<u8>> = std::iter::once(encoded).collect();
                mods.push(Mod::Replace(
                    native::UNICODE_PWD.as_bytes().to_vec(),
                    values,
                ));
                continue;
            }

            let Some(encoded) = self.mapper.encode_attribute(kind, name, value) else {
                continue;
            };
            if encoded.is_empty() {
                continue;
            }

            let values: HashSet<Vec<u8>> = encoded
                .values
                .iter()
                .filter_map(|v| match v {
                    AttributeValue::String(s) => Some(s.clone().into_bytes()),
                    AttributeValue::Binary(b) => Some(b.clone()),
                    _ => None,
                })
                .collect();
            mods.push(Mod::Replace(encoded.name.into_bytes(), values));
        }

        debug!(dn = %dn, mods = mods.len(), "applying update");
        self.directory.modify_batch(&dn, mods).await?;

        Ok(uid.clone())
    }
}
