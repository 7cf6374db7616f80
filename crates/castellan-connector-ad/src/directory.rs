//! ldap3-backed directory transport.
//!
//! Implements the [`EntryStore`] contract over a cached async LDAP
//! connection. One store instance serves the whole provisioner; connections
//! are created lazily and reused until `dispose`.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Mod, Scope, SearchEntry};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use castellan_connector::error::{ConnectorError, ConnectorResult};
use castellan_connector::operation::{AttributeValue, NativeAttribute};
use castellan_connector::traits::{Connector, EntryStore};
use castellan_connector::types::ObjectKind;

use crate::config::AdConfig;

/// LDAP result code: noSuchObject.
const RC_NO_SUCH_OBJECT: u32 = 32;
/// LDAP result code: invalidCredentials.
const RC_INVALID_CREDENTIALS: u32 = 49;
/// LDAP result code: entryAlreadyExists.
const RC_ALREADY_EXISTS: u32 = 68;

/// Directory transport for AD over ldap3.
pub struct LdapDirectory {
    config: AdConfig,
    display_name: String,
    connection: Arc<RwLock<Option<Ldap>>>,
    disposed: Arc<RwLock<bool>>,
}

impl LdapDirectory {
    /// Create a new directory transport with the given configuration.
    pub fn new(config: AdConfig) -> ConnectorResult<Self> {
        config.validate()?;

        let display_name = format!("AD: {}", config.host);

        Ok(Self {
            config,
            display_name,
            connection: Arc::new(RwLock::new(None)),
            disposed: Arc::new(RwLock::new(false)),
        })
    }

    /// Access the configuration.
    pub fn config(&self) -> &AdConfig {
        &self.config
    }

    /// Get a connection, creating and binding one if necessary.
    async fn get_connection(&self) -> ConnectorResult<Ldap> {
        if *self.disposed.read().await {
            return Err(ConnectorError::InvalidConfiguration {
                message: "directory handle has been disposed".to_string(),
            });
        }

        {
            let guard = self.connection.read().await;
            if let Some(ref conn) = *guard {
                return Ok(conn.clone());
            }
        }

        let conn = self.connect().await?;

        {
            let mut guard = self.connection.write().await;
            *guard = Some(conn.clone());
        }

        Ok(conn)
    }

    /// Open a connection and bind.
    async fn connect(&self) -> ConnectorResult<Ldap> {
        let url = self.config.url();

        debug!(url = %url, "connecting to directory");

        let settings = LdapConnSettings::new()
            .set_conn_timeout(std::time::Duration::from_secs(
                self.config.connection_timeout_secs,
            ))
            .set_starttls(self.config.use_starttls);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|e| {
                ConnectorError::connection_failed_with_source(
                    format!("failed to connect to {url}"),
                    e,
                )
            })?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        let bind_dn = &self.config.bind_dn;
        let bind_password = self.config.bind_password.as_deref().unwrap_or("");

        debug!(bind_dn = %bind_dn, "binding");

        let result = ldap
            .simple_bind(bind_dn, bind_password)
            .await
            .map_err(|e| {
                ConnectorError::connection_failed_with_source(
                    format!("bind failed for {bind_dn}"),
                    e,
                )
            })?;

        if result.rc == RC_INVALID_CREDENTIALS {
            return Err(ConnectorError::AuthenticationFailed);
        }
        if result.rc != 0 {
            return Err(ConnectorError::connection_failed(format!(
                "bind failed with code {}: {}",
                result.rc, result.text
            )));
        }

        info!(host = %self.config.host, "directory connection established");

        Ok(ldap)
    }

    /// Find the DN of the entry where `attr` equals `value`.
    ///
    /// Used by the update collaborator to resolve non-DN identifiers.
    pub(crate) async fn find_dn(&self, attr: &str, value: &str) -> ConnectorResult<String> {
        let mut ldap = self.get_connection().await?;
        let filter = format!("({}={})", attr, escape_filter_value(value));

        let result = ldap
            .search(&self.config.base_dn, Scope::Subtree, &filter, vec!["dn"])
            .await
            .map_err(|e| ConnectorError::operation_failed_with_source("search failed", e))?;

        let (entries, _) = result.success().map_err(|e| {
            ConnectorError::operation_failed(format!("search failed: {e:?}"))
        })?;

        entries
            .into_iter()
            .next()
            .map(|e| SearchEntry::construct(e).dn)
            .ok_or_else(|| ConnectorError::ObjectNotFound {
                identifier: format!("{attr}={value}"),
            })
    }

    /// Apply a batch of modifications to one entry in a single round-trip.
    ///
    /// Crate-internal: the membership and update collaborators batch their
    /// changes; the public [`EntryStore`] contract stays single-attribute.
    pub(crate) async fn modify_batch(
        &self,
        dn: &str,
        mods: Vec<Mod<Vec<u8>>>,
    ) -> ConnectorResult<()> {
        if mods.is_empty() {
            return Ok(());
        }

        let mut ldap = self.get_connection().await?;

        let result = ldap.modify(dn, mods).await.map_err(|e| {
            ConnectorError::operation_failed_with_source(format!("failed to modify {dn}"), e)
        })?;

        if result.rc == RC_NO_SUCH_OBJECT {
            return Err(ConnectorError::ObjectNotFound {
                identifier: dn.to_string(),
            });
        }
        if result.rc != 0 {
            return Err(ConnectorError::operation_failed(format!(
                "modify failed with code {}: {}",
                result.rc, result.text
            )));
        }

        debug!(dn = %dn, "entry modified");
        Ok(())
    }

    /// Flatten a scalar value into wire bytes.
    fn value_bytes(value: &AttributeValue) -> Option<Vec<u8>> {
        match value {
            AttributeValue::String(s) => Some(s.clone().into_bytes()),
            AttributeValue::Binary(b) => Some(b.clone()),
            AttributeValue::Integer(i) => Some(i.to_string().into_bytes()),
            AttributeValue::Boolean(b) => {
                Some(if *b { "TRUE" } else { "FALSE" }.as_bytes().to_vec())
            }
            AttributeValue::Null | AttributeValue::Array(_) => None,
        }
    }
}

/// Escape special characters in LDAP filter values (RFC 4515).
fn escape_filter_value(value: &str) -> String {
    value
        .replace('\\', "\\5c")
        .replace('*', "\\2a")
        .replace('(', "\\28")
        .replace(')', "\\29")
        .replace('\0', "\\00")
}

#[async_trait]
impl Connector for LdapDirectory {
    fn display_name(&self) -> &str {
        &self.display_name
    }

    #[instrument(skip(self))]
    async fn test_connection(&self) -> ConnectorResult<()> {
        let mut ldap = self.get_connection().await?;

        let result = ldap
            .search(
                &self.config.base_dn,
                Scope::Base,
                "(objectClass=*)",
                vec!["dn"],
            )
            .await
            .map_err(|e| ConnectorError::connection_failed_with_source("test search failed", e))?;

        let (entries, _) = result.success().map_err(|e| {
            ConnectorError::connection_failed(format!("test search failed: {e:?}"))
        })?;

        if entries.is_empty() {
            return Err(ConnectorError::connection_failed(format!(
                "base DN '{}' not found or not accessible",
                self.config.base_dn
            )));
        }

        info!("directory connection test successful");
        Ok(())
    }

    async fn dispose(&self) -> ConnectorResult<()> {
        *self.disposed.write().await = true;

        let mut guard = self.connection.write().await;
        if let Some(mut ldap) = guard.take() {
            if let Err(e) = ldap.unbind().await {
                warn!(error = %e, "error during unbind");
            }
        }

        info!("directory handle disposed");
        Ok(())
    }
}

#[async_trait]
impl EntryStore for LdapDirectory {
    #[instrument(skip(self, attrs), fields(kind = %kind))]
    async fn create_entry(
        &self,
        kind: ObjectKind,
        dn: &str,
        attrs: Vec<NativeAttribute>,
    ) -> ConnectorResult<String> {
        let mut ldap = self.get_connection().await?;

        let ldap_attrs: Vec<(Vec<u8>, HashSet<Vec<u8>>)> = attrs
            .iter()
            .map(|attr| {
                let values: HashSet<Vec<u8>> =
                    attr.values.iter().filter_map(Self::value_bytes).collect();
                (attr.name.clone().into_bytes(), values)
            })
            .filter(|(_, values)| !values.is_empty())
            .collect();

        debug!(dn = %dn, attrs = ldap_attrs.len(), "adding entry");

        let result = ldap.add(dn, ldap_attrs).await.map_err(|e| {
            ConnectorError::operation_failed_with_source(format!("failed to add entry {dn}"), e)
        })?;

        if result.rc == RC_ALREADY_EXISTS {
            return Err(ConnectorError::ObjectAlreadyExists {
                identifier: dn.to_string(),
            });
        }
        if result.rc != 0 {
            return Err(ConnectorError::operation_failed(format!(
                "add failed with code {}: {}",
                result.rc, result.text
            )));
        }

        info!(dn = %dn, "entry added");
        Ok(dn.to_string())
    }

    #[instrument(skip(self, values))]
    async fn modify_entry(
        &self,
        dn: &str,
        attr: &str,
        values: Vec<AttributeValue>,
    ) -> ConnectorResult<()> {
        let mut ldap = self.get_connection().await?;

        let wire_values: HashSet<Vec<u8>> = values.iter().filter_map(Self::value_bytes).collect();
        let mods = vec![Mod::Replace(attr.as_bytes().to_vec(), wire_values)];

        let result = ldap.modify(dn, mods).await.map_err(|e| {
            ConnectorError::operation_failed_with_source(format!("failed to modify {dn}"), e)
        })?;

        if result.rc == RC_NO_SUCH_OBJECT {
            return Err(ConnectorError::ObjectNotFound {
                identifier: dn.to_string(),
            });
        }
        if result.rc != 0 {
            return Err(ConnectorError::operation_failed(format!(
                "modify failed with code {}: {}",
                result.rc, result.text
            )));
        }

        debug!(dn = %dn, attr = %attr, "entry modified");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn read_attribute(
        &self,
        dn: &str,
        attr: &str,
    ) -> ConnectorResult<Option<AttributeValue>> {
        let mut ldap = self.get_connection().await?;

        let result = ldap
            .search(dn, Scope::Base, "(objectClass=*)", vec![attr])
            .await
            .map_err(|e| {
                ConnectorError::operation_failed_with_source(format!("failed to read {dn}"), e)
            })?;

        if result.1.rc == RC_NO_SUCH_OBJECT {
            return Err(ConnectorError::ObjectNotFound {
                identifier: dn.to_string(),
            });
        }

        let (entries, _) = result.success().map_err(|e| {
            ConnectorError::operation_failed(format!("read of {dn} failed: {e:?}"))
        })?;

        let Some(entry) = entries.into_iter().next().map(SearchEntry::construct) else {
            return Err(ConnectorError::ObjectNotFound {
                identifier: dn.to_string(),
            });
        };

        // Binary attributes arrive separately; check them first since the
        // interesting single-attribute reads (objectGUID, objectSid,
        // nTSecurityDescriptor) are all binary.
        for (name, values) in entry.bin_attrs {
            if name.eq_ignore_ascii_case(attr) {
                return Ok(values.into_iter().next().map(AttributeValue::Binary));
            }
        }

        for (name, mut values) in entry.attrs {
            if name.eq_ignore_ascii_case(attr) {
                return Ok(match values.len() {
                    0 => None,
                    1 => Some(AttributeValue::String(values.remove(0))),
                    _ => Some(AttributeValue::Array(
                        values.into_iter().map(AttributeValue::String).collect(),
                    )),
                });
            }
        }

        Ok(None)
    }
}

impl std::fmt::Debug for LdapDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapDirectory")
            .field("display_name", &self.display_name)
            .field("config", &self.config.redacted())
            .finish()
    }
}
