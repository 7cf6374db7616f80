//! The AD provisioner facade.
//!
//! Wires the directory transport, schema mapper, membership writer and
//! update operation together and exposes the single public provisioning
//! surface: `create`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use castellan_connector::error::ConnectorResult;
use castellan_connector::operation::{AttributeSet, Uid};
use castellan_connector::traits::{Connector, UpdateEntry};
use castellan_connector::types::ObjectKind;

use crate::config::AdConfig;
use crate::create::AdCreate;
use crate::directory::LdapDirectory;
use crate::groups::MembershipWriter;
use crate::mapping::AdSchemaMapper;
use crate::update::AdUpdate;

/// Active Directory provisioner.
///
/// One instance owns one directory handle; concurrent calls creating
/// different entries are independent.
pub struct AdProvisioner {
    config: AdConfig,
    directory: Arc<LdapDirectory>,
    mapper: AdSchemaMapper,
    memberships: MembershipWriter,
    updater: AdUpdate,
}

impl AdProvisioner {
    /// Create a provisioner from configuration.
    pub fn new(config: AdConfig) -> ConnectorResult<Self> {
        config.validate()?;

        let directory = Arc::new(LdapDirectory::new(config.clone())?);
        let mapper = AdSchemaMapper::new(config.clone());
        let memberships = MembershipWriter::new(Arc::clone(&directory));
        let updater = AdUpdate::new(Arc::clone(&directory), mapper.clone());

        Ok(Self {
            config,
            directory,
            mapper,
            memberships,
            updater,
        })
    }

    /// Access the configuration.
    pub fn config(&self) -> &AdConfig {
        &self.config
    }

    /// Create an entry and return its unique identifier.
    ///
    /// One strictly sequential series of directory round-trips: create,
    /// then the conditional follow-up steps, then the deferred
    /// password/state update. Once creation has succeeded, a failing step
    /// surfaces as an error but the entry is not rolled back.
    #[instrument(skip(self, attrs), fields(kind = %kind))]
    pub async fn create(&self, kind: ObjectKind, attrs: AttributeSet) -> ConnectorResult<Uid> {
        AdCreate::new(
            &self.config,
            self.directory.as_ref(),
            &self.mapper,
            &self.memberships,
            &self.updater,
        )
        .execute(kind, attrs)
        .await
    }

    /// Apply a replace-semantics update to an existing entry.
    #[instrument(skip(self, attrs), fields(kind = %kind, uid = %uid))]
    pub async fn update(
        &self,
        kind: ObjectKind,
        uid: &Uid,
        attrs: AttributeSet,
    ) -> ConnectorResult<Uid> {
        self.updater.update(kind, uid, attrs).await
    }
}

#[async_trait]
impl Connector for AdProvisioner {
    fn display_name(&self) -> &str {
        self.directory.display_name()
    }

    async fn test_connection(&self) -> ConnectorResult<()> {
        self.directory.test_connection().await
    }

    async fn dispose(&self) -> ConnectorResult<()> {
        self.directory.dispose().await
    }
}

impl std::fmt::Debug for AdProvisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdProvisioner")
            .field("config", &self.config.redacted())
            .finish()
    }
}
