//! Group membership writes.
//!
//! AD group membership lives on the group entry: adding a member means an
//! add-modify of the group's `member` attribute with the new entry's DN.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use ldap3::Mod;
use tracing::{debug, instrument};

use castellan_connector::error::ConnectorResult;
use castellan_connector::traits::MembershipOps;

use crate::attrs::native;
use crate::directory::LdapDirectory;

/// Writes group memberships through the directory transport.
pub struct MembershipWriter {
    directory: Arc<LdapDirectory>,
}

impl MembershipWriter {
    /// Create a writer over the shared directory handle.
    pub fn new(directory: Arc<LdapDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl MembershipOps for MembershipWriter {
    #[instrument(skip(self, group_dns), fields(groups = group_dns.len()))]
    async fn add_memberships(&self, entry_dn: &str, group_dns: &[String]) -> ConnectorResult<()> {
        for group_dn in group_dns {
            debug!(group = %group_dn, member = %entry_dn, "adding group membership");

            let values: HashSet<Vec<u8>> =
                std::iter::once(entry_dn.as_bytes().to_vec()).collect();
            self.directory
                .modify_batch(
                    group_dn,
                    vec![Mod::Add(native::MEMBER.as_bytes().to_vec(), values)],
                )
                .await?;
        }
        Ok(())
    }
}
