//! # Active Directory Provisioning
//!
//! Provisions accounts and groups into Active-Directory-flavored LDAP
//! stores.
//!
//! Several of the effects a caller asks for at creation cannot be applied
//! atomically with the entry: AD only accepts a password over LDAPS against
//! an existing (disabled) entry, group membership is written on the group
//! side, the primary group is a RID rather than a DN, and the
//! cannot-change-password bit lives in the security descriptor. The create
//! engine in this crate sequences those follow-up round-trips and defers
//! the password/enable state to a final update, so an account is never left
//! enabled without its password.
//!
//! ## Example
//!
//! ```ignore
//! use castellan_connector::prelude::*;
//! use castellan_connector_ad::{AdConfig, AdProvisioner};
//!
//! let config = AdConfig::from_domain("corp.example.com", "admin@corp.example.com", "secret");
//! let provisioner = AdProvisioner::new(config)?;
//!
//! let attrs = AttributeSet::new()
//!     .with("name", "alice")
//!     .with("givenName", "Alice")
//!     .with("password", "P@ss1")
//!     .with("enabled", true);
//! let uid = provisioner.create(ObjectKind::Account, attrs).await?;
//! ```

pub mod account_control;
pub mod attrs;
pub mod classify;
pub mod config;
pub mod create;
pub mod directory;
pub mod dn;
pub mod groups;
pub mod guid;
pub mod mapping;
pub mod password;
pub mod provisioner;
pub mod security;
pub mod update;

// Re-exports
pub use account_control::UserAccountControl;
pub use config::AdConfig;
pub use create::AdCreate;
pub use directory::LdapDirectory;
pub use provisioner::AdProvisioner;
