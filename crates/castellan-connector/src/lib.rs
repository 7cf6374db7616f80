//! # Castellan Connector Framework
//!
//! Core abstractions for provisioning identity objects (accounts, groups)
//! into external directories.
//!
//! The framework uses a capability-based trait system: the provisioning
//! engine drives a small set of collaborator contracts and never owns the
//! transport itself.
//!
//! - [`traits::Connector`] - base trait all connectors implement
//! - [`traits::EntryStore`] - entry create/modify/read round-trips
//! - [`traits::SchemaMapper`] - generic-to-native attribute mapping
//! - [`traits::MembershipOps`] - group membership writes
//! - [`traits::UpdateEntry`] - the generic update operation
//!
//! ## Example
//!
//! ```ignore
//! use castellan_connector::prelude::*;
//!
//! let attrs = AttributeSet::new()
//!     .with("name", "alice")
//!     .with("mail", "alice@example.com");
//! let uid = provisioner.create(ObjectKind::Account, attrs).await?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`types`] - the [`types::ObjectKind`] tag
//! - [`error`] - error types with transient/permanent classification
//! - [`operation`] - operation types ([`operation::Uid`],
//!   [`operation::AttributeSet`], [`operation::NativeAttribute`])
//! - [`traits`] - connector and collaborator traits

pub mod error;
pub mod operation;
pub mod traits;
pub mod types;

/// Prelude module for convenient imports.
///
/// ```
/// use castellan_connector::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ConnectorError, ConnectorResult, CreateStep};
    pub use crate::operation::{AttributeSet, AttributeValue, NativeAttribute, Uid};
    pub use crate::traits::{Connector, EntryStore, MembershipOps, SchemaMapper, UpdateEntry};
    pub use crate::types::ObjectKind;
}

// Re-export async_trait for connector implementors
pub use async_trait::async_trait;
