//! AD provisioning configuration.

use serde::{Deserialize, Serialize};

use castellan_connector::error::{ConnectorError, ConnectorResult};
use castellan_connector::types::ObjectKind;

use crate::attrs::native;

/// Configuration for the Active Directory provisioning connector.
#[derive(Clone, Serialize, Deserialize)]
pub struct AdConfig {
    /// Directory server hostname or IP address.
    pub host: String,

    /// Server port (389 for LDAP, 636 for LDAPS).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Use SSL/TLS (LDAPS). Required for any password write.
    #[serde(default)]
    pub use_ssl: bool,

    /// Use STARTTLS upgrade on a plain connection.
    #[serde(default)]
    pub use_starttls: bool,

    /// Base DN for all operations (e.g. "DC=example,DC=com").
    pub base_dn: String,

    /// Bind DN for authentication.
    pub bind_dn: String,

    /// Bind password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_password: Option<String>,

    /// Connection timeout in seconds.
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,

    /// Account container, relative to `base_dn` (e.g. "CN=Users").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_container: Option<String>,

    /// Group container, relative to `base_dn`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_container: Option<String>,

    /// Object class chain for new accounts.
    #[serde(default = "default_user_object_classes")]
    pub user_object_classes: Vec<String>,

    /// Object class chain for new groups.
    #[serde(default = "default_group_object_classes")]
    pub group_object_classes: Vec<String>,

    /// Attribute the caller-visible unique identifier is sourced from.
    ///
    /// When this is objectGUID (the default) the engine rereads the
    /// store-generated identifier after creation.
    #[serde(default = "default_uid_attribute")]
    pub uid_attribute: String,

    /// Id attribute for accounts.
    #[serde(default = "default_account_id_attribute")]
    pub account_id_attribute: String,

    /// Id attribute for groups.
    #[serde(default = "default_account_id_attribute")]
    pub group_id_attribute: String,

    /// Id attribute for any other object kind.
    #[serde(default = "default_other_id_attribute")]
    pub default_id_attribute: String,
}

impl std::fmt::Debug for AdConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("use_ssl", &self.use_ssl)
            .field("use_starttls", &self.use_starttls)
            .field("base_dn", &self.base_dn)
            .field("bind_dn", &self.bind_dn)
            .field(
                "bind_password",
                &self.bind_password.as_ref().map(|_| "***REDACTED***"),
            )
            .field("user_container", &self.user_container)
            .field("group_container", &self.group_container)
            .field("uid_attribute", &self.uid_attribute)
            .finish()
    }
}

fn default_port() -> u16 {
    389
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_user_object_classes() -> Vec<String> {
    vec![
        "top".to_string(),
        "person".to_string(),
        "organizationalPerson".to_string(),
        "user".to_string(),
    ]
}

fn default_group_object_classes() -> Vec<String> {
    vec!["top".to_string(), "group".to_string()]
}

fn default_uid_attribute() -> String {
    native::OBJECT_GUID.to_string()
}

fn default_account_id_attribute() -> String {
    "sAMAccountName".to_string()
}

fn default_other_id_attribute() -> String {
    "cn".to_string()
}

impl AdConfig {
    /// Create a new config with required fields.
    pub fn new(
        host: impl Into<String>,
        base_dn: impl Into<String>,
        bind_dn: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            use_ssl: false,
            use_starttls: false,
            base_dn: base_dn.into(),
            bind_dn: bind_dn.into(),
            bind_password: None,
            connection_timeout_secs: default_connection_timeout(),
            user_container: None,
            group_container: None,
            user_object_classes: default_user_object_classes(),
            group_object_classes: default_group_object_classes(),
            uid_attribute: default_uid_attribute(),
            account_id_attribute: default_account_id_attribute(),
            group_id_attribute: default_account_id_attribute(),
            default_id_attribute: default_other_id_attribute(),
        }
    }

    /// Create a config from an AD domain name, deriving the base DN.
    pub fn from_domain(domain: &str, bind_dn: &str, bind_password: &str) -> Self {
        let base_dn = domain
            .split('.')
            .map(|part| format!("DC={part}"))
            .collect::<Vec<_>>()
            .join(",");

        Self::new(domain, base_dn, bind_dn)
            .with_password(bind_password)
            .with_ssl()
            .with_user_container("CN=Users")
            .with_group_container("CN=Users")
    }

    /// Set the bind password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.bind_password = Some(password.into());
        self
    }

    /// Enable SSL (LDAPS).
    #[must_use]
    pub fn with_ssl(mut self) -> Self {
        self.use_ssl = true;
        self.port = 636;
        self
    }

    /// Enable STARTTLS.
    #[must_use]
    pub fn with_starttls(mut self) -> Self {
        self.use_starttls = true;
        self
    }

    /// Set the account container (relative to the base DN).
    pub fn with_user_container(mut self, container: impl Into<String>) -> Self {
        self.user_container = Some(container.into());
        self
    }

    /// Set the group container (relative to the base DN).
    pub fn with_group_container(mut self, container: impl Into<String>) -> Self {
        self.group_container = Some(container.into());
        self
    }

    /// Set the unique-id source attribute.
    pub fn with_uid_attribute(mut self, attr: impl Into<String>) -> Self {
        self.uid_attribute = attr.into();
        self
    }

    /// The full container DN for entries of the given kind.
    #[must_use]
    pub fn container_for(&self, kind: ObjectKind) -> String {
        let container = match kind {
            ObjectKind::Account | ObjectKind::Other => self.user_container.as_ref(),
            ObjectKind::Group => self.group_container.as_ref(),
        };
        match container {
            Some(c) => format!("{},{}", c, self.base_dn),
            None => self.base_dn.clone(),
        }
    }

    /// The objectClass chain for new entries of the given kind.
    #[must_use]
    pub fn object_classes_for(&self, kind: ObjectKind) -> &[String] {
        match kind {
            ObjectKind::Account | ObjectKind::Other => &self.user_object_classes,
            ObjectKind::Group => &self.group_object_classes,
        }
    }

    /// The configured id attribute name for the given kind.
    #[must_use]
    pub fn id_attribute_for(&self, kind: ObjectKind) -> &str {
        match kind {
            ObjectKind::Account => &self.account_id_attribute,
            ObjectKind::Group => &self.group_id_attribute,
            ObjectKind::Other => &self.default_id_attribute,
        }
    }

    /// Whether the unique identifier is sourced from the store-generated
    /// binary identifier (requires a reread after creation).
    #[must_use]
    pub fn uses_store_generated_uid(&self) -> bool {
        self.uid_attribute.eq_ignore_ascii_case(native::OBJECT_GUID)
    }

    /// The directory URL.
    #[must_use]
    pub fn url(&self) -> String {
        let scheme = if self.use_ssl { "ldaps" } else { "ldap" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConnectorResult<()> {
        if self.host.is_empty() {
            return Err(ConnectorError::InvalidConfiguration {
                message: "host is required".to_string(),
            });
        }

        if self.base_dn.is_empty() {
            return Err(ConnectorError::InvalidConfiguration {
                message: "base_dn is required".to_string(),
            });
        }

        if self.bind_dn.is_empty() {
            return Err(ConnectorError::InvalidConfiguration {
                message: "bind_dn is required".to_string(),
            });
        }

        if self.use_ssl && self.use_starttls {
            return Err(ConnectorError::InvalidConfiguration {
                message: "cannot use both SSL and STARTTLS".to_string(),
            });
        }

        if self.uid_attribute.is_empty() {
            return Err(ConnectorError::InvalidConfiguration {
                message: "uid_attribute is required".to_string(),
            });
        }

        Ok(())
    }

    /// A copy safe for logging: credentials replaced with a placeholder.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.bind_password.is_some() {
            config.bind_password = Some("***REDACTED***".to_string());
        }
        config
    }
}
