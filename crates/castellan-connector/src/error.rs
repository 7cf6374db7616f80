//! Provisioning error types
//!
//! Error definitions with transient/permanent classification. Failures during
//! entry creation distinguish three phases: local input validation (no
//! directory I/O has happened), entry creation itself, and post-creation
//! follow-up steps (the entry already exists and is not rolled back).

use thiserror::Error;

/// A post-creation follow-up step that can fail after the entry exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreateStep {
    /// Security-descriptor modify (user-cannot-change-password flag).
    SecurityDescriptor,
    /// Group membership add operations.
    GroupMembership,
    /// primaryGroupID modify.
    PrimaryGroup,
    /// Deferred password / account-state update.
    Finalize,
}

impl CreateStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreateStep::SecurityDescriptor => "security_descriptor",
            CreateStep::GroupMembership => "group_membership",
            CreateStep::PrimaryGroup => "primary_group",
            CreateStep::Finalize => "finalize",
        }
    }
}

impl std::fmt::Display for CreateStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error that can occur during directory provisioning operations.
#[derive(Debug, Error)]
pub enum ConnectorError {
    // Connection errors (usually transient)
    /// Failed to establish connection to the directory.
    #[error("connection failed: {message}")]
    ConnectionFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invalid credentials provided at bind time.
    #[error("authentication failed: invalid credentials")]
    AuthenticationFailed,

    /// Connector configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    // Input errors (rejected before any directory I/O)
    /// Caller-supplied attribute set is unusable (e.g. missing name).
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// A supplied or computed distinguished name is not structurally valid.
    #[error("invalid distinguished name: {value}")]
    InvalidDn { value: String },

    // Create-phase errors
    /// The directory rejected entry creation, or a mandatory post-creation
    /// read failed. The entry may or may not exist.
    #[error("entry creation failed: {message}")]
    CreateFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A post-creation step failed after the entry was created. The entry is
    /// left in the directory; no compensating delete is attempted.
    #[error("post-creation step '{step}' failed")]
    PostCreateStep {
        step: CreateStep,
        #[source]
        source: Box<ConnectorError>,
    },

    // Directory-side operation errors
    /// Entry already exists in the directory (create conflict).
    #[error("entry already exists: {identifier}")]
    ObjectAlreadyExists { identifier: String },

    /// Entry not found in the directory (modify/read target missing).
    #[error("entry not found: {identifier}")]
    ObjectNotFound { identifier: String },

    /// Generic operation failure reported by the directory.
    #[error("operation failed: {message}")]
    OperationFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ConnectorError {
    /// Check if this error is transient and the operation may be retried by
    /// an outer layer. The provisioning core itself never retries.
    pub fn is_transient(&self) -> bool {
        match self {
            ConnectorError::ConnectionFailed { .. } => true,
            ConnectorError::PostCreateStep { source, .. } => source.is_transient(),
            _ => false,
        }
    }

    /// Check if this error is permanent and retry won't help.
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            ConnectorError::ConnectionFailed { .. } => "CONNECTION_FAILED",
            ConnectorError::AuthenticationFailed => "AUTH_FAILED",
            ConnectorError::InvalidConfiguration { .. } => "INVALID_CONFIG",
            ConnectorError::InvalidInput { .. } => "INVALID_INPUT",
            ConnectorError::InvalidDn { .. } => "INVALID_DN",
            ConnectorError::CreateFailed { .. } => "CREATE_FAILED",
            ConnectorError::PostCreateStep { .. } => "POST_CREATE_STEP_FAILED",
            ConnectorError::ObjectAlreadyExists { .. } => "OBJECT_EXISTS",
            ConnectorError::ObjectNotFound { .. } => "OBJECT_NOT_FOUND",
            ConnectorError::OperationFailed { .. } => "OPERATION_FAILED",
        }
    }

    // Convenience constructors

    /// Create a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        ConnectorError::ConnectionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection failed error with source.
    pub fn connection_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::ConnectionFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ConnectorError::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a create failed error.
    pub fn create_failed(message: impl Into<String>) -> Self {
        ConnectorError::CreateFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a create failed error with the underlying directory error.
    pub fn create_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::CreateFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Wrap a failure from a post-creation step.
    pub fn post_create_step(step: CreateStep, source: ConnectorError) -> Self {
        ConnectorError::PostCreateStep {
            step,
            source: Box::new(source),
        }
    }

    /// Create an operation failed error.
    pub fn operation_failed(message: impl Into<String>) -> Self {
        ConnectorError::OperationFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create an operation failed error with source.
    pub fn operation_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::OperationFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;
