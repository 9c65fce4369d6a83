use std::path::PathBuf;
use thiserror::Error;

/// The main error type for inventory operations.
///
/// Remote failures are always returned as values. Callers decide whether an
/// error is fatal (authentication in single-scope mode, persistence) or is
/// absorbed as a per-scope / per-type gap in the report.
#[derive(Error, Debug)]
pub enum OpenStackError {
    /// Represents errors that occur while talking to a remote endpoint
    ///
    /// # Fields
    /// * `0` - A description of what went wrong during the request
    #[error("Connection error: {0}")]
    Connection(String),

    /// Represents authentication failures (bad credentials, unreachable Keystone)
    ///
    /// # Fields
    /// * `0` - A description of the authentication failure
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// A remote API answered with a non-success status code
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A response body could not be decoded into the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// A required service is missing from the token's service catalog
    #[error("Service catalog error: {0}")]
    Catalog(String),

    /// Scope discovery could not produce any scope
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// Represents validation failures with detailed context
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The snapshot store could not complete an operation
    #[error("Storage error: {0}")]
    Storage(String),

    /// No snapshot has been written yet
    #[error("No saved report found at {}", .0.display())]
    SnapshotNotFound(PathBuf),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Neither a cached snapshot nor a live collection is available
    #[error("Inventory data unavailable: {0}")]
    DataUnavailable(String),
}

impl OpenStackError {
    /// Returns true when the remote side answered with the given status code.
    pub fn is_status(&self, code: u16) -> bool {
        matches!(self, OpenStackError::Api { status, .. } if *status == code)
    }
}

/// Specialized error type for validation failures.
///
/// This enum provides detailed context about why a validation
/// failed, including field-specific errors and format violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Represents a validation failure for a specific field
    ///
    /// # Fields
    /// * `field` - The name of the field that failed validation
    /// * `message` - A detailed message about why validation failed
    #[error("Field '{field}' validation failed: {message}")]
    Field { field: String, message: String },

    /// Represents format/syntax validation failures
    ///
    /// # Fields
    /// * `0` - Description of the format violation
    #[error("Format error: {0}")]
    Format(String),

    /// Represents violations of domain constraints
    ///
    /// # Fields
    /// * `0` - Description of the constraint violation
    #[error("Domain constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Type alias for Results that may fail with an OpenStackError
pub type OpenStackResult<T> = Result<T, OpenStackError>;
