//! Error types for `keyforge` license operations.

use thiserror::Error;

use crate::db::DatabaseError;

/// Result type alias using [`LicenseError`].
pub type Result<T> = std::result::Result<T, LicenseError>;

/// Outcomes of license lifecycle operations that are not plain success.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LicenseError {
    /// Bad or missing license type, or otherwise malformed input.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The key was empty after normalization.
    #[error("License key is missing")]
    MissingKey,

    /// No record exists for the key.
    #[error("License key not found")]
    NotFound,

    /// The license was deactivated by an operator.
    #[error("License key is banned")]
    Banned,

    /// The license expiry lies in the past.
    #[error("License key has expired")]
    Expired,

    /// The store could not be reached or did not answer in time.
    #[error("License store unavailable: {0}")]
    Unavailable(String),

    /// A generated key already exists. Handled inside key creation.
    #[error("License key already exists")]
    Conflict,
}

impl From<DatabaseError> for LicenseError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::Conflict(_) => Self::Conflict,
            other => Self::Unavailable(other.to_string()),
        }
    }
}
