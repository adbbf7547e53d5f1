//! Crate-level error taxonomy.
//!
//! - [`Error::Validation`] — payload fails a schema rule; raised before any
//!   write, no transaction is opened.
//! - [`Error::Normalize`] — the normalizer rejected quantity or unit
//!   (unreachable for validated drafts; the normalizer defends independently).
//! - [`Error::NotFound`] — update/delete target receipt does not exist.
//! - [`Error::Storage`] — the underlying store rejected the write; always
//!   propagated after rollback, never swallowed.
//!
//! Nothing here is retried automatically and no presentation text is
//! produced beyond `Display`.

use std::fmt;

use crate::draft::ValidationError;
use crate::normalize::NormalizeError;
use crate::store::StorageError;

/// Error type for save/update/read operations
#[derive(Debug)]
pub enum Error {
    /// Payload violates a schema rule
    Validation(ValidationError),
    /// Normalizer rejected a quantity or unit
    Normalize(NormalizeError),
    /// Target receipt missing
    NotFound { receipt_id: i64 },
    /// Underlying store rejected the operation
    Storage(StorageError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Validation(e) => write!(f, "Validation failed: {}", e),
            Error::Normalize(e) => write!(f, "Normalization failed: {}", e),
            Error::NotFound { receipt_id } => {
                write!(f, "Receipt with id {} not found", receipt_id)
            }
            Error::Storage(e) => write!(f, "Storage failure: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Validation(e) => Some(e),
            Error::Normalize(e) => Some(e),
            Error::NotFound { .. } => None,
            Error::Storage(e) => Some(e),
        }
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::Validation(err)
    }
}

impl From<NormalizeError> for Error {
    fn from(err: NormalizeError) -> Self {
        Error::Normalize(err)
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        Error::Storage(err)
    }
}
