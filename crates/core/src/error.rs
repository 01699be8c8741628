//! Error types for quay
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! The taxonomy is deliberate:
//! - validation errors are detected before any engine call and never mutate state
//! - engine errors are opaque collaborator failures wrapped with operation context
//! - `PersistenceDiverged` marks a mutation that succeeded in memory but failed
//!   to reach disk, so callers can tell it apart from a clean failure

use crate::types::Id;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for quay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the quay index layer
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Dimension must be positive
    #[error("Invalid dimension: {0} (must be > 0)")]
    InvalidDimension(usize),

    /// Vector buffer was empty
    #[error("Empty vectors")]
    EmptyVectors,

    /// Vector buffer length is not a multiple of the dimension
    #[error("Vectors length {len} is not divisible by dimension {dimension}")]
    MisalignedVectors {
        /// Buffer length in floats
        len: usize,
        /// Index dimension
        dimension: usize,
    },

    /// k must be positive for search
    #[error("Invalid k: {0} (must be > 0)")]
    InvalidK(usize),

    /// ID count does not match vector row count
    #[error("Number of IDs ({ids}) doesn't match number of vectors ({rows})")]
    IdCountMismatch {
        /// IDs supplied
        ids: usize,
        /// Vector rows supplied
        rows: usize,
    },

    /// Malformed half-open ID range
    #[error("Invalid range: min={min}, max={max}")]
    InvalidRange {
        /// Inclusive lower bound
        min: Id,
        /// Exclusive upper bound
        max: Id,
    },

    /// Selector was built from no IDs
    #[error("Empty ID set")]
    EmptyIdSet,

    /// Negative ID in a selector input
    #[error("Negative ID at index {index}: {id}")]
    NegativeId {
        /// Position in the input slice
        index: usize,
        /// Offending ID
        id: Id,
    },

    /// ID exceeds the declared upper bound
    #[error("ID {id} >= max ID {max_id}")]
    IdOutOfBounds {
        /// Offending ID
        id: Id,
        /// Exclusive upper bound
        max_id: Id,
    },

    /// Composite selector with no operands
    #[error("Composite selector requires at least one operand")]
    EmptyComposite,

    /// Operation requires a trained index
    #[error("Index not trained")]
    NotTrained,

    /// Operation requires a non-empty index
    #[error("Index is empty")]
    EmptyIndex,

    /// Mutation attempted on a read-only handle
    #[error("Index is read-only")]
    ReadOnlyIndex,

    /// Registry name already in use
    #[error("Index name already registered: {0}")]
    DuplicateIndex(String),

    /// Index file does not exist at the given path
    #[error("Index file does not exist: {0}")]
    IndexFileMissing(PathBuf),

    /// Opaque engine failure, wrapped with the operation phase
    #[error("{context}: {message}")]
    Engine {
        /// Which phase failed (train/add/search/remove/...)
        context: String,
        /// Engine-reported message, not reinterpreted
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A chunked operation failed; identifies the failing row range.
    /// Rows from earlier chunks remain committed - there is no rollback.
    #[error("Batch rows {first_row}-{last_row}: {source}")]
    Batch {
        /// First row of the failing chunk
        first_row: usize,
        /// Last row of the failing chunk
        last_row: usize,
        /// Underlying failure
        source: Box<Error>,
    },

    /// A mutation succeeded in memory but the write-through failed.
    /// The in-memory index is ahead of the file; the caller chooses
    /// whether to retry persistence, reload, or discard the instance.
    #[error("{op} succeeded in memory but persistence failed: {source}")]
    PersistenceDiverged {
        /// Which mutating operation diverged
        op: &'static str,
        /// Underlying persistence failure
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap an engine-reported failure with operation context
    pub fn engine(context: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Engine {
            context: context.into(),
            message: message.into(),
        }
    }

    /// True if this error marks a memory/disk divergence
    pub fn is_divergence(&self) -> bool {
        matches!(self, Error::PersistenceDiverged { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_io() {
        let err = Error::Io(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_error_display_misaligned() {
        let err = Error::MisalignedVectors {
            len: 10,
            dimension: 4,
        };
        let msg = err.to_string();
        assert!(msg.contains("10"));
        assert!(msg.contains("4"));
    }

    #[test]
    fn test_error_display_range() {
        let err = Error::InvalidRange { min: 7, max: 3 };
        let msg = err.to_string();
        assert!(msg.contains("min=7"));
        assert!(msg.contains("max=3"));
    }

    #[test]
    fn test_error_display_engine_context() {
        let err = Error::engine("add operation", "inverted list overflow");
        let msg = err.to_string();
        assert!(msg.contains("add operation"));
        assert!(msg.contains("inverted list overflow"));
    }

    #[test]
    fn test_error_display_batch_range() {
        let err = Error::Batch {
            first_row: 200,
            last_row: 299,
            source: Box::new(Error::NotTrained),
        };
        let msg = err.to_string();
        assert!(msg.contains("200-299"));
        assert!(msg.contains("not trained"));
    }

    #[test]
    fn test_divergence_is_distinguishable() {
        let diverged = Error::PersistenceDiverged {
            op: "add_with_ids",
            source: Box::new(Error::Io(io::Error::new(
                io::ErrorKind::Other,
                "disk full",
            ))),
        };
        assert!(diverged.is_divergence());
        assert!(!Error::NotTrained.is_divergence());

        let msg = diverged.to_string();
        assert!(msg.contains("add_with_ids"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().unwrap(), 42);
    }
}
