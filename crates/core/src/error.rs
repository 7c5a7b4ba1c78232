//! Error types for index construction and engine operations
//!
//! Two layers:
//!
//! - [`EngineError`]: failures raised by an engine specialization
//!   (allocation, shape mismatches, persistence).
//! - [`IndexError`]: the canonical error of the public facade. Engine
//!   failures during construction are wrapped in `EngineConstruction`,
//!   failures of later operations in `Engine`.
//!
//! ## Error Codes (Canonical)
//!
//! | Code | Description |
//! |------|-------------|
//! | UnsupportedType | Metric or data type name outside the registry |
//! | UnsupportedCombination | Valid types with no catalog entry |
//! | InvalidParameter | Dimension, capacity or option out of range |
//! | InvalidEntryPolicy | Unrecognized entry policy name |
//! | EngineConstruction | Engine failed to construct |
//! | EngineError | Engine operation failed after construction |
//!
//! None of these are retryable: every failure is a deterministic function
//! of the inputs.

use crate::registry::{DataType, MetricType, VariantKey};
use std::fmt;
use thiserror::Error;

/// Which registry a rejected type name was checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// Distance metric
    Metric,
    /// Element data type
    DataType,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::Metric => f.write_str("metric"),
            TypeKind::DataType => f.write_str("data type"),
        }
    }
}

/// Errors raised by an index engine specialization
#[derive(Debug, Error)]
pub enum EngineError {
    /// Construction parameters the engine cannot work with
    #[error("invalid engine configuration: {0}")]
    InvalidConfiguration(String),

    /// Backing storage could not be reserved
    #[error("failed to reserve {what} for {elements} elements: {reason}")]
    Allocation {
        /// Which buffer failed
        what: &'static str,
        /// Requested element count (saturated on overflow)
        elements: usize,
        /// Allocator message
        reason: String,
    },

    /// Vector length does not match the index dimension
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Index dimension
        expected: usize,
        /// Length supplied
        got: usize,
    },

    /// Vector element type does not match the index data type
    #[error("data type mismatch: index stores {expected}, got {got}")]
    DataTypeMismatch {
        /// Index data type
        expected: DataType,
        /// Supplied data type
        got: DataType,
    },

    /// Number of labels does not match number of vectors
    #[error("label count mismatch: {vectors} vectors, {labels} labels")]
    LabelCountMismatch {
        /// Vectors in the batch
        vectors: usize,
        /// Labels in the batch
        labels: usize,
    },

    /// Batch does not fit in the remaining capacity
    #[error("capacity exceeded: {requested} nodes requested, {available} of {capacity} available")]
    CapacityExceeded {
        /// Fixed capacity of the index
        capacity: usize,
        /// Free slots before the batch
        available: usize,
        /// Nodes in the batch
        requested: usize,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Index file content is damaged or inconsistent
    #[error("corrupt index file: {0}")]
    Corruption(String),

    /// Index file has an unknown magic, version or tag
    #[error("unsupported index format: {0}")]
    UnsupportedFormat(String),

    /// Index file was written by another specialization
    #[error("specialization mismatch: expected {expected}, file holds {found}")]
    SpecializationMismatch {
        /// Key of the loading specialization
        expected: VariantKey,
        /// Key recorded in the file
        found: VariantKey,
    },
}

/// Result type for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Errors raised by the index facade
#[derive(Debug, Error)]
pub enum IndexError {
    /// Metric or data type name not in the registry
    #[error("unsupported {kind}: {name}")]
    UnsupportedType {
        /// Registry checked
        kind: TypeKind,
        /// Name supplied
        name: String,
    },

    /// Metric and data type are each valid but no specialization exists
    #[error("unsupported combination: no index variant for metric {metric} with data type {data_type}")]
    UnsupportedCombination {
        /// Requested metric
        metric: MetricType,
        /// Requested data type
        data_type: DataType,
    },

    /// Construction parameter out of range
    #[error("invalid parameter {parameter}: {reason}")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// What is wrong with it
        reason: String,
    },

    /// Entry policy name not recognized
    #[error("invalid entry policy: {name:?}")]
    InvalidEntryPolicy {
        /// Name supplied
        name: String,
    },

    /// The selected engine specialization failed to construct
    #[error("failed to construct {key} index: {source}")]
    EngineConstruction {
        /// Key of the specialization being built
        key: VariantKey,
        /// Underlying engine failure
        #[source]
        source: EngineError,
    },

    /// An engine operation failed
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Result type for facade operations
pub type IndexResult<T> = std::result::Result<T, IndexError>;

impl IndexError {
    /// Shorthand for an `InvalidParameter` error
    pub fn invalid_parameter(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        IndexError::InvalidParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Get the canonical error code
    pub fn error_code(&self) -> &'static str {
        match self {
            IndexError::UnsupportedType { .. } => "UnsupportedType",
            IndexError::UnsupportedCombination { .. } => "UnsupportedCombination",
            IndexError::InvalidParameter { .. } => "InvalidParameter",
            IndexError::InvalidEntryPolicy { .. } => "InvalidEntryPolicy",
            IndexError::EngineConstruction { .. } => "EngineConstruction",
            IndexError::Engine(_) => "EngineError",
        }
    }

    /// Check if the error was raised while validating configuration,
    /// before any engine was constructed.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            IndexError::UnsupportedType { .. }
                | IndexError::UnsupportedCombination { .. }
                | IndexError::InvalidParameter { .. }
                | IndexError::InvalidEntryPolicy { .. }
        )
    }

    /// Check if this error is retryable.
    ///
    /// Always false: the same inputs reproduce the same failure.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

impl From<bincode::Error> for EngineError {
    fn from(e: bincode::Error) -> Self {
        EngineError::Serialization(e.to_string())
    }
}
