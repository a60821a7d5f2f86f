//! Error types and result types for row store operations.
//!
//! This module provides the error taxonomy for the whole crate. Use
//! [`RowStoreResult<T>`] as the return type for fallible operations.

use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when building or executing
/// queries against a row store.
///
/// Client-side validation errors (`InvalidFilter`, `InvalidField`,
/// `UnsupportedFilter`) are raised before any backend call is made. Backend
/// failures propagate untranslated through the `Backend` variant.
#[derive(Error, Debug)]
pub enum RowStoreError {
    /// A filter key referenced a field that is not declared on the record type.
    #[error("Invalid filter {0}!")]
    InvalidFilter(String),
    /// An update/create/order_by key referenced a field that is not declared
    /// on the record type.
    #[error("Invalid field {0}!")]
    InvalidField(String),
    /// The filter key uses an operator that has no defined behavior in this
    /// position (currently only `in` under `exclude`).
    #[error("Unsupported filter {0}!")]
    UnsupportedFilter(String),
    /// `get` matched zero rows. Carries the record type name so handling can
    /// stay type-specific.
    #[error("{model} object matching the given filters does not exist!")]
    DoesNotExist {
        /// Name of the record type that was queried.
        model: &'static str,
    },
    /// `get` matched more than one row.
    #[error("More than one {model} object returned for the given filters!")]
    MultipleObjectsReturned {
        /// Name of the record type that was queried.
        model: &'static str,
    },
    /// Serialization/deserialization error when converting between records
    /// and row mappings.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// An error reported by the underlying storage backend (network failure,
    /// store-level constraint violation, malformed response). Propagated
    /// unchanged; the core neither retries nor wraps these.
    #[error("Backend error: {0}")]
    Backend(String),
    /// The backend returned a response whose shape does not match the
    /// dispatched mode (e.g. a row count where rows were expected).
    #[error("Backend contract violation: {0}")]
    Contract(String),
}

/// A specialized `Result` type for row store operations.
pub type RowStoreResult<T> = Result<T, RowStoreError>;

impl From<SerdeJsonError> for RowStoreError {
    fn from(err: SerdeJsonError) -> Self {
        RowStoreError::Serialization(err.to_string())
    }
}
