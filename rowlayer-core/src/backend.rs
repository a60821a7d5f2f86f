//! Storage backend abstraction for the row store.
//!
//! This module defines the fixed operation contract that any storage backend
//! must implement: five named operations (insert, update, delete, filter,
//! count) plus a provided [`Backend::execute`] entry point that dispatches on
//! the descriptor's resolved [`Mode`](crate::descriptor::Mode).
//!
//! Backends only ever read the descriptor; they never mutate it. Rows are
//! exchanged as flat string-keyed JSON mappings, and backends that emulate
//! the remote store must serialize array-typed values to strings on the way
//! out so that round-tripping stays uniform across backends.

use std::fmt::Debug;

use serde_json::Value;

use crate::{
    descriptor::{Descriptor, Mode},
    error::RowStoreResult,
};

/// A flat, string-keyed row mapping as exchanged with backends.
pub type Row = serde_json::Map<String, Value>;

/// The result of dispatching a descriptor to a backend: either the affected
/// or selected rows, or a bare row count (count mode only).
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Ordered rows returned by insert, update, delete, or filter.
    Rows(Vec<Row>),
    /// A row count returned by count mode.
    Count(usize),
}

/// Abstract interface for row storage backends.
///
/// Implementers provide the five concrete operations; the provided
/// [`execute`](Backend::execute) method selects one based on
/// [`Descriptor::mode`]. Each operation is responsible for translating the
/// descriptor's predicate categories into its native filter form and for
/// applying payloads and ordering itself.
///
/// On delete, implementations must return the rows that were deleted
/// (read-then-remove): callers rely on seeing pre-delete content.
pub trait Backend: Send + Sync + Debug {
    /// The table this backend instance is bound to.
    fn table_name(&self) -> &str;

    /// Inserts the descriptor's payload as a new row and returns the stored
    /// row, identity assigned.
    fn insert(&self, descriptor: &Descriptor) -> RowStoreResult<Vec<Row>>;

    /// Applies the descriptor's partial update payload to every matching row
    /// and returns the updated rows.
    fn update(&self, descriptor: &Descriptor) -> RowStoreResult<Vec<Row>>;

    /// Removes every matching row and returns their pre-delete content.
    fn delete(&self, descriptor: &Descriptor) -> RowStoreResult<Vec<Row>>;

    /// Returns the rows matching the descriptor's predicates, ordered when an
    /// ordering spec is present.
    fn filter(&self, descriptor: &Descriptor) -> RowStoreResult<Vec<Row>>;

    /// Returns the number of matching rows without materializing them.
    fn count(&self, descriptor: &Descriptor) -> RowStoreResult<usize>;

    /// Dispatches the descriptor to the operation selected by its mode.
    fn execute(&self, descriptor: &Descriptor) -> RowStoreResult<Response> {
        Ok(match descriptor.mode() {
            Mode::Delete => Response::Rows(self.delete(descriptor)?),
            Mode::Insert => Response::Rows(self.insert(descriptor)?),
            Mode::Update => Response::Rows(self.update(descriptor)?),
            Mode::Count => Response::Count(self.count(descriptor)?),
            Mode::Filter => Response::Rows(self.filter(descriptor)?),
        })
    }
}
