//! Convenient re-exports of commonly used types from rowlayer.
//!
//! Import this prelude module to quickly access the most frequently used
//! types and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use rowlayer::prelude::*;
//! ```
//!
//! This provides access to:
//! - Record traits and the `Schema` derive
//! - The backend trait and row types
//! - Lazy result sets and the filter grammar
//! - Error types

pub use rowlayer_core::{
    backend::{Backend, Response, Row},
    descriptor::{Descriptor, Mode, OrderBy},
    error::{RowStoreError, RowStoreResult},
    filters::Filters,
    queryset::QuerySet,
    record::{Record, RecordExt, Schema},
};

pub use rowlayer_macros::Schema;

pub use crate::{filters, row};
