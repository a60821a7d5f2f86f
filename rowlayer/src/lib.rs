//! Main rowlayer crate providing a unified interface for typed row storage.
//!
//! This crate is the primary entry point for users of the rowlayer framework.
//! It re-exports the core types and functionality from various sub-crates and
//! provides convenient access to different storage backends.
//!
//! # Features
//!
//! - **Typed records** - Define your rows with Serde and `#[derive(Schema)]`
//! - **Multiple backends** - In-memory and REST table stores behind one trait
//! - **Lazy result sets** - Chainable filters that execute once, on first read
//! - **Keyword-style lookups** - `filters! { name: "alice", id__gte: 2 }`
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use rowlayer::{prelude::*, memory::MemoryBackend};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Schema, Serialize, Deserialize, Clone, Debug, PartialEq)]
//! pub struct User {
//!     pub id: Option<i64>,
//!     pub name: String,
//! }
//!
//! impl Record for User {
//!     fn client() -> Arc<dyn Backend> {
//!         Arc::new(MemoryBackend::shared(Self::table_name()))
//!     }
//! }
//!
//! fn main() -> RowStoreResult<()> {
//!     // Insert a row and get it back, identity assigned
//!     let alice = User::objects().create(row! { name: "Alice" })?;
//!
//!     // Chain filters lazily; nothing executes until a read
//!     let mut users = User::objects()
//!         .filter(filters! { name: "Alice" })?
//!         .order_by("-id")?;
//!
//!     println!("matching: {}", users.count()?);
//!     Ok(())
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - Fast in-memory storage for development and testing
//! - [`rest`] - Persistent PostgREST-dialect backend (requires `rest` feature)

pub mod prelude;

pub use rowlayer_core::{backend, descriptor, error, filters, queryset, record};

// The `filters` re-export above also carries the `filters!` macro; `row!`
// and the serde_json expansion target come along here.
pub use rowlayer_core::{row, serde_json};

pub use rowlayer_macros::Schema;

/// In-memory storage backend implementations.
pub mod memory {
    pub use rowlayer_memory::MemoryBackend;
}

/// REST storage backend implementations.
///
/// This module is only available when the `rest` feature is enabled.
#[cfg(feature = "rest")]
pub mod rest {
    pub use rowlayer_rest::RestBackend;
}
