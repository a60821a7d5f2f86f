//! A thin typed-record abstraction layer for table-oriented data stores.
//!
//! This crate is the core of the rowlayer project and provides:
//!
//! - **Record traits** ([`record`]) - Schema metadata and row serialization for typed records
//! - **Backend abstraction** ([`backend`]) - The fixed operation contract storage backends implement
//! - **Request descriptors** ([`descriptor`]) - Accumulated, backend-agnostic query and mutation intent
//! - **Filter grammar** ([`filters`]) - Keyword-style lookups with operator suffixes
//! - **Lazy result sets** ([`queryset`]) - Chainable, cache-backed query interface
//! - **Error handling** ([`error`]) - Error taxonomy and result type
//!
//! # Example
//!
//! ```ignore
//! use rowlayer_core::{filters, record::Record};
//!
//! #[derive(Schema, Serialize, Deserialize, Clone, Debug)]
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
//! let user = User::objects().get(filters! { name: "alice" })?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as rowlayer_core;

pub mod backend;
pub mod descriptor;
pub mod error;
pub mod filters;
pub mod queryset;
pub mod record;

// Re-exported for the `filters!` and `row!` macro expansions.
pub use serde_json;
