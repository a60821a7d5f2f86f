//! In-memory row storage backend for rowlayer.
//!
//! This crate provides a thread-safe, in-memory implementation of the
//! `Backend` trait. It emulates the remote table store closely enough to
//! stand in for it in development and testing: sequential max-plus-one
//! identities, array-to-string serialization on the way out, and a shared
//! per-table registry so every handle for a table sees the same rows.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes behind RwLocks
//! - **Full predicate support** - All comparison categories plus membership
//! - **Ordering and projection** - Single-key sorting and field selection
//! - **Remote-faithful output** - Array values serialized to strings
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use rowlayer_core::{backend::Backend, filters, record::{Record, Schema}};
//! use rowlayer_memory::MemoryBackend;
//! use serde::{Serialize, Deserialize};
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
//! let alice = User::objects().get(filters! { name: "alice" })?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as rowlayer_memory;

pub mod evaluator;
pub mod store;

pub use store::MemoryBackend;
