//! REST backend implementation for rowlayer.
//!
//! This crate provides a PostgREST-dialect implementation of the `Backend`
//! trait, enabling persistent row storage against a hosted table store such
//! as Supabase.
//!
//! To use this backend, include the `rest` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! rowlayer = { version = "x.y.z", features = ["rest"] }
//! ```
//!
//! # Features
//!
//! - **Persistent storage** - Rows live in the remote table store
//! - **Full predicate support** - Predicates translate to `field=op.value` parameters
//! - **Representation responses** - Mutations return the affected rows
//! - **Header-based counting** - Row counts ride the `Content-Range` header
//!
//! # Connection
//!
//! The endpoint and API key come from the `SUPABASE_URL` and `SUPABASE_KEY`
//! environment variables, or can be passed explicitly.
//!
//! # Example
//!
//! ```ignore
//! use rowlayer::rest::RestBackend;
//!
//! let backend = RestBackend::from_env("users");
//! ```

#[allow(unused_extern_crates)]
extern crate self as rowlayer_rest;

pub mod query;
pub mod store;

pub use store::RestBackend;
