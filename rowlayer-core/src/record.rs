//! Core traits for typed record schemas and their row serialization.
//!
//! A record type declares a static schema ([`Schema`], usually generated by
//! `#[derive(Schema)]`), names the backend it persists through ([`Record`]),
//! and converts to and from the flat row mappings backends exchange
//! ([`RecordExt`]).

use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    backend::{Backend, Response, Row},
    descriptor::Descriptor,
    error::{RowStoreError, RowStoreResult},
    queryset::QuerySet,
};

/// Static schema metadata for a record type.
///
/// Usually generated with `#[derive(Schema)]` from `rowlayer-macros`. The
/// field registry drives client-side validation of filter, update, create,
/// and order_by field names; the list-field tags drive string round-tripping
/// of sequence-typed columns.
pub trait Schema {
    /// The table this record type persists to.
    fn table_name() -> &'static str;

    /// Every declared field name, identity included.
    fn field_names() -> &'static [&'static str];

    /// The fields whose values are sequences. The remote store serializes
    /// these columns to strings on the way out; [`RecordExt::from_row`]
    /// consults this registry to parse them back.
    fn list_fields() -> &'static [&'static str] {
        &[]
    }

    /// The identity value, `None` until the record is persisted.
    fn id(&self) -> Option<i64>;
}

/// A persistable record type bound to a storage backend.
///
/// Implementers only provide [`client`](Record::client); everything else is
/// derived or blanket-provided.
///
/// ```ignore
/// #[derive(Schema, Serialize, Deserialize, Clone, Debug, PartialEq)]
/// struct User {
///     id: Option<i64>,
///     name: String,
/// }
///
/// impl Record for User {
///     fn client() -> Arc<dyn Backend> {
///         Arc::new(MemoryBackend::shared(Self::table_name()))
///     }
/// }
///
/// let user = User::objects().get(filters! { name: "alice" })?;
/// ```
pub trait Record:
    Schema + Serialize + DeserializeOwned + Clone + std::fmt::Debug + Send + Sync + 'static
{
    /// Returns a backend handle bound to this record type's table.
    fn client() -> Arc<dyn Backend>;

    /// Returns a fresh lazy result set bound to this record type.
    fn objects() -> QuerySet<Self> {
        QuerySet::new(Self::client())
    }
}

/// Row conversion and single-record persistence, blanket-implemented for
/// every [`Record`].
pub trait RecordExt: Record {
    /// Serializes this record to a row mapping, identity excluded.
    fn to_row(&self) -> RowStoreResult<Row>;

    /// Builds a record from a row mapping, parsing string-serialized
    /// list-typed fields back into sequences first.
    fn from_row(row: Row) -> RowStoreResult<Self>;

    /// Persists this record: update when an identity is present, insert
    /// otherwise. Returns the stored record as the backend reported it.
    fn save(&self) -> RowStoreResult<Self>;

    /// Deletes this record by identity. Does nothing when unsaved.
    fn remove(&self) -> RowStoreResult<()>;
}

impl<R: Record> RecordExt for R {
    fn to_row(&self) -> RowStoreResult<Row> {
        let value = serde_json::to_value(self)?;
        let mut row = match value {
            Value::Object(map) => map,
            other => {
                return Err(RowStoreError::Serialization(format!(
                    "expected {} to serialize to an object, got {other}",
                    R::table_name(),
                )));
            }
        };
        row.remove("id");
        Ok(row)
    }

    fn from_row(mut row: Row) -> RowStoreResult<Self> {
        for field in R::list_fields() {
            if let Some(Value::String(raw)) = row.get(*field) {
                let parsed: Value = serde_json::from_str(raw).map_err(|e| {
                    RowStoreError::Serialization(format!(
                        "field {field} holds an unparseable sequence string: {e}"
                    ))
                })?;
                row.insert((*field).to_string(), parsed);
            }
        }
        Ok(serde_json::from_value(Value::Object(row))?)
    }

    fn save(&self) -> RowStoreResult<Self> {
        let mut descriptor = Descriptor::new();
        match self.id() {
            Some(id) => {
                descriptor.set_equal([("id".to_string(), Value::from(id))]);
                descriptor.set_update_data(self.to_row()?);
            }
            None => descriptor.set_insert_data(self.to_row()?),
        }

        match Self::client().execute(&descriptor)? {
            Response::Rows(rows) => {
                let row = rows.into_iter().next().ok_or_else(|| {
                    RowStoreError::Contract(format!(
                        "backend returned no rows for a save on {}",
                        R::table_name(),
                    ))
                })?;
                Self::from_row(row)
            }
            Response::Count(_) => Err(RowStoreError::Contract(format!(
                "backend returned a count for a save on {}",
                R::table_name(),
            ))),
        }
    }

    fn remove(&self) -> RowStoreResult<()> {
        let Some(id) = self.id() else {
            return Ok(());
        };

        let mut descriptor = Descriptor::new();
        descriptor.set_equal([("id".to_string(), Value::from(id))]);
        descriptor.set_delete_mode(true);
        Self::client().execute(&descriptor)?;
        Ok(())
    }
}
