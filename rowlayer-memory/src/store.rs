//! In-memory storage implementation for the row store.
//!
//! This module provides a simple but complete in-memory backend that stores
//! rows as JSON mappings in id-ordered maps behind read-write locks. It
//! emulates the remote store closely enough to substitute for it in tests
//! and local development: identities are assigned max-plus-one and
//! array-typed values are serialized to strings on the way out.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use rowlayer_core::{
    backend::{Backend, Row},
    descriptor::Descriptor,
    error::{RowStoreError, RowStoreResult},
};

use crate::evaluator::{RowMatcher, compare_fields};

type TableRows = BTreeMap<i64, Row>;

/// One shared table map per table name, so that every backend handle for the
/// same table observes the same rows, like connections to one database.
static REGISTRY: Lazy<Mutex<HashMap<String, Arc<RwLock<TableRows>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Thread-safe in-memory row storage backend.
///
/// This struct implements the [`Backend`] trait to provide a fully functional
/// row store that operates entirely in memory. Rows are stored in an
/// id-ordered map, so unordered queries come back in identity order.
///
/// # Thread Safety
///
/// `MemoryBackend` is cloneable and uses an `Arc`-wrapped table map; clones
/// and [`shared`](MemoryBackend::shared) handles for the same table all see
/// the same data.
///
/// # Performance
///
/// Queries scan all rows in the table (no indexing). For small to medium
/// datasets this is typically acceptable.
///
/// # Example
///
/// ```ignore
/// use rowlayer_memory::MemoryBackend;
/// use rowlayer_core::{backend::Backend, descriptor::Descriptor, row};
///
/// let store = MemoryBackend::shared("users");
/// let mut descriptor = Descriptor::new();
/// descriptor.set_insert_data(row! { name: "alice" });
/// let inserted = store.insert(&descriptor)?;
/// ```
#[derive(Clone, Debug)]
pub struct MemoryBackend {
    table: String,
    rows: Arc<RwLock<TableRows>>,
}

impl MemoryBackend {
    /// Creates a backend with private storage, not visible to other handles.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            rows: Arc::new(RwLock::new(TableRows::new())),
        }
    }

    /// Returns a backend handle bound to the process-wide shared storage for
    /// `table`. Handles for the same table share rows.
    pub fn shared(table: impl Into<String>) -> Self {
        let table = table.into();
        let rows = REGISTRY
            .lock()
            .entry(table.clone())
            .or_insert_with(|| Arc::new(RwLock::new(TableRows::new())))
            .clone();
        Self { table, rows }
    }

    /// Removes every row from this backend's table.
    pub fn clear(&self) {
        self.rows.write().clear();
    }

    /// The next identity: one past the highest assigned, starting at 1.
    fn next_id(rows: &TableRows) -> i64 {
        rows.keys().next_back().map_or(1, |max| max + 1)
    }

    /// Applies field projection, then serializes array values to strings,
    /// matching what the remote store hands back.
    fn externalize(&self, mut row: Row, descriptor: &Descriptor) -> Row {
        if let Some(fields) = descriptor.select_fields() {
            row.retain(|key, _| fields.iter().any(|field| field == key));
        }
        for (_, value) in row.iter_mut() {
            if let Value::Array(items) = value {
                *value = Value::String(Value::Array(std::mem::take(items)).to_string());
            }
        }
        row
    }

    fn matching_ids(rows: &TableRows, descriptor: &Descriptor) -> Vec<i64> {
        let matcher = RowMatcher::new(descriptor);
        rows.iter()
            .filter(|(_, row)| matcher.matches(row))
            .map(|(id, _)| *id)
            .collect()
    }

    fn payload<'d>(
        &self,
        payload: Option<&'d Row>,
        operation: &str,
    ) -> RowStoreResult<&'d Row> {
        payload.ok_or_else(|| {
            RowStoreError::Contract(format!(
                "{operation} on {} dispatched without a payload",
                self.table,
            ))
        })
    }
}

impl Backend for MemoryBackend {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn insert(&self, descriptor: &Descriptor) -> RowStoreResult<Vec<Row>> {
        let data = self.payload(descriptor.insert_data(), "insert")?;

        let mut rows = self.rows.write();
        let id = Self::next_id(&rows);

        let mut row = data.clone();
        row.insert("id".to_string(), Value::from(id));
        rows.insert(id, row.clone());

        Ok(vec![self.externalize(row, descriptor)])
    }

    fn update(&self, descriptor: &Descriptor) -> RowStoreResult<Vec<Row>> {
        let data = self.payload(descriptor.update_data(), "update")?.clone();

        let mut rows = self.rows.write();
        let ids = Self::matching_ids(&rows, descriptor);

        let mut updated = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(row) = rows.get_mut(&id) {
                for (key, value) in &data {
                    row.insert(key.clone(), value.clone());
                }
                updated.push(self.externalize(row.clone(), descriptor));
            }
        }

        Ok(updated)
    }

    fn delete(&self, descriptor: &Descriptor) -> RowStoreResult<Vec<Row>> {
        let mut rows = self.rows.write();
        let ids = Self::matching_ids(&rows, descriptor);

        // Read-then-remove: callers see the pre-delete content.
        let mut deleted = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(row) = rows.remove(&id) {
                deleted.push(self.externalize(row, descriptor));
            }
        }

        Ok(deleted)
    }

    fn filter(&self, descriptor: &Descriptor) -> RowStoreResult<Vec<Row>> {
        let rows = self.rows.read();
        let matcher = RowMatcher::new(descriptor);

        let mut selected = rows
            .values()
            .filter(|row| matcher.matches(row))
            .cloned()
            .collect::<Vec<_>>();

        if let Some(sort) = descriptor.order_by() {
            selected.sort_by(|a, b| {
                let ordering = compare_fields(a.get(&sort.field), b.get(&sort.field));
                if sort.descending { ordering.reverse() } else { ordering }
            });
        }

        Ok(selected
            .into_iter()
            .map(|row| self.externalize(row, descriptor))
            .collect())
    }

    fn count(&self, descriptor: &Descriptor) -> RowStoreResult<usize> {
        let rows = self.rows.read();
        Ok(Self::matching_ids(&rows, descriptor).len())
    }
}
