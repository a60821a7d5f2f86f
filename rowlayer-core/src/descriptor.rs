//! Request descriptor: the accumulated, backend-agnostic representation of a
//! single query or mutation intent.
//!
//! A [`Descriptor`] is a pure data accumulator with no I/O. The lazy result
//! set mutates it through chain methods and hands it to a backend adapter for
//! execution; adapters only ever read it. The descriptor resolves its own
//! operation [`Mode`] from which parts are populated.

use serde_json::Value;

use crate::backend::Row;

/// The resolved operation kind a descriptor currently represents.
///
/// Resolution is priority-ordered and mutually exclusive in effect: even if
/// several parts happen to be populated, exactly one mode is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Remove the rows matching the predicates.
    Delete,
    /// Insert the payload as a new row.
    Insert,
    /// Apply the partial payload to the rows matching the predicates.
    Update,
    /// Count the rows matching the predicates.
    Count,
    /// Select the rows matching the predicates (the default).
    Filter,
}

/// Sort specification: a single field and a direction.
///
/// Only one ordering key is supported; setting a new one overwrites the old.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    /// The field name to sort by.
    pub field: String,
    /// Whether to sort in descending order.
    pub descending: bool,
}

/// A structured, accumulated description of one logical database operation.
///
/// Predicate pairs for the same field may repeat; they are AND-combined in
/// insertion order and never deduplicated. All setters are total functions
/// over their input types; field validation is the query set's job.
#[derive(Debug, Clone, Default)]
pub struct Descriptor {
    select_fields: Option<Vec<String>>,
    equal: Vec<(String, Value)>,
    not_equal: Vec<(String, Value)>,
    less_than: Vec<(String, Value)>,
    less_than_or_equal: Vec<(String, Value)>,
    greater_than: Vec<(String, Value)>,
    greater_than_or_equal: Vec<(String, Value)>,
    included: Vec<(String, Value)>,
    insert_data: Option<Row>,
    update_data: Option<Row>,
    delete_mode: bool,
    count_mode: bool,
    order_by: Option<OrderBy>,
}

impl Descriptor {
    /// Creates a new empty descriptor (filter mode, all fields).
    pub fn new() -> Self {
        Self::default()
    }

    /// The selected fields, or `None` for the "all fields" sentinel.
    pub fn select_fields(&self) -> Option<&[String]> {
        self.select_fields.as_deref()
    }

    /// Equality predicates, in insertion order.
    pub fn equal(&self) -> &[(String, Value)] {
        &self.equal
    }

    /// Non-equality predicates.
    pub fn not_equal(&self) -> &[(String, Value)] {
        &self.not_equal
    }

    /// Less-than predicates.
    pub fn less_than(&self) -> &[(String, Value)] {
        &self.less_than
    }

    /// Less-than-or-equal predicates.
    pub fn less_than_or_equal(&self) -> &[(String, Value)] {
        &self.less_than_or_equal
    }

    /// Greater-than predicates.
    pub fn greater_than(&self) -> &[(String, Value)] {
        &self.greater_than
    }

    /// Greater-than-or-equal predicates.
    pub fn greater_than_or_equal(&self) -> &[(String, Value)] {
        &self.greater_than_or_equal
    }

    /// Membership predicates; each value is expected to be an array.
    pub fn included(&self) -> &[(String, Value)] {
        &self.included
    }

    /// The insert payload, if any.
    pub fn insert_data(&self) -> Option<&Row> {
        self.insert_data.as_ref()
    }

    /// The partial update payload, if any.
    pub fn update_data(&self) -> Option<&Row> {
        self.update_data.as_ref()
    }

    /// Whether the descriptor is flagged for deletion.
    pub fn delete_mode(&self) -> bool {
        self.delete_mode
    }

    /// Whether the descriptor is flagged for counting.
    pub fn count_mode(&self) -> bool {
        self.count_mode
    }

    /// The ordering spec, if any. Only meaningful for filter mode.
    pub fn order_by(&self) -> Option<&OrderBy> {
        self.order_by.as_ref()
    }

    /// Resolves the operation mode from the populated parts.
    ///
    /// Priority: delete > insert > update > count > filter. This order must
    /// be reproduced exactly for compatibility.
    pub fn mode(&self) -> Mode {
        if self.delete_mode {
            return Mode::Delete;
        }
        if self.insert_data.is_some() {
            return Mode::Insert;
        }
        if self.update_data.is_some() {
            return Mode::Update;
        }
        if self.count_mode {
            return Mode::Count;
        }
        Mode::Filter
    }

    /// Appends to the selected fields; the first call replaces the "all
    /// fields" sentinel.
    pub fn set_select_fields(&mut self, fields: impl IntoIterator<Item = String>) {
        self.select_fields
            .get_or_insert_with(Vec::new)
            .extend(fields);
    }

    /// Appends equality predicate pairs.
    pub fn set_equal(&mut self, pairs: impl IntoIterator<Item = (String, Value)>) {
        self.equal.extend(pairs);
    }

    /// Appends non-equality predicate pairs.
    pub fn set_not_equal(&mut self, pairs: impl IntoIterator<Item = (String, Value)>) {
        self.not_equal.extend(pairs);
    }

    /// Appends less-than predicate pairs.
    pub fn set_less_than(&mut self, pairs: impl IntoIterator<Item = (String, Value)>) {
        self.less_than.extend(pairs);
    }

    /// Appends less-than-or-equal predicate pairs.
    pub fn set_less_than_or_equal(&mut self, pairs: impl IntoIterator<Item = (String, Value)>) {
        self.less_than_or_equal.extend(pairs);
    }

    /// Appends greater-than predicate pairs.
    pub fn set_greater_than(&mut self, pairs: impl IntoIterator<Item = (String, Value)>) {
        self.greater_than.extend(pairs);
    }

    /// Appends greater-than-or-equal predicate pairs.
    pub fn set_greater_than_or_equal(&mut self, pairs: impl IntoIterator<Item = (String, Value)>) {
        self.greater_than_or_equal.extend(pairs);
    }

    /// Appends membership predicate pairs.
    pub fn set_included(&mut self, pairs: impl IntoIterator<Item = (String, Value)>) {
        self.included.extend(pairs);
    }

    /// Overwrites the insert payload.
    pub fn set_insert_data(&mut self, data: Row) {
        self.insert_data = Some(data);
    }

    /// Overwrites the update payload.
    pub fn set_update_data(&mut self, data: Row) {
        self.update_data = Some(data);
    }

    /// Sets the delete flag.
    pub fn set_delete_mode(&mut self, value: bool) {
        self.delete_mode = value;
    }

    /// Sets the count flag.
    pub fn set_count_mode(&mut self, value: bool) {
        self.count_mode = value;
    }

    /// Overwrites the ordering spec.
    pub fn set_order_by(&mut self, field: impl Into<String>, descending: bool) {
        self.order_by = Some(OrderBy { field: field.into(), descending });
    }
}
