//! Predicate evaluation for in-memory row filtering.
//!
//! This module provides the evaluation engine that decides whether a stored
//! row satisfies every predicate category accumulated on a descriptor.

use std::{cmp::Ordering, collections::HashMap};

use serde_json::Value;

use rowlayer_core::{backend::Row, descriptor::Descriptor};

/// Type-erased, comparable representation of JSON values.
///
/// This enum wraps JSON values and provides comparison operations for
/// filtering queries. It normalizes numeric types to f64 for easy comparison.
///
/// # Note
///
/// This is a private implementation detail used for predicate evaluation and
/// sorting.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    /// Null value, also used for absent fields
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value (all integers and floats normalized to f64)
    Number(f64),
    /// String value
    String(&'a str),
    /// Array of comparable values
    Array(Vec<Comparable<'a>>),
    /// Map/Object of comparable values
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Value> for Comparable<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Null => Comparable::Null,
            Value::Bool(value) => Comparable::Bool(*value),
            Value::Number(value) => Comparable::Number(value.as_f64().unwrap_or(f64::NAN)),
            Value::String(value) => Comparable::String(value),
            Value::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Value::Object(map) => Comparable::Map(
                map
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Compares two row field values for sorting, treating absent fields and
/// cross-type comparisons as equal.
pub(crate) fn compare_fields(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    let left = left.map(Comparable::from).unwrap_or(Comparable::Null);
    let right = right.map(Comparable::from).unwrap_or(Comparable::Null);
    left.partial_cmp(&right).unwrap_or(Ordering::Equal)
}

/// Evaluates a descriptor's accumulated predicate categories against rows.
///
/// All predicate pairs are AND-combined: a row matches only when it satisfies
/// every pair of every category. An absent field compares as null, so it
/// never satisfies an ordering predicate and satisfies equality only against
/// an explicit null.
pub(crate) struct RowMatcher<'a> {
    descriptor: &'a Descriptor,
}

impl<'a> RowMatcher<'a> {
    pub fn new(descriptor: &'a Descriptor) -> Self {
        Self { descriptor }
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.all_eq(self.descriptor.equal(), row, true)
            && self.all_eq(self.descriptor.not_equal(), row, false)
            && self.all_ordered(self.descriptor.less_than(), row, &[Ordering::Less])
            && self.all_ordered(
                self.descriptor.less_than_or_equal(),
                row,
                &[Ordering::Less, Ordering::Equal],
            )
            && self.all_ordered(self.descriptor.greater_than(), row, &[Ordering::Greater])
            && self.all_ordered(
                self.descriptor.greater_than_or_equal(),
                row,
                &[Ordering::Greater, Ordering::Equal],
            )
            && self.all_included(row)
    }

    fn field<'r>(row: &'r Row, field: &str) -> Comparable<'r> {
        row.get(field).map(Comparable::from).unwrap_or(Comparable::Null)
    }

    fn all_eq(&self, pairs: &[(String, Value)], row: &Row, want_equal: bool) -> bool {
        pairs
            .iter()
            .all(|(field, value)| (Self::field(row, field) == Comparable::from(value)) == want_equal)
    }

    fn all_ordered(&self, pairs: &[(String, Value)], row: &Row, accepted: &[Ordering]) -> bool {
        pairs.iter().all(|(field, value)| {
            match Self::field(row, field).partial_cmp(&Comparable::from(value)) {
                Some(ordering) => accepted.contains(&ordering),
                None => false,
            }
        })
    }

    fn all_included(&self, row: &Row) -> bool {
        self.descriptor.included().iter().all(|(field, value)| {
            let Value::Array(candidates) = value else {
                return false;
            };
            let actual = Self::field(row, field);
            candidates
                .iter()
                .any(|candidate| actual == Comparable::from(candidate))
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use rowlayer_core::row;

    use super::*;

    fn matches(descriptor: &Descriptor, row: &Row) -> bool {
        RowMatcher::new(descriptor).matches(row)
    }

    #[test]
    fn equality_on_present_and_absent_fields() {
        let mut descriptor = Descriptor::new();
        descriptor.set_equal([("name".to_string(), json!("a"))]);

        assert!(matches(&descriptor, &row! { id: 1, name: "a" }));
        assert!(!matches(&descriptor, &row! { id: 1, name: "b" }));
        assert!(!matches(&descriptor, &row! { id: 1 }));
    }

    #[test]
    fn absent_field_equals_explicit_null() {
        let mut descriptor = Descriptor::new();
        descriptor.set_equal([("name".to_string(), Value::Null)]);

        assert!(matches(&descriptor, &row! { id: 1 }));
        assert!(!matches(&descriptor, &row! { id: 1, name: "a" }));
    }

    #[test]
    fn ordering_predicates() {
        let mut descriptor = Descriptor::new();
        descriptor.set_greater_than([("id".to_string(), json!(2))]);
        assert!(matches(&descriptor, &row! { id: 3 }));
        assert!(!matches(&descriptor, &row! { id: 2 }));

        let mut descriptor = Descriptor::new();
        descriptor.set_less_than_or_equal([("id".to_string(), json!(2))]);
        assert!(matches(&descriptor, &row! { id: 2 }));
        assert!(!matches(&descriptor, &row! { id: 3 }));
    }

    #[test]
    fn cross_type_ordering_never_matches() {
        let mut descriptor = Descriptor::new();
        descriptor.set_greater_than([("id".to_string(), json!("2"))]);
        assert!(!matches(&descriptor, &row! { id: 3 }));
    }

    #[test]
    fn membership_requires_an_array_operand() {
        let mut descriptor = Descriptor::new();
        descriptor.set_included([("id".to_string(), json!([1, 3]))]);
        assert!(matches(&descriptor, &row! { id: 1 }));
        assert!(matches(&descriptor, &row! { id: 3 }));
        assert!(!matches(&descriptor, &row! { id: 2 }));

        let mut descriptor = Descriptor::new();
        descriptor.set_included([("id".to_string(), json!(1))]);
        assert!(!matches(&descriptor, &row! { id: 1 }));
    }

    #[test]
    fn categories_are_and_combined() {
        let mut descriptor = Descriptor::new();
        descriptor.set_equal([("name".to_string(), json!("a"))]);
        descriptor.set_greater_than([("id".to_string(), json!(1))]);

        assert!(matches(&descriptor, &row! { id: 2, name: "a" }));
        assert!(!matches(&descriptor, &row! { id: 1, name: "a" }));
        assert!(!matches(&descriptor, &row! { id: 2, name: "b" }));
    }

    #[test]
    fn repeated_pairs_all_apply() {
        let mut descriptor = Descriptor::new();
        descriptor.set_greater_than([("id".to_string(), json!(1))]);
        descriptor.set_greater_than([("id".to_string(), json!(5))]);

        assert!(matches(&descriptor, &row! { id: 6 }));
        assert!(!matches(&descriptor, &row! { id: 3 }));
    }

    #[test]
    fn sort_comparison_treats_missing_as_equal() {
        assert_eq!(compare_fields(Some(&json!(1)), Some(&json!(2))), Ordering::Less);
        assert_eq!(compare_fields(Some(&json!("b")), Some(&json!("a"))), Ordering::Greater);
        assert_eq!(compare_fields(None, Some(&json!(2))), Ordering::Equal);
    }
}
