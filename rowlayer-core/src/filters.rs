//! Filter grammar: keyword-style lookup pairs and their operator suffixes.
//!
//! A lookup key is either a bare field name (implies equality) or
//! `field__suffix` where suffix is one of `lte`, `gt`, `lt`, `gte`, `in`.
//! The key is split on its last `__`; an unrecognized suffix leaves the key
//! intact, so it fails field validation instead of silently matching.
//!
//! `exclude` routes the logical negation of each operator. Each predicate is
//! inverted independently and the inverted predicates are still AND-combined;
//! this is a deliberate simplification, not exclusion-of-union semantics.
//! Membership (`in`) has no defined inversion and is rejected under exclude.

use serde_json::Value;

use crate::error::{RowStoreError, RowStoreResult};

/// The comparison category a lookup key routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal to (bare field name).
    Eq,
    /// Less than or equal to (`__lte`).
    Lte,
    /// Greater than (`__gt`).
    Gt,
    /// Less than (`__lt`).
    Lt,
    /// Greater than or equal to (`__gte`).
    Gte,
    /// Membership in a set of values (`__in`).
    In,
}

impl CompareOp {
    /// The logically inverted operator used under `exclude`.
    ///
    /// Returns `None` for membership, which has no defined inversion.
    pub fn inverted(self) -> Option<InvertedOp> {
        match self {
            CompareOp::Eq => Some(InvertedOp::Ne),
            CompareOp::Lte => Some(InvertedOp::Gt),
            CompareOp::Gt => Some(InvertedOp::Lte),
            CompareOp::Lt => Some(InvertedOp::Gte),
            CompareOp::Gte => Some(InvertedOp::Lt),
            CompareOp::In => None,
        }
    }
}

/// The comparison category an inverted (`exclude`) lookup routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvertedOp {
    /// Not equal to.
    Ne,
    /// Less than or equal to.
    Lte,
    /// Greater than.
    Gt,
    /// Less than.
    Lt,
    /// Greater than or equal to.
    Gte,
}

/// Splits a lookup key into its field name and comparison operator.
///
/// `"id"` parses as `("id", Eq)`; `"id__gte"` as `("id", Gte)`. A trailing
/// `__something` with an unknown suffix is treated as part of the field name.
pub fn parse_key(key: &str) -> (&str, CompareOp) {
    if let Some((field, suffix)) = key.rsplit_once("__") {
        let op = match suffix {
            "lte" => Some(CompareOp::Lte),
            "gt" => Some(CompareOp::Gt),
            "lt" => Some(CompareOp::Lt),
            "gte" => Some(CompareOp::Gte),
            "in" => Some(CompareOp::In),
            _ => None,
        };
        if let Some(op) = op {
            return (field, op);
        }
    }
    (key, CompareOp::Eq)
}

/// An ordered list of keyword-style lookup pairs, as passed to
/// [`QuerySet::filter`](crate::queryset::QuerySet::filter) and friends.
///
/// Usually built with the [`filters!`](crate::filters!) macro:
///
/// ```ignore
/// use rowlayer_core::filters;
///
/// let lookup = filters! { name: "test_name", id__gte: 2 };
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters(Vec<(String, Value)>);

impl Filters {
    /// Creates an empty lookup list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a lookup list from pre-built pairs, preserving order.
    pub fn from_pairs(pairs: Vec<(String, Value)>) -> Self {
        Self(pairs)
    }

    /// Appends a pair, builder style.
    pub fn and(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.push((key.into(), value.into()));
        self
    }

    /// Iterates the pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &(String, Value)> {
        self.0.iter()
    }

    /// Whether no pairs are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Validates every field name (suffix stripped) against a declared field
    /// registry, failing fast before any descriptor mutation.
    pub(crate) fn validate(&self, declared: &[&str]) -> RowStoreResult<()> {
        for (key, _) in &self.0 {
            let (field, _) = parse_key(key);
            if !declared.contains(&field) {
                return Err(RowStoreError::InvalidFilter(key.clone()));
            }
        }
        Ok(())
    }

    pub(crate) fn into_pairs(self) -> Vec<(String, Value)> {
        self.0
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Filters {
    fn from(pairs: [(K, V); N]) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<Vec<(String, Value)>> for Filters {
    fn from(pairs: Vec<(String, Value)>) -> Self {
        Self(pairs)
    }
}

/// Builds a [`Filters`] list from keyword-style pairs.
///
/// Keys are plain identifiers and may carry an operator suffix; values accept
/// anything `serde_json::json!` accepts:
///
/// ```ignore
/// let lookup = filters! { name: "test_name", id__in: [1, 3] };
/// ```
#[macro_export]
macro_rules! filters {
    ($($key:ident: $value:expr),* $(,)?) => {
        $crate::filters::Filters::from_pairs(vec![
            $((stringify!($key).to_string(), $crate::serde_json::json!($value))),*
        ])
    };
}

/// Builds a [`Row`](crate::backend::Row) payload from keyword-style pairs,
/// for `create`, `update`, and `get_or_create` defaults.
///
/// ```ignore
/// let data = row! { name: "test_name", tags: ["a", "b"] };
/// ```
#[macro_export]
macro_rules! row {
    ($($key:ident: $value:expr),* $(,)?) => {{
        let mut data = $crate::backend::Row::new();
        $(data.insert(stringify!($key).to_string(), $crate::serde_json::json!($value));)*
        data
    }};
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn bare_key_is_equality() {
        assert_eq!(parse_key("name"), ("name", CompareOp::Eq));
    }

    #[test]
    fn known_suffixes_route() {
        assert_eq!(parse_key("id__lte"), ("id", CompareOp::Lte));
        assert_eq!(parse_key("id__gt"), ("id", CompareOp::Gt));
        assert_eq!(parse_key("id__lt"), ("id", CompareOp::Lt));
        assert_eq!(parse_key("id__gte"), ("id", CompareOp::Gte));
        assert_eq!(parse_key("id__in"), ("id", CompareOp::In));
    }

    #[test]
    fn unknown_suffix_stays_in_field_name() {
        assert_eq!(parse_key("id__foo"), ("id__foo", CompareOp::Eq));
    }

    #[test]
    fn split_happens_on_last_separator() {
        assert_eq!(parse_key("some__field__gte"), ("some__field", CompareOp::Gte));
    }

    #[test]
    fn inversion_table() {
        assert_eq!(CompareOp::Eq.inverted(), Some(InvertedOp::Ne));
        assert_eq!(CompareOp::Lte.inverted(), Some(InvertedOp::Gt));
        assert_eq!(CompareOp::Gt.inverted(), Some(InvertedOp::Lte));
        assert_eq!(CompareOp::Lt.inverted(), Some(InvertedOp::Gte));
        assert_eq!(CompareOp::Gte.inverted(), Some(InvertedOp::Lt));
        assert_eq!(CompareOp::In.inverted(), None);
    }

    #[test]
    fn macro_preserves_order_and_values() {
        let lookup = filters! { name: "test_name", id__in: [1, 3] };
        let pairs: Vec<_> = lookup.iter().cloned().collect();
        assert_eq!(
            pairs,
            vec![
                ("name".to_string(), json!("test_name")),
                ("id__in".to_string(), json!([1, 3])),
            ]
        );
    }

    #[test]
    fn validate_rejects_undeclared_fields() {
        let lookup = filters! { foo: "bar" };
        assert!(matches!(
            lookup.validate(&["id", "name"]),
            Err(crate::error::RowStoreError::InvalidFilter(key)) if key == "foo"
        ));

        let lookup = filters! { id__gte: 2 };
        assert!(lookup.validate(&["id", "name"]).is_ok());
    }
}
