//! Lazy result sets: the chainable, cache-backed query interface.
//!
//! A [`QuerySet`] accumulates filter, ordering, and mutation intent into a
//! [`Descriptor`] across chained calls and defers backend execution until a
//! consuming operation is invoked. Executed rows are cached as typed records;
//! repeat reads reuse the cache without re-querying.
//!
//! # Query building
//!
//! ```ignore
//! let recent = User::objects()
//!     .filter(filters! { name: "test_name" })?
//!     .order_by("-id")?;
//!
//! for user in recent.iter()? {
//!     println!("{user:?}");
//! }
//! ```
//!
//! Chain methods (`filter`, `exclude`, `order_by`) consume the set and return
//! a new unexecuted one; filters accumulate monotonically and are never
//! removed. Terminal operations (`update`, `delete`, `create`) execute
//! immediately and replace the cache with the affected rows.

use std::sync::Arc;

use crate::{
    backend::{Backend, Response, Row},
    descriptor::Descriptor,
    error::{RowStoreError, RowStoreResult},
    filters::{CompareOp, Filters, InvertedOp, parse_key},
    record::{Record, RecordExt},
};

/// The record type's short name, for error messages scoped per type.
fn model_name<R>() -> &'static str {
    std::any::type_name::<R>()
        .rsplit("::")
        .next()
        .unwrap_or("record")
}

/// A lazy database lookup for a set of records.
///
/// While unexecuted, any read operation (`count`, `exists`, `first`, `last`,
/// `nth`, `iter`, `to_vec`, `len`) triggers backend execution and populates
/// the cache in place; once populated, repeat reads reuse the cache. `count`
/// and `exists` short-circuit to a backend row count when no cache exists
/// yet, but always prefer an existing cache to avoid double execution.
///
/// A `QuerySet` is not safe for concurrent mutation; callers must not share
/// one instance across threads.
#[derive(Debug)]
pub struct QuerySet<R: Record> {
    client: Arc<dyn Backend>,
    descriptor: Descriptor,
    cache: Option<Vec<R>>,
}

impl<R: Record> QuerySet<R> {
    /// Creates a fresh, unexecuted set with an empty descriptor.
    pub fn new(client: Arc<dyn Backend>) -> Self {
        Self { client, descriptor: Descriptor::new(), cache: None }
    }

    /// Read access to the accumulated descriptor.
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// Returns an unexecuted copy carrying the accumulated descriptor.
    #[must_use]
    pub fn all(self) -> Self {
        Self { cache: None, ..self }
    }

    /// Adds lookup predicates and returns a new unexecuted set.
    ///
    /// Keys follow the `field` / `field__op` grammar (see
    /// [`filters`](crate::filters)). Every field name is validated against
    /// the record's declared fields before anything is recorded.
    pub fn filter(mut self, lookup: impl Into<Filters>) -> RowStoreResult<Self> {
        let lookup = lookup.into();
        lookup.validate(R::field_names())?;

        for (key, value) in lookup.into_pairs() {
            let (field, op) = parse_key(&key);
            let pair = (field.to_string(), value);
            match op {
                CompareOp::Eq => self.descriptor.set_equal([pair]),
                CompareOp::Lte => self.descriptor.set_less_than_or_equal([pair]),
                CompareOp::Gt => self.descriptor.set_greater_than([pair]),
                CompareOp::Lt => self.descriptor.set_less_than([pair]),
                CompareOp::Gte => self.descriptor.set_greater_than_or_equal([pair]),
                CompareOp::In => self.descriptor.set_included([pair]),
            }
        }
        self.cache = None;
        Ok(self)
    }

    /// Adds the per-predicate logical negation of each lookup and returns a
    /// new unexecuted set.
    ///
    /// Each predicate is inverted independently and the results are still
    /// AND-combined, which is a deliberate simplification rather than true
    /// exclusion-of-union semantics. `field__in` has no defined inversion
    /// and is rejected with [`RowStoreError::UnsupportedFilter`].
    pub fn exclude(mut self, lookup: impl Into<Filters>) -> RowStoreResult<Self> {
        let lookup = lookup.into();
        lookup.validate(R::field_names())?;

        // Route everything up front so an unsupported key leaves the
        // descriptor untouched.
        let mut routed = Vec::new();
        for (key, value) in lookup.into_pairs() {
            let (field, op) = parse_key(&key);
            let field = field.to_string();
            let inverted = op
                .inverted()
                .ok_or_else(|| RowStoreError::UnsupportedFilter(key.clone()))?;
            routed.push((field, value, inverted));
        }

        for (field, value, op) in routed {
            let pair = (field, value);
            match op {
                InvertedOp::Ne => self.descriptor.set_not_equal([pair]),
                InvertedOp::Lte => self.descriptor.set_less_than_or_equal([pair]),
                InvertedOp::Gt => self.descriptor.set_greater_than([pair]),
                InvertedOp::Lt => self.descriptor.set_less_than([pair]),
                InvertedOp::Gte => self.descriptor.set_greater_than_or_equal([pair]),
            }
        }
        self.cache = None;
        Ok(self)
    }

    /// Sets the ordering key; a leading `-` sorts descending.
    ///
    /// Only one ordering key is supported: calling this again overwrites the
    /// previous one. The stripped field name must be declared on the record.
    pub fn order_by(mut self, key: &str) -> RowStoreResult<Self> {
        let (field, descending) = match key.strip_prefix('-') {
            Some(field) => (field, true),
            None => (key, false),
        };
        if !R::field_names().contains(&field) {
            return Err(RowStoreError::InvalidField(field.to_string()));
        }
        self.descriptor.set_order_by(field, descending);
        self.cache = None;
        Ok(self)
    }

    /// Filters and executes, expecting exactly one match.
    ///
    /// Zero rows raise [`RowStoreError::DoesNotExist`], more than one
    /// [`RowStoreError::MultipleObjectsReturned`].
    pub fn get(self, lookup: impl Into<Filters>) -> RowStoreResult<R> {
        let mut result = self.filter(lookup)?;
        let records = result.fetch()?;
        match records {
            [] => Err(RowStoreError::DoesNotExist { model: model_name::<R>() }),
            [record] => Ok(record.clone()),
            _ => Err(RowStoreError::MultipleObjectsReturned { model: model_name::<R>() }),
        }
    }

    /// Gets the record matching `lookup`, creating it when absent.
    ///
    /// On [`DoesNotExist`](RowStoreError::DoesNotExist) the defaults are
    /// merged over the lookup pairs and the result is created. Returns the
    /// record and whether it was created. This is a check-then-act sequence,
    /// not an atomic upsert; concurrent callers can race.
    pub fn get_or_create(
        self,
        lookup: impl Into<Filters>,
        defaults: Row,
    ) -> RowStoreResult<(R, bool)> {
        let lookup = lookup.into();
        let mut creator = Self {
            client: self.client.clone(),
            descriptor: self.descriptor.clone(),
            cache: None,
        };

        match self.get(lookup.clone()) {
            Ok(record) => Ok((record, false)),
            Err(RowStoreError::DoesNotExist { .. }) => {
                let mut data = Row::new();
                for (key, value) in lookup.into_pairs() {
                    data.insert(key, value);
                }
                for (key, value) in defaults {
                    data.insert(key, value);
                }
                let record = creator.create(data)?;
                Ok((record, true))
            }
            Err(err) => Err(err),
        }
    }

    /// Inserts a new record and returns it, identity assigned.
    ///
    /// Terminal: executes immediately. Field names are validated before the
    /// descriptor or the store is touched.
    pub fn create(&mut self, data: Row) -> RowStoreResult<R> {
        Self::validate_fields(&data)?;
        self.descriptor.set_insert_data(data);
        self.run()?;
        self.cached()
            .first()
            .cloned()
            .ok_or_else(|| {
                RowStoreError::Contract(format!(
                    "backend returned no rows for an insert into {}",
                    R::table_name(),
                ))
            })
    }

    /// Applies a partial payload to every matching row.
    ///
    /// Terminal: executes immediately, caches the affected rows, and returns
    /// their count.
    pub fn update(&mut self, data: Row) -> RowStoreResult<usize> {
        Self::validate_fields(&data)?;
        self.descriptor.set_update_data(data);
        self.run()?;
        Ok(self.cached().len())
    }

    /// Deletes every matching row.
    ///
    /// Terminal: executes immediately, caches the pre-delete rows, and
    /// returns their count.
    pub fn delete(&mut self) -> RowStoreResult<usize> {
        self.descriptor.set_delete_mode(true);
        self.run()?;
        Ok(self.cached().len())
    }

    /// The number of matching rows.
    ///
    /// Uses the cache when one exists; otherwise asks the backend for a bare
    /// row count without materializing rows.
    pub fn count(&mut self) -> RowStoreResult<usize> {
        if let Some(cache) = &self.cache {
            return Ok(cache.len());
        }

        let mut descriptor = self.descriptor.clone();
        descriptor.set_count_mode(true);
        match self.client.execute(&descriptor)? {
            Response::Count(count) => Ok(count),
            Response::Rows(_) => Err(RowStoreError::Contract(
                "backend returned rows for a count".to_string(),
            )),
        }
    }

    /// Whether any row matches. Cache-aware like [`count`](Self::count).
    pub fn exists(&mut self) -> RowStoreResult<bool> {
        if let Some(cache) = &self.cache {
            return Ok(!cache.is_empty());
        }
        Ok(self.count()? > 0)
    }

    /// The first matching record, if any.
    pub fn first(&mut self) -> RowStoreResult<Option<R>> {
        Ok(self.fetch()?.first().cloned())
    }

    /// The last matching record, if any.
    pub fn last(&mut self) -> RowStoreResult<Option<R>> {
        Ok(self.fetch()?.last().cloned())
    }

    /// The record at `index`, if present.
    pub fn nth(&mut self, index: usize) -> RowStoreResult<Option<R>> {
        Ok(self.fetch()?.get(index).cloned())
    }

    /// Iterates the matching records, executing first when needed.
    pub fn iter(&mut self) -> RowStoreResult<std::slice::Iter<'_, R>> {
        Ok(self.fetch()?.iter())
    }

    /// The matching records as an owned vector.
    pub fn to_vec(&mut self) -> RowStoreResult<Vec<R>> {
        Ok(self.fetch()?.to_vec())
    }

    /// The number of materialized records. Unlike [`count`](Self::count),
    /// this always executes and caches the rows.
    pub fn len(&mut self) -> RowStoreResult<usize> {
        Ok(self.fetch()?.len())
    }

    /// Whether the materialized result set is empty.
    pub fn is_empty(&mut self) -> RowStoreResult<bool> {
        Ok(self.fetch()?.is_empty())
    }

    /// Executes if no cache exists yet and returns the cached records.
    fn fetch(&mut self) -> RowStoreResult<&[R]> {
        if self.cache.is_none() {
            self.run()?;
        }
        Ok(self.cached())
    }

    fn cached(&self) -> &[R] {
        self.cache.as_deref().unwrap_or_default()
    }

    /// Dispatches the descriptor and replaces the cache with freshly
    /// constructed records. The response shape is asserted against the mode.
    fn run(&mut self) -> RowStoreResult<()> {
        let rows = match self.client.execute(&self.descriptor)? {
            Response::Rows(rows) => rows,
            Response::Count(_) => {
                return Err(RowStoreError::Contract(format!(
                    "backend returned a count for {:?} mode",
                    self.descriptor.mode(),
                )));
            }
        };

        let records = rows
            .into_iter()
            .map(R::from_row)
            .collect::<RowStoreResult<Vec<R>>>()?;
        self.cache = Some(records);
        Ok(())
    }

    fn validate_fields(data: &Row) -> RowStoreResult<()> {
        for key in data.keys() {
            if !R::field_names().contains(&key.as_str()) {
                return Err(RowStoreError::InvalidField(key.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde::{Deserialize, Serialize};
    use serde_json::json;

    use super::*;
    use crate::descriptor::Mode;
    use crate::record::Schema;
    use crate::{filters, row};

    /// Records every dispatched descriptor mode and plays back canned
    /// responses in order.
    #[derive(Debug, Default)]
    struct StubBackend {
        responses: Mutex<Vec<Response>>,
        dispatched: Mutex<Vec<Mode>>,
    }

    impl StubBackend {
        fn with_responses(responses: Vec<Response>) -> Arc<Self> {
            Arc::new(Self { responses: Mutex::new(responses), dispatched: Mutex::new(Vec::new()) })
        }

        fn dispatched(&self) -> Vec<Mode> {
            self.dispatched.lock().unwrap().clone()
        }

        fn respond(&self, descriptor: &Descriptor) -> RowStoreResult<Response> {
            self.dispatched.lock().unwrap().push(descriptor.mode());
            Ok(self.responses.lock().unwrap().remove(0))
        }
    }

    impl Backend for StubBackend {
        fn table_name(&self) -> &str {
            "entity"
        }

        fn insert(&self, _: &Descriptor) -> RowStoreResult<Vec<Row>> {
            unreachable!("stub dispatches through execute")
        }

        fn update(&self, _: &Descriptor) -> RowStoreResult<Vec<Row>> {
            unreachable!("stub dispatches through execute")
        }

        fn delete(&self, _: &Descriptor) -> RowStoreResult<Vec<Row>> {
            unreachable!("stub dispatches through execute")
        }

        fn filter(&self, _: &Descriptor) -> RowStoreResult<Vec<Row>> {
            unreachable!("stub dispatches through execute")
        }

        fn count(&self, _: &Descriptor) -> RowStoreResult<usize> {
            unreachable!("stub dispatches through execute")
        }

        fn execute(&self, descriptor: &Descriptor) -> RowStoreResult<Response> {
            self.respond(descriptor)
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Entity {
        id: Option<i64>,
        name: String,
    }

    impl Schema for Entity {
        fn table_name() -> &'static str {
            "entity"
        }

        fn field_names() -> &'static [&'static str] {
            &["id", "name"]
        }

        fn id(&self) -> Option<i64> {
            self.id
        }
    }

    impl Record for Entity {
        fn client() -> Arc<dyn Backend> {
            unreachable!("tests construct query sets directly")
        }
    }

    fn rows(pairs: &[(i64, &str)]) -> Response {
        Response::Rows(
            pairs
                .iter()
                .map(|(id, name)| row! { id: id, name: name })
                .collect(),
        )
    }

    #[test]
    fn chaining_is_lazy_and_reads_execute_once() {
        let backend = StubBackend::with_responses(vec![rows(&[(1, "a"), (2, "b")])]);
        let query = QuerySet::<Entity>::new(backend.clone())
            .filter(filters! { name: "a" })
            .unwrap()
            .order_by("-id")
            .unwrap();
        assert!(backend.dispatched().is_empty());

        let mut query = query;
        assert_eq!(query.first().unwrap().unwrap().id, Some(1));
        assert_eq!(query.last().unwrap().unwrap().id, Some(2));
        assert_eq!(query.len().unwrap(), 2);
        assert_eq!(backend.dispatched(), vec![Mode::Filter]);
    }

    #[test]
    fn filters_accumulate_across_chain_links() {
        let backend = StubBackend::with_responses(vec![]);
        let query = QuerySet::<Entity>::new(backend)
            .filter(filters! { id: 1 })
            .unwrap()
            .filter(filters! { name: "a" })
            .unwrap();

        let equal = query.descriptor().equal();
        assert_eq!(
            equal,
            &[("id".to_string(), json!(1)), ("name".to_string(), json!("a"))]
        );
    }

    #[test]
    fn exclude_routes_inverted_operators() {
        let backend = StubBackend::with_responses(vec![]);
        let query = QuerySet::<Entity>::new(backend)
            .exclude(filters! { name: "a", id__lte: 2 })
            .unwrap();

        assert_eq!(query.descriptor().not_equal(), &[("name".to_string(), json!("a"))]);
        assert_eq!(query.descriptor().greater_than(), &[("id".to_string(), json!(2))]);
    }

    #[test]
    fn exclude_in_is_unsupported_and_mutates_nothing() {
        let backend = StubBackend::with_responses(vec![]);
        let result = QuerySet::<Entity>::new(backend.clone())
            .exclude(filters! { name: "a", id__in: [1, 2] });

        assert!(matches!(
            result,
            Err(RowStoreError::UnsupportedFilter(key)) if key == "id__in"
        ));
        assert!(backend.dispatched().is_empty());
    }

    #[test]
    fn invalid_filter_fails_before_backend_contact() {
        let backend = StubBackend::with_responses(vec![]);
        let result = QuerySet::<Entity>::new(backend.clone()).filter(filters! { foo: "bar" });

        assert!(matches!(
            result,
            Err(RowStoreError::InvalidFilter(key)) if key == "foo"
        ));
        assert!(backend.dispatched().is_empty());
    }

    #[test]
    fn count_short_circuits_without_cache_and_prefers_cache_after() {
        let backend =
            StubBackend::with_responses(vec![Response::Count(7), rows(&[(1, "a")])]);
        let mut query = QuerySet::<Entity>::new(backend.clone());

        assert_eq!(query.count().unwrap(), 7);
        assert_eq!(backend.dispatched(), vec![Mode::Count]);

        // Materializing populates the cache; count now reuses it.
        assert_eq!(query.len().unwrap(), 1);
        assert_eq!(query.count().unwrap(), 1);
        assert_eq!(backend.dispatched(), vec![Mode::Count, Mode::Filter]);
    }

    #[test]
    fn get_demands_exactly_one_row() {
        let backend = StubBackend::with_responses(vec![rows(&[(1, "a")])]);
        let record = QuerySet::<Entity>::new(backend).get(filters! { id: 1 }).unwrap();
        assert_eq!(record.name, "a");

        let backend = StubBackend::with_responses(vec![rows(&[])]);
        assert!(matches!(
            QuerySet::<Entity>::new(backend).get(filters! { id: 5 }),
            Err(RowStoreError::DoesNotExist { model: "Entity" })
        ));

        let backend = StubBackend::with_responses(vec![rows(&[(1, "a"), (3, "a")])]);
        assert!(matches!(
            QuerySet::<Entity>::new(backend).get(filters! { name: "a" }),
            Err(RowStoreError::MultipleObjectsReturned { model: "Entity" })
        ));
    }

    #[test]
    fn update_reports_affected_count() {
        let backend = StubBackend::with_responses(vec![rows(&[(1, "x"), (3, "x")])]);
        let mut query = QuerySet::<Entity>::new(backend.clone())
            .filter(filters! { name: "a" })
            .unwrap();

        assert_eq!(query.update(row! { name: "x" }).unwrap(), 2);
        assert_eq!(backend.dispatched(), vec![Mode::Update]);
    }

    #[test]
    fn update_with_invalid_field_leaves_descriptor_unchanged() {
        let backend = StubBackend::with_responses(vec![]);
        let mut query = QuerySet::<Entity>::new(backend.clone());

        assert!(matches!(
            query.update(row! { foo: "bar" }),
            Err(RowStoreError::InvalidField(key)) if key == "foo"
        ));
        assert!(query.descriptor().update_data().is_none());
        assert!(backend.dispatched().is_empty());
    }

    #[test]
    fn delete_caches_predelete_rows() {
        let backend = StubBackend::with_responses(vec![rows(&[(1, "a"), (2, "b")])]);
        let mut query = QuerySet::<Entity>::new(backend.clone());

        assert_eq!(query.delete().unwrap(), 2);
        assert_eq!(backend.dispatched(), vec![Mode::Delete]);
        // The cache now holds the deleted rows.
        assert_eq!(query.count().unwrap(), 2);
    }

    #[test]
    fn create_returns_first_inserted_row() {
        let backend = StubBackend::with_responses(vec![rows(&[(5, "new")])]);
        let mut query = QuerySet::<Entity>::new(backend.clone());

        let record = query.create(row! { name: "new" }).unwrap();
        assert_eq!(record, Entity { id: Some(5), name: "new".to_string() });
        assert_eq!(backend.dispatched(), vec![Mode::Insert]);
    }

    #[test]
    fn wrong_response_shape_is_a_contract_breach() {
        let backend = StubBackend::with_responses(vec![Response::Count(3)]);
        let mut query = QuerySet::<Entity>::new(backend);

        assert!(matches!(query.first(), Err(RowStoreError::Contract(_))));
    }

    #[test]
    fn order_by_validates_the_stripped_field_name() {
        let backend = StubBackend::with_responses(vec![]);
        let query = QuerySet::<Entity>::new(backend).order_by("-id").unwrap();
        let sort = query.descriptor().order_by().unwrap();
        assert_eq!(sort.field, "id");
        assert!(sort.descending);

        let backend = StubBackend::with_responses(vec![]);
        assert!(matches!(
            QuerySet::<Entity>::new(backend).order_by("-foo"),
            Err(RowStoreError::InvalidField(field)) if field == "foo"
        ));
    }

    #[test]
    fn get_or_create_creates_on_does_not_exist() {
        let backend = StubBackend::with_responses(vec![rows(&[]), rows(&[(1, "test")])]);
        let (record, created) = QuerySet::<Entity>::new(backend.clone())
            .get_or_create(filters! { name: "test" }, Row::new())
            .unwrap();

        assert!(created);
        assert_eq!(record.id, Some(1));
        assert_eq!(backend.dispatched(), vec![Mode::Filter, Mode::Insert]);
    }

    #[test]
    fn get_or_create_returns_existing_without_insert() {
        let backend = StubBackend::with_responses(vec![rows(&[(2, "test")])]);
        let (record, created) = QuerySet::<Entity>::new(backend.clone())
            .get_or_create(filters! { name: "test" }, row! { name: "other" })
            .unwrap();

        assert!(!created);
        assert_eq!(record.id, Some(2));
        assert_eq!(backend.dispatched(), vec![Mode::Filter]);
    }
}
