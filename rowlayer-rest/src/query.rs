//! Query translation from request descriptors to PostgREST query strings.
//!
//! This module translates a descriptor's accumulated predicate categories,
//! field selection, and ordering into the `field=op.value` query parameters
//! the REST endpoint executes.

use serde_json::Value;

use rowlayer_core::descriptor::Descriptor;

/// Renders a JSON value as a PostgREST operand: strings unquoted, everything
/// else in its JSON form.
fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Translates a descriptor into PostgREST query parameters.
///
/// Predicate pairs keep their insertion order and repeat freely; the endpoint
/// AND-combines repeated parameters for the same field. The payload parts of
/// the descriptor (insert and update data) travel in the request body and are
/// not represented here.
pub(crate) fn query_params(descriptor: &Descriptor) -> Vec<(String, String)> {
    let mut params = Vec::new();

    if let Some(fields) = descriptor.select_fields() {
        params.push(("select".to_string(), fields.join(",")));
    }

    let categories: [(&str, &[(String, Value)]); 6] = [
        ("eq", descriptor.equal()),
        ("neq", descriptor.not_equal()),
        ("lt", descriptor.less_than()),
        ("lte", descriptor.less_than_or_equal()),
        ("gt", descriptor.greater_than()),
        ("gte", descriptor.greater_than_or_equal()),
    ];
    for (op, pairs) in categories {
        for (field, value) in pairs {
            params.push((field.clone(), format!("{op}.{}", render(value))));
        }
    }

    for (field, value) in descriptor.included() {
        let items = match value {
            Value::Array(items) => items.iter().map(render).collect::<Vec<_>>().join(","),
            other => render(other),
        };
        params.push((field.clone(), format!("in.({items})")));
    }

    if let Some(sort) = descriptor.order_by() {
        let direction = if sort.descending { "desc" } else { "asc" };
        params.push(("order".to_string(), format!("{}.{direction}", sort.field)));
    }

    params
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn pairs(params: &[(String, String)]) -> Vec<(&str, &str)> {
        params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }

    #[test]
    fn empty_descriptor_yields_no_params() {
        assert!(query_params(&Descriptor::new()).is_empty());
    }

    #[test]
    fn strings_render_unquoted() {
        let mut descriptor = Descriptor::new();
        descriptor.set_equal([("name".to_string(), json!("test_name"))]);

        assert_eq!(pairs(&query_params(&descriptor)), vec![("name", "eq.test_name")]);
    }

    #[test]
    fn every_category_gets_its_operator() {
        let mut descriptor = Descriptor::new();
        descriptor.set_equal([("a".to_string(), json!(1))]);
        descriptor.set_not_equal([("b".to_string(), json!(2))]);
        descriptor.set_less_than([("c".to_string(), json!(3))]);
        descriptor.set_less_than_or_equal([("d".to_string(), json!(4))]);
        descriptor.set_greater_than([("e".to_string(), json!(5))]);
        descriptor.set_greater_than_or_equal([("f".to_string(), json!(6))]);

        assert_eq!(
            pairs(&query_params(&descriptor)),
            vec![
                ("a", "eq.1"),
                ("b", "neq.2"),
                ("c", "lt.3"),
                ("d", "lte.4"),
                ("e", "gt.5"),
                ("f", "gte.6"),
            ]
        );
    }

    #[test]
    fn membership_renders_a_parenthesized_list() {
        let mut descriptor = Descriptor::new();
        descriptor.set_included([("id".to_string(), json!([1, 3]))]);
        descriptor.set_included([("name".to_string(), json!(["a", "b"]))]);

        assert_eq!(
            pairs(&query_params(&descriptor)),
            vec![("id", "in.(1,3)"), ("name", "in.(a,b)")]
        );
    }

    #[test]
    fn repeated_pairs_repeat_in_order() {
        let mut descriptor = Descriptor::new();
        descriptor.set_greater_than([("id".to_string(), json!(1))]);
        descriptor.set_greater_than([("id".to_string(), json!(5))]);

        assert_eq!(
            pairs(&query_params(&descriptor)),
            vec![("id", "gt.1"), ("id", "gt.5")]
        );
    }

    #[test]
    fn selection_and_ordering() {
        let mut descriptor = Descriptor::new();
        descriptor.set_select_fields(["id".to_string(), "name".to_string()]);
        descriptor.set_order_by("id", true);

        assert_eq!(
            pairs(&query_params(&descriptor)),
            vec![("select", "id,name"), ("order", "id.desc")]
        );

        let mut descriptor = Descriptor::new();
        descriptor.set_order_by("name", false);
        assert_eq!(pairs(&query_params(&descriptor)), vec![("order", "name.asc")]);
    }
}
