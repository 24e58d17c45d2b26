//! Integration tests for composing filter trees across parameter stores.
//!
//! A caller builds independent predicate chains on separate stores, then
//! combines their newest predicates on the request store.

use factual_core::{
    FieldFilter, FieldOp, Filter, FilterOp, ParameterStore, TaggedValue, FILTERS_KEY,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn eq(field: &str, value: &str) -> FieldFilter {
    FieldFilter::new(field, FieldOp::Equal, value)
}

/// Filters parameter parsed back from the encoded query string.
fn decoded_filters(params: &ParameterStore) -> Option<Value> {
    let query = params.to_query_string(None, true);
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == FILTERS_KEY)
        .map(|(_, v)| serde_json::from_str(&v).expect("filters parameter is JSON"))
}

/// A caller-owned filter type, rendered with its own string form.
#[derive(Debug)]
struct Literal(&'static str);

impl Filter for Literal {
    fn to_json(&self) -> Value {
        serde_json::from_str(self.0).expect("literal filter is JSON")
    }

    fn to_json_string(&self) -> String {
        self.0.to_string()
    }
}

#[test]
fn test_pop_filters_leaves_remaining_and_appends_group() {
    let mut store_a = ParameterStore::new();
    store_a.add_filter(eq("f", "1"));
    store_a.add_filter(eq("f", "2"));
    let mut store_b = ParameterStore::new();
    store_b.add_filter(eq("g", "1"));

    let mut request = ParameterStore::new();
    request.pop_filters(FilterOp::Or, &mut [&mut store_a, &mut store_b]);

    assert_eq!(store_a.filter_list().map(|l| l.len()), Some(1));
    assert_eq!(store_b.filter_list().map(|l| l.len()), Some(0));
    assert_eq!(
        decoded_filters(&request),
        Some(json!({"$or": [{"f": {"$eq": "2"}}, {"g": {"$eq": "1"}}]}))
    );

    // The drained store renders no filters at all.
    assert_eq!(decoded_filters(&store_b), None);
    assert_eq!(store_b.to_query_string(None, true), "");
}

#[test]
fn test_nested_groups_render_consistently() {
    let mut left = ParameterStore::new();
    left.add_filter(eq("name", "a"));
    let mut right = ParameterStore::new();
    right.add_filter(eq("name", "b"));

    let mut request = ParameterStore::new();
    request.add_filter(eq("country", "us"));
    request.pop_filters(FilterOp::Or, &mut [&mut left, &mut right]);

    let expected = json!({"$and": [
        {"country": {"$eq": "us"}},
        {"$or": [{"name": {"$eq": "a"}}, {"name": {"$eq": "b"}}]}
    ]});

    // JSON form and string form agree structurally.
    assert_eq!(request.to_json_object()[FILTERS_KEY], expected);
    let flat = request.to_flat_string_map();
    let reparsed: Value = serde_json::from_str(&flat[FILTERS_KEY]).unwrap();
    assert_eq!(reparsed, expected);
    assert_eq!(decoded_filters(&request), Some(expected));
}

#[test]
fn test_caller_filters_use_their_own_string_form() {
    let mut request = ParameterStore::new();
    request.add_filter(Literal(r#"{"rating":{"$gt":4}}"#));

    match request.get(FILTERS_KEY) {
        Some(TaggedValue::Raw(_)) => {}
        other => panic!("filters slot holds {other:?}"),
    }
    assert_eq!(
        request.to_query_string(None, false),
        r#"filters={"rating":{"$gt":4}}"#
    );
}

#[test]
fn test_shared_filters_survive_copy() {
    let shared: Arc<dyn Filter> = Arc::new(eq("name", "a"));
    let mut original = ParameterStore::new();
    original.add_shared_filter(Arc::clone(&shared));

    let mut forked = original.copy();
    forked.filter_list_mut().unwrap().pop();

    assert_eq!(original.filter_list().unwrap().len(), 1);
    assert!(forked.filter_list().unwrap().is_empty());
    assert_eq!(Arc::strong_count(&shared), 2);
}
