//! Filters and boolean filter trees.
//!
//! A request carries at most one [`FilterList`]: an ordered, implicitly
//! AND-ed sequence of filters. Query builders combine the newest filters of
//! several fragments into a [`FilterGroup`] to express `$and` / `$or` trees.

use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Boolean operator of a [`FilterGroup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    /// All children must match.
    And,
    /// Any child may match.
    Or,
}

impl FilterOp {
    /// Wire name of the operator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "$and",
            Self::Or => "$or",
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A search predicate that knows how to render itself.
///
/// Implementations must be immutable once built: filter objects are shared
/// by reference count between copies of a parameter store.
pub trait Filter: fmt::Debug + Send + Sync {
    /// JSON representation of this filter.
    fn to_json(&self) -> Value;

    /// String representation of this filter; compact JSON by default.
    fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }
}

/// Anything that owns a filter list which can be popped from.
pub trait Filterable {
    /// Mutable access to the filter list, if one is attached.
    fn filter_list_mut(&mut self) -> Option<&mut FilterList>;
}

/// A boolean combination of filters and nested groups.
#[derive(Debug, Clone)]
pub struct FilterGroup {
    op: FilterOp,
    filters: Vec<Arc<dyn Filter>>,
}

impl FilterGroup {
    /// Create an empty group for `op`.
    #[must_use]
    pub fn new(op: FilterOp) -> Self {
        Self {
            op,
            filters: Vec::new(),
        }
    }

    /// Create a group over existing filters, preserving their order.
    #[must_use]
    pub fn with_filters(op: FilterOp, filters: Vec<Arc<dyn Filter>>) -> Self {
        Self { op, filters }
    }

    /// Operator of this group.
    #[must_use]
    pub const fn op(&self) -> FilterOp {
        self.op
    }

    /// Children of this group in order.
    #[must_use]
    pub fn filters(&self) -> &[Arc<dyn Filter>] {
        &self.filters
    }

    /// Append a child.
    pub fn push(&mut self, filter: impl Filter + 'static) {
        self.filters.push(Arc::new(filter));
    }

    /// Append an already shared child.
    pub fn push_shared(&mut self, filter: Arc<dyn Filter>) {
        self.filters.push(filter);
    }

    /// Number of children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns true if the group has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl Filter for FilterGroup {
    fn to_json(&self) -> Value {
        let children = self.filters.iter().map(|f| f.to_json()).collect();
        let mut node = Map::new();
        node.insert(self.op.as_str().to_string(), Value::Array(children));
        Value::Object(node)
    }
}

/// The top-level filter list of a request. Implicit `$and`.
#[derive(Debug, Clone, Default)]
pub struct FilterList {
    filters: Vec<Arc<dyn Filter>>,
}

impl FilterList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter.
    pub fn push(&mut self, filter: impl Filter + 'static) {
        self.filters.push(Arc::new(filter));
    }

    /// Append an already shared filter.
    pub fn push_shared(&mut self, filter: Arc<dyn Filter>) {
        self.filters.push(filter);
    }

    /// Remove and return the newest filter.
    pub fn pop(&mut self) -> Option<Arc<dyn Filter>> {
        self.filters.pop()
    }

    /// Filter at `index`, oldest first.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Arc<dyn Filter>> {
        self.filters.get(index)
    }

    /// Number of filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns true if no filters are attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Iterate filters oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Filter>> {
        self.filters.iter()
    }

    /// JSON form: absent when empty, the sole filter itself when there is
    /// one, otherwise an `$and` group over all of them.
    #[must_use]
    pub fn to_json(&self) -> Option<Value> {
        match self.filters.as_slice() {
            [] => None,
            [single] => Some(single.to_json()),
            many => Some(FilterGroup::with_filters(FilterOp::And, many.to_vec()).to_json()),
        }
    }

    /// String form, structurally identical to [`FilterList::to_json`].
    #[must_use]
    pub fn to_json_string(&self) -> Option<String> {
        match self.filters.as_slice() {
            [] => None,
            [single] => Some(single.to_json_string()),
            many => Some(FilterGroup::with_filters(FilterOp::And, many.to_vec()).to_json_string()),
        }
    }
}

/// Comparison operator of a [`FieldFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldOp {
    /// Equal to.
    Equal,
    /// Not equal to.
    NotEqual,
    /// Full-text search within the field.
    Search,
    /// Equal to any of a list.
    In,
    /// Equal to none of a list.
    NotIn,
    /// Begins with.
    BeginsWith,
    /// Does not begin with.
    NotBeginsWith,
    /// Begins with any of a list.
    BeginsWithAny,
    /// Begins with none of a list.
    NotBeginsWithAny,
    /// Blank (or not blank, given `false`).
    Blank,
    /// Greater than.
    GreaterThan,
    /// Greater than or equal to.
    GreaterThanOrEqual,
    /// Less than.
    LessThan,
    /// Less than or equal to.
    LessThanOrEqual,
    /// Array field includes a value.
    Includes,
    /// Array field includes any of a list.
    IncludesAny,
}

impl FieldOp {
    /// Wire name of the operator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "$eq",
            Self::NotEqual => "$neq",
            Self::Search => "$search",
            Self::In => "$in",
            Self::NotIn => "$nin",
            Self::BeginsWith => "$bw",
            Self::NotBeginsWith => "$nbw",
            Self::BeginsWithAny => "$bwin",
            Self::NotBeginsWithAny => "$nbwin",
            Self::Blank => "$blank",
            Self::GreaterThan => "$gt",
            Self::GreaterThanOrEqual => "$gte",
            Self::LessThan => "$lt",
            Self::LessThanOrEqual => "$lte",
            Self::Includes => "$includes",
            Self::IncludesAny => "$includes_any",
        }
    }
}

/// A predicate on a single field: `{"<field>": {"<op>": <arg>}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    field: String,
    op: FieldOp,
    arg: Value,
}

impl FieldFilter {
    /// Create a field predicate.
    #[must_use]
    pub fn new(field: impl Into<String>, op: FieldOp, arg: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            arg: arg.into(),
        }
    }

    /// Field name.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Operator.
    #[must_use]
    pub const fn op(&self) -> FieldOp {
        self.op
    }

    /// Argument.
    #[must_use]
    pub const fn arg(&self) -> &Value {
        &self.arg
    }
}

impl Filter for FieldFilter {
    fn to_json(&self) -> Value {
        let mut predicate = Map::new();
        predicate.insert(self.op.as_str().to_string(), self.arg.clone());
        let mut node = Map::new();
        node.insert(self.field.clone(), Value::Object(predicate));
        Value::Object(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eq(field: &str, value: &str) -> FieldFilter {
        FieldFilter::new(field, FieldOp::Equal, value)
    }

    #[test]
    fn field_filter_json() {
        let filter = FieldFilter::new("region", FieldOp::In, json!(["CA", "NV"]));
        assert_eq!(filter.to_json(), json!({"region": {"$in": ["CA", "NV"]}}));
        assert_eq!(filter.to_json_string(), r#"{"region":{"$in":["CA","NV"]}}"#);
    }

    #[test]
    fn field_op_names() {
        let cases = [
            (FieldOp::Equal, "$eq"),
            (FieldOp::NotEqual, "$neq"),
            (FieldOp::Search, "$search"),
            (FieldOp::In, "$in"),
            (FieldOp::NotIn, "$nin"),
            (FieldOp::BeginsWith, "$bw"),
            (FieldOp::NotBeginsWith, "$nbw"),
            (FieldOp::BeginsWithAny, "$bwin"),
            (FieldOp::NotBeginsWithAny, "$nbwin"),
            (FieldOp::Blank, "$blank"),
            (FieldOp::GreaterThan, "$gt"),
            (FieldOp::GreaterThanOrEqual, "$gte"),
            (FieldOp::LessThan, "$lt"),
            (FieldOp::LessThanOrEqual, "$lte"),
            (FieldOp::Includes, "$includes"),
            (FieldOp::IncludesAny, "$includes_any"),
        ];
        for (op, name) in cases {
            assert_eq!(op.as_str(), name, "{op:?}");
        }
    }

    #[test]
    fn filter_group_json_nests() {
        let mut inner = FilterGroup::new(FilterOp::Or);
        inner.push(eq("name", "a"));
        inner.push(eq("name", "b"));

        let mut outer = FilterGroup::new(FilterOp::And);
        outer.push(inner);
        outer.push(eq("country", "us"));

        assert_eq!(outer.op(), FilterOp::And);
        assert_eq!(outer.len(), 2);
        assert_eq!(
            outer.to_json(),
            json!({"$and": [
                {"$or": [{"name": {"$eq": "a"}}, {"name": {"$eq": "b"}}]},
                {"country": {"$eq": "us"}}
            ]})
        );
    }

    #[test]
    fn empty_list_is_absent() {
        let list = FilterList::new();
        assert!(list.is_empty());
        assert_eq!(list.to_json(), None);
        assert_eq!(list.to_json_string(), None);
    }

    #[test]
    fn single_element_list_is_unwrapped() {
        let mut list = FilterList::new();
        list.push(eq("name", "a"));
        assert_eq!(list.to_json(), Some(json!({"name": {"$eq": "a"}})));
        assert_eq!(
            list.to_json_string().as_deref(),
            Some(r#"{"name":{"$eq":"a"}}"#)
        );
    }

    #[test]
    fn multi_element_list_wraps_in_and() {
        let mut list = FilterList::new();
        list.push(eq("name", "a"));
        list.push(eq("region", "CA"));

        let expected = json!({"$and": [{"name": {"$eq": "a"}}, {"region": {"$eq": "CA"}}]});
        assert_eq!(list.to_json(), Some(expected.clone()));

        let parsed: Value = serde_json::from_str(&list.to_json_string().unwrap()).unwrap();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn pop_returns_newest() {
        let mut list = FilterList::new();
        list.push(eq("name", "a"));
        list.push(eq("name", "b"));

        let popped = list.pop().unwrap();
        assert_eq!(popped.to_json(), json!({"name": {"$eq": "b"}}));
        assert_eq!(list.len(), 1);
        assert_eq!(list.get(0).unwrap().to_json(), json!({"name": {"$eq": "a"}}));
    }

    #[test]
    fn filter_op_display() {
        assert_eq!(FilterOp::And.to_string(), "$and");
        assert_eq!(FilterOp::Or.to_string(), "$or");
    }
}
