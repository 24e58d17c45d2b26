//! Table read queries.

use factual_core::filter::{FieldFilter, FieldOp, Filter, FilterList, FilterOp, Filterable};
use factual_core::params::ParameterStore;
use factual_core::shape::Shape;
use factual_core::{DriverConfig, Error};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;
use url::Url;

use crate::Result;

const LIMIT: &str = "limit";
const OFFSET: &str = "offset";
const SEARCH: &str = "q";
const SELECT: &str = "select";
const SORT: &str = "sort";
const INCLUDE_COUNT: &str = "include_count";
const GEO: &str = "geo";

/// A read query against a Factual table.
///
/// Builder methods consume and return the query so calls chain:
///
/// ```
/// use factual_query::Query;
///
/// let query = Query::new()
///     .search("coffee")
///     .field("region")
///     .equal("CA")
///     .limit(10);
/// assert!(query.to_url_query().contains("limit=10"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Query {
    params: ParameterStore,
}

impl Query {
    /// Create an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum number of rows to return.
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.params.set_raw(LIMIT, limit);
        self
    }

    /// Number of rows to skip.
    #[must_use]
    pub fn offset(mut self, offset: u32) -> Self {
        self.params.set_raw(OFFSET, offset);
        self
    }

    /// Full-text search across the table.
    #[must_use]
    pub fn search(mut self, text: impl Into<String>) -> Self {
        let text: String = text.into();
        self.params.set_raw(SEARCH, text);
        self
    }

    /// Restrict the returned columns; call once per field.
    #[must_use]
    pub fn select(mut self, field: impl Into<String>) -> Self {
        let field: String = field.into();
        self.params.add_to_comma_set(SELECT, field);
        self
    }

    /// Sort ascending by `field`.
    #[must_use]
    pub fn sort_asc(mut self, field: &str) -> Self {
        self.params.add_to_comma_set(SORT, format!("{field}:asc"));
        self
    }

    /// Sort descending by `field`.
    #[must_use]
    pub fn sort_desc(mut self, field: &str) -> Self {
        self.params.add_to_comma_set(SORT, format!("{field}:desc"));
        self
    }

    /// Ask for the total row count alongside the results.
    #[must_use]
    pub fn include_row_count(mut self, include: bool) -> Self {
        self.params.set_raw(INCLUDE_COUNT, include);
        self
    }

    /// Confine results to a geographic shape.
    #[must_use]
    pub fn within(mut self, shape: &impl Shape) -> Self {
        self.params.set_json_value(GEO, shape.to_json());
        self
    }

    /// Add a caller-defined filter.
    #[must_use]
    pub fn filter(mut self, filter: impl Filter + 'static) -> Self {
        self.params.add_filter(filter);
        self
    }

    /// Start a predicate on `field`.
    pub fn field(self, field: impl Into<String>) -> FieldBuilder {
        FieldBuilder {
            query: self,
            field: field.into(),
        }
    }

    /// Combine the newest filter of each fragment under `$and`.
    #[must_use]
    pub fn and(mut self, fragments: &mut [&mut dyn Filterable]) -> Self {
        self.params.pop_filters(FilterOp::And, fragments);
        self
    }

    /// Combine the newest filter of each fragment under `$or`.
    #[must_use]
    pub fn or(mut self, fragments: &mut [&mut dyn Filterable]) -> Self {
        self.params.pop_filters(FilterOp::Or, fragments);
        self
    }

    /// Underlying parameters.
    #[must_use]
    pub fn params(&self) -> &ParameterStore {
        &self.params
    }

    /// Consume the query, returning its parameters.
    #[must_use]
    pub fn into_params(self) -> ParameterStore {
        self.params
    }

    /// Percent-encoded query string.
    #[must_use]
    pub fn to_url_query(&self) -> String {
        self.params.to_query_string(None, true)
    }

    /// Query string rendered as `config` asks.
    #[must_use]
    pub fn to_url_query_with(&self, config: &DriverConfig) -> String {
        self.params.to_query_string(None, config.url_encode)
    }

    /// Parameters as a flat string map.
    #[must_use]
    pub fn to_param_map(&self) -> BTreeMap<String, String> {
        self.params.to_flat_string_map()
    }

    /// Full read URL for `table`: `{base_url}/t/{table}?{query}`.
    ///
    /// The table name is appended as a single percent-encoded path segment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] for an empty table name, `.`, `..`,
    /// or one containing `/`, and [`Error::InvalidUrl`] if the base URL is
    /// unusable.
    pub fn to_url(&self, config: &DriverConfig, table: &str) -> Result<Url> {
        if matches!(table, "" | "." | "..") || table.contains('/') {
            return Err(Error::InvalidRequest(format!("invalid table name: {table:?}")));
        }

        let mut url = config.parse_base_url()?;
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|()| {
                Error::InvalidUrl(format!(
                    "base URL cannot carry a path: {}",
                    config.base_url
                ))
            })?
            .pop_if_empty()
            .push("t")
            .push(table);

        let query = self.to_url_query_with(config);
        if !query.is_empty() {
            url.set_query(Some(&query));
        }

        debug!(table, url = %url, "assembled read URL");
        Ok(url)
    }
}

impl Filterable for Query {
    fn filter_list_mut(&mut self) -> Option<&mut FilterList> {
        self.params.filter_list_mut()
    }
}

/// Pending predicate on one field. Each operator method appends a
/// [`FieldFilter`] and hands the query back.
#[derive(Debug)]
#[must_use = "a field predicate does nothing until an operator is applied"]
pub struct FieldBuilder {
    query: Query,
    field: String,
}

impl FieldBuilder {
    fn apply(self, op: FieldOp, arg: Value) -> Query {
        let Self { query, field } = self;
        query.filter(FieldFilter::new(field, op, arg))
    }

    /// Field equals `value`.
    pub fn equal(self, value: impl Into<Value>) -> Query {
        self.apply(FieldOp::Equal, value.into())
    }

    /// Field does not equal `value`.
    pub fn not_equal(self, value: impl Into<Value>) -> Query {
        self.apply(FieldOp::NotEqual, value.into())
    }

    /// Full-text search within the field.
    pub fn search(self, text: impl Into<String>) -> Query {
        self.apply(FieldOp::Search, Value::String(text.into()))
    }

    /// Field equals any of `values`.
    pub fn in_list<I, V>(self, values: I) -> Query
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.apply(FieldOp::In, to_array(values))
    }

    /// Field equals none of `values`.
    pub fn not_in_list<I, V>(self, values: I) -> Query
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.apply(FieldOp::NotIn, to_array(values))
    }

    /// Field begins with `prefix`.
    pub fn begins_with(self, prefix: impl Into<String>) -> Query {
        self.apply(FieldOp::BeginsWith, Value::String(prefix.into()))
    }

    /// Field does not begin with `prefix`.
    pub fn not_begins_with(self, prefix: impl Into<String>) -> Query {
        self.apply(FieldOp::NotBeginsWith, Value::String(prefix.into()))
    }

    /// Field begins with any of `prefixes`.
    pub fn begins_with_any<I, V>(self, prefixes: I) -> Query
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.apply(FieldOp::BeginsWithAny, to_array(prefixes))
    }

    /// Field begins with none of `prefixes`.
    pub fn not_begins_with_any<I, V>(self, prefixes: I) -> Query
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.apply(FieldOp::NotBeginsWithAny, to_array(prefixes))
    }

    /// Field is blank.
    pub fn blank(self) -> Query {
        self.apply(FieldOp::Blank, Value::Bool(true))
    }

    /// Field is not blank.
    pub fn not_blank(self) -> Query {
        self.apply(FieldOp::Blank, Value::Bool(false))
    }

    /// Field is greater than `value`.
    pub fn greater_than(self, value: impl Into<Value>) -> Query {
        self.apply(FieldOp::GreaterThan, value.into())
    }

    /// Field is greater than or equal to `value`.
    pub fn greater_than_or_equal(self, value: impl Into<Value>) -> Query {
        self.apply(FieldOp::GreaterThanOrEqual, value.into())
    }

    /// Field is less than `value`.
    pub fn less_than(self, value: impl Into<Value>) -> Query {
        self.apply(FieldOp::LessThan, value.into())
    }

    /// Field is less than or equal to `value`.
    pub fn less_than_or_equal(self, value: impl Into<Value>) -> Query {
        self.apply(FieldOp::LessThanOrEqual, value.into())
    }

    /// Array field includes `value`.
    pub fn includes(self, value: impl Into<Value>) -> Query {
        self.apply(FieldOp::Includes, value.into())
    }

    /// Array field includes any of `values`.
    pub fn includes_any<I, V>(self, values: I) -> Query
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.apply(FieldOp::IncludesAny, to_array(values))
    }
}

fn to_array<I, V>(values: I) -> Value
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    Value::Array(values.into_iter().map(Into::into).collect())
}
