//! Request parameter store.
//!
//! [`ParameterStore`] maps parameter names to [`TaggedValue`]s. Each tag
//! decides how the value is rendered: plain string conversion, a JSON blob,
//! or a comma-joined set. The store renders as a URL query string, a flat
//! string map, or a JSON object.
//!
//! Slots that hold the wrong variant for an operation are silently replaced
//! with a fresh value of the right variant rather than raising an error.

use indexmap::IndexSet;
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace};
use url::form_urlencoded;

use crate::error::Result;
use crate::filter::{Filter, FilterGroup, FilterList, FilterOp, Filterable};

/// Reserved parameter name holding the request's [`FilterList`].
pub const FILTERS_KEY: &str = "filters";

/// Payload of a [`TaggedValue::Raw`] slot.
#[derive(Debug, Clone)]
pub enum RawValue {
    /// Text, rendered as-is.
    Text(String),
    /// A number, rendered in its canonical decimal form.
    Number(Number),
    /// A boolean, rendered as `true` / `false`.
    Bool(bool),
    /// The request filter list. Only ever stored under [`FILTERS_KEY`].
    Filters(FilterList),
}

impl RawValue {
    /// String form of the value; `None` for an empty filter list.
    #[must_use]
    pub fn to_param_string(&self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text.clone()),
            Self::Number(number) => Some(number.to_string()),
            Self::Bool(flag) => Some(flag.to_string()),
            Self::Filters(list) => list.to_json_string(),
        }
    }

    /// JSON form of the value. Scalars become JSON strings; a filter list
    /// becomes its filter tree.
    #[must_use]
    pub fn to_json(&self) -> Option<Value> {
        match self {
            Self::Filters(list) => list.to_json(),
            other => other.to_param_string().map(Value::String),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for RawValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        // NaN and infinities have no JSON number form.
        Number::from_f64(value).map_or_else(|| Self::Text(value.to_string()), Self::Number)
    }
}

macro_rules! raw_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for RawValue {
                fn from(value: $ty) -> Self {
                    Self::Number(Number::from(value))
                }
            }
        )*
    };
}

raw_from_integer!(i32, i64, u32, u64, usize);

/// A parameter value tagged with its serialization strategy.
#[derive(Debug, Clone)]
pub enum TaggedValue {
    /// Rendered through plain string conversion.
    Raw(RawValue),
    /// Rendered as compact JSON.
    Json(Value),
    /// Distinct items rendered joined with `,`, in first-insertion order.
    CommaSet(IndexSet<String>),
}

impl TaggedValue {
    /// String form used for query strings and flat maps. `None` means the
    /// parameter is absent and must be skipped.
    #[must_use]
    pub fn to_param_string(&self) -> Option<String> {
        match self {
            Self::Raw(raw) => raw.to_param_string(),
            Self::Json(value) => Some(value.to_string()),
            Self::CommaSet(items) => Some(join_items(items)),
        }
    }

    /// JSON form used when the parameter is embedded in a JSON payload.
    #[must_use]
    pub fn to_json(&self) -> Option<Value> {
        match self {
            Self::Raw(raw) => raw.to_json(),
            Self::Json(value) => Some(value.clone()),
            Self::CommaSet(items) => Some(Value::String(join_items(items))),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Raw(RawValue::Filters(_)) => "filters",
            Self::Raw(_) => "raw",
            Self::Json(_) => "json",
            Self::CommaSet(_) => "comma_set",
        }
    }
}

fn join_items(items: &IndexSet<String>) -> String {
    items.iter().map(String::as_str).collect::<Vec<_>>().join(",")
}

/// Holds request parameters and renders them for transport.
///
/// Keys are kept in sorted order so every rendering is deterministic.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    params: BTreeMap<String, TaggedValue>,
}

impl ParameterStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Independent copy of this store.
    ///
    /// Filter lists and comma sets are duplicated, so mutating them on one
    /// side never shows through on the other. Filter objects themselves are
    /// immutable and shared.
    #[must_use]
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&TaggedValue> {
        self.params.get(key)
    }

    /// Returns true if `key` has a value.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Remove and return the value under `key`.
    pub fn remove(&mut self, key: &str) -> Option<TaggedValue> {
        self.params.remove(key)
    }

    /// Number of parameters, including ones that render as absent.
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns true if no parameters are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterate parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TaggedValue)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Set a parameter rendered by plain string conversion.
    pub fn set_raw(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        self.params.insert(key.into(), TaggedValue::Raw(value.into()));
    }

    /// Set a parameter rendered as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`](crate::Error::Encoding) if `value` has no
    /// JSON representation. The store is left unchanged.
    pub fn set_json<T>(&mut self, key: impl Into<String>, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let value = serde_json::to_value(value)?;
        self.set_json_value(key, value);
        Ok(())
    }

    /// Set a parameter rendered as JSON from an already built value.
    pub fn set_json_value(&mut self, key: impl Into<String>, value: Value) {
        self.params.insert(key.into(), TaggedValue::Json(value));
    }

    /// Add `value` to the comma-joined set under `key`, replacing whatever
    /// else the slot held.
    pub fn add_to_comma_set(&mut self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        let mut items = match self.params.remove(&key) {
            Some(TaggedValue::CommaSet(items)) => items,
            Some(other) => {
                debug!(key = %key, found = other.kind(), "replacing slot with comma set");
                IndexSet::new()
            }
            None => IndexSet::new(),
        };
        items.insert(value.to_string());
        self.params.insert(key, TaggedValue::CommaSet(items));
    }

    /// Items of the comma-joined set under `key`, or `None` if the slot is
    /// absent or holds another variant.
    #[must_use]
    pub fn comma_set(&self, key: &str) -> Option<Vec<&str>> {
        match self.params.get(key) {
            Some(TaggedValue::CommaSet(items)) => Some(items.iter().map(String::as_str).collect()),
            _ => None,
        }
    }

    /// Set `field` on the JSON object under `key`.
    ///
    /// An absent slot, or one holding anything other than a JSON object, is
    /// replaced by an empty object first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`](crate::Error::Encoding) if `value` has no
    /// JSON representation. The store is left unchanged.
    pub fn merge_json_field<T>(
        &mut self,
        key: impl Into<String>,
        field: impl Into<String>,
        value: &T,
    ) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let value = serde_json::to_value(value)?;
        let key = key.into();
        let mut object = match self.params.remove(&key) {
            Some(TaggedValue::Json(Value::Object(object))) => object,
            Some(other) => {
                debug!(key = %key, found = other.kind(), "replacing slot with JSON object");
                Map::new()
            }
            None => Map::new(),
        };
        object.insert(field.into(), value);
        self.params.insert(key, TaggedValue::Json(Value::Object(object)));
        Ok(())
    }

    /// The filter list under [`FILTERS_KEY`], if that slot holds one.
    #[must_use]
    pub fn filter_list(&self) -> Option<&FilterList> {
        match self.params.get(FILTERS_KEY) {
            Some(TaggedValue::Raw(RawValue::Filters(list))) => Some(list),
            _ => None,
        }
    }

    /// Mutable access to the filter list under [`FILTERS_KEY`].
    pub fn filter_list_mut(&mut self) -> Option<&mut FilterList> {
        match self.params.get_mut(FILTERS_KEY) {
            Some(TaggedValue::Raw(RawValue::Filters(list))) => Some(list),
            _ => None,
        }
    }

    /// Append `filter` as the newest filter of this request.
    pub fn add_filter(&mut self, filter: impl Filter + 'static) {
        self.add_shared_filter(Arc::new(filter));
    }

    /// Append an already shared filter as the newest filter of this request.
    pub fn add_shared_filter(&mut self, filter: Arc<dyn Filter>) {
        let mut list = match self.params.remove(FILTERS_KEY) {
            Some(TaggedValue::Raw(RawValue::Filters(list))) => list,
            Some(other) => {
                debug!(found = other.kind(), "replacing filters slot with filter list");
                FilterList::new()
            }
            None => FilterList::new(),
        };
        list.push_shared(filter);
        self.params
            .insert(FILTERS_KEY.to_string(), TaggedValue::Raw(RawValue::Filters(list)));
    }

    /// Pop the newest filter from each source, in order, and add them to
    /// this store as one [`FilterGroup`] under `op`.
    ///
    /// Sources without filters contribute nothing. The group is added even
    /// if every source was empty.
    pub fn pop_filters(&mut self, op: FilterOp, sources: &mut [&mut dyn Filterable]) {
        let mut group = FilterGroup::new(op);
        for source in sources.iter_mut() {
            if let Some(filter) = source.filter_list_mut().and_then(FilterList::pop) {
                group.push_shared(filter);
            }
        }
        trace!(op = %op, popped = group.len(), "grouping popped filters");
        self.add_filter(group);
    }

    /// Render as `name=value` pairs joined with `&`.
    ///
    /// Values are percent-encoded when `url_encode` is set. Parameters that
    /// render as absent are skipped. Pairs from `additional` follow this
    /// store's pairs; duplicate names are kept.
    #[must_use]
    pub fn to_query_string(&self, additional: Option<&ParameterStore>, url_encode: bool) -> String {
        let pairs = self.to_query_pairs(additional, url_encode);
        debug!(pairs = pairs.len(), url_encode, "rendered query string");
        pairs.join("&")
    }

    /// Rendered `name=value` pairs, this store first, then `additional`.
    #[must_use]
    pub fn to_query_pairs(
        &self,
        additional: Option<&ParameterStore>,
        url_encode: bool,
    ) -> Vec<String> {
        let mut pairs: Vec<String> = self
            .params
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_param_string()
                    .map(|value| url_pair(name, &value, url_encode))
            })
            .collect();
        if let Some(additional) = additional {
            pairs.extend(additional.to_query_pairs(None, url_encode));
        }
        pairs
    }

    /// Flat name to string mapping, for headers and form bodies. Parameters
    /// that render as absent are omitted.
    #[must_use]
    pub fn to_flat_string_map(&self) -> BTreeMap<String, String> {
        self.params
            .iter()
            .filter_map(|(name, value)| value.to_param_string().map(|v| (name.clone(), v)))
            .collect()
    }

    /// JSON object of every parameter's JSON form. Parameters that render as
    /// absent are omitted.
    #[must_use]
    pub fn to_json_object(&self) -> Value {
        let object: Map<String, Value> = self
            .params
            .iter()
            .filter_map(|(name, value)| value.to_json().map(|v| (name.clone(), v)))
            .collect();
        Value::Object(object)
    }
}

impl Filterable for ParameterStore {
    fn filter_list_mut(&mut self) -> Option<&mut FilterList> {
        ParameterStore::filter_list_mut(self)
    }
}

fn url_pair(name: &str, value: &str, url_encode: bool) -> String {
    if url_encode {
        let encoded: String = form_urlencoded::byte_serialize(value.as_bytes()).collect();
        format!("{name}={encoded}")
    } else {
        format!("{name}={value}")
    }
}
