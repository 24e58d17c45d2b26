//! # factual-core
//!
//! Core types for building requests against the Factual read API.
//!
//! This crate holds the request parameter model shared by query builders: a
//! store of tagged parameter values that renders itself as a URL query
//! string, a flat string map, or a JSON object graph, together with the
//! filter tree used to express boolean predicates.
//!
//! ## Modules
//!
//! - [`error`] - Error type and result alias
//! - [`config`] - Driver configuration and validation
//! - [`params`] - Parameter store and tagged values
//! - [`filter`] - Filters, filter groups, and the top-level filter list
//! - [`shape`] - Geographic shapes used to confine results

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod filter;
pub mod params;
pub mod shape;

// Re-export commonly used types
pub use config::DriverConfig;
pub use error::{Error, Result};
pub use filter::{FieldFilter, FieldOp, Filter, FilterGroup, FilterList, FilterOp, Filterable};
pub use params::{ParameterStore, RawValue, TaggedValue, FILTERS_KEY};
pub use shape::{Circle, Shape};
