//! Read-query builder for Factual tables.
//!
//! Builds the parameters of a `/t/{table}` read request on top of the
//! [`factual_core`] parameter store: paging, full-text search, field
//! selection, sorting, field predicates combined with `$and` / `$or`, and
//! geographic confinement.

#![deny(missing_docs)]

pub mod query;

pub use query::{FieldBuilder, Query};

/// Convenient result alias that reuses the shared error type.
pub type Result<T> = factual_core::Result<T>;
