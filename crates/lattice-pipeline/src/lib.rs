//! Request execution pipeline
//!
//! Ties the Lattice pieces together per request: parse the wire input into
//! a descriptor, resolve the actor's ability, coerce values against column
//! metadata, compile SQL, execute against the backend, and post-filter the
//! result - aborting on the first failure and returning an [`Envelope`]
//! either way.
//!
//! A [`TableBinding`] owns the per-table column metadata (fetched once,
//! single-flight); a [`TableView`] exposes the four operations: fetch_one,
//! fetch_list, update, insert.
//!
//! [`Envelope`]: lattice_core::Envelope

pub mod binding;
pub mod params;
pub mod view;

// Re-exports
pub use binding::{ColumnSet, TableBinding};
pub use params::QueryParams;
pub use view::TableView;
