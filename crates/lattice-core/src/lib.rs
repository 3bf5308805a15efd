//! Core types and contracts for the Lattice data-access layer
//!
//! This crate defines the pieces every Lattice backend and pipeline share:
//!
//! - [`Envelope`] / [`RetCode`] - the uniform result shape returned to callers
//! - [`QueryDescriptor`] - parsed, validated filter/order/select input
//! - [`SemanticType`] / [`SqlValue`] - type coercion from wire text to bound
//!   parameter values
//! - [`Ability`] / [`PermissionProvider`] - per-actor column permissions
//! - [`Backend`] - the async adapter boundary a database driver implements
//!
//! The SQL builders live in `lattice-query` and the request pipeline in
//! `lattice-pipeline`; this crate stays free of any backend specifics apart
//! from the positional [`Placeholder`] syntax enum.

pub mod backend;
pub mod coerce;
pub mod descriptor;
pub mod error;
pub mod page;
pub mod permission;
pub mod retcode;

// Re-exports
pub use backend::{
    Backend, BackendError, ColumnMeta, CompiledQuery, ForeignKey, Placeholder, Record,
};
pub use coerce::{BoundFilter, BoundValue, CoerceError, SemanticType, SqlValue};
pub use descriptor::{
    Filter, Operator, OrderBy, OrderDirection, QueryDescriptor, Selection,
};
pub use error::{QueryError, QueryResult};
pub use page::{page_offset, pagination_calc, PageBlock};
pub use permission::{Ability, Action, Actor, ColumnRules, OpenAccess, PermissionProvider, RoleTable};
pub use retcode::{Envelope, RetCode};
