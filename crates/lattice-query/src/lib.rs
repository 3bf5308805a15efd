//! Backend-agnostic SQL compilers
//!
//! Three builders - [`SelectBuilder`], [`UpdateBuilder`], [`InsertBuilder`] -
//! accumulate clauses and finalize into a [`CompiledQuery`] (SQL text plus
//! positional parameters) via `sql()`. Builders are reusable after an
//! explicit `reset()`.
//!
//! The only backend-specific detail is the positional placeholder syntax,
//! injected as a [`Placeholder`] at construction. Identifiers are validated
//! and double-quoted; values never appear in the SQL text.
//!
//! [`CompiledQuery`]: lattice_core::CompiledQuery
//! [`Placeholder`]: lattice_core::Placeholder

mod clause;
mod error;
mod insert;
mod select;
mod update;

pub use error::{CompileError, CompileResult};
pub use insert::InsertBuilder;
pub use select::SelectBuilder;
pub use update::UpdateBuilder;
