//! # sqlx-sqlite-crud
//!
//! Small CRUD helpers for SQLite on sqlx:
//!
//! - **[`build_where_clause`]**: AND-joined equality filters with positional values
//! - **[`select_statement`] / [`delete_statement`]**: Whole statements built from the same filters
//! - **[`bind_value`]**: Binds JSON values as their closest SQLite type
//! - **[`Repository`]**: Per-record-type CRUD contract with sequential batch insert/update
//!
//! Column names, table names and ORDER BY terms are validated before they are
//! interpolated into SQL; values always travel as bound parameters.

mod bind;
mod error;
mod repository;
mod where_clause;

pub use bind::bind_value;
pub use error::{Error, Result};
pub use repository::Repository;
pub use where_clause::{
   Conditions, WhereClause, build_where_clause, delete_statement, select_statement,
   validate_column_name, validate_order_by, validate_table_name,
};
