//! # sqlite-open-helper
//!
//! One shared, reference-counted SQLite connection per database file, with
//! scoped acquisition, transactions and AND-joined CRUD helpers on top.
//!
//! - **[`OpenHelper`]**: the application-facing handle; every operation acquires the shared
//!   connection and releases it on all exit paths
//! - **[`Repository`]**: implement per record type; `insert_many` / `update_many` come for free
//! - **[`build_where_clause`]**: `col1=? AND col2=?` plus positional values
//!
//! The lower-level pieces live in `sqlx-sqlite-shared-conn` (connection lifecycle) and
//! `sqlx-sqlite-crud` (clauses, binding, the repository contract) and are re-exported here.

mod helper;
mod transactions;

pub use helper::{OpenHelper, WriteQueryResult};
pub use transactions::Statement;

pub use sqlx_sqlite_crud::{
   Conditions, Error, Repository, Result, WhereClause, bind_value, build_where_clause,
   delete_statement, select_statement,
};
pub use sqlx_sqlite_shared_conn::{
   ConnectionFactory, ConnectionLease, SharedConnection, SharedConnectionConfig,
   SharedConnectionManager, SqliteConnectionFactory, SqliteSharedConnection,
};
