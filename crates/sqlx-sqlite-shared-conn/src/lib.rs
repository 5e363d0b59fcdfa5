//! # sqlx-sqlite-shared-conn
//!
//! A reference-counted shared SQLite connection for mobile and desktop
//! applications, built on SQLx.
//!
//! ## Core Types
//!
//! - **[`SharedConnectionManager`]**: Opens one connection on first use, shares it, closes it
//!   when the last user releases it
//! - **[`ConnectionLease`]**: One counted reference; consumed by `release`
//! - **[`SqliteConnectionFactory`]**: Opens a read-write SQLite database as a one-connection pool
//! - **[`SharedConnectionConfig`]**: Settings for the opened connection
//! - **[`Error`]**: Error type for connection operations
//!
//! ## Architecture
//!
//! - **One connection**: Opening and closing SQLite handles is expensive and several handles on
//!   the same file contend for its lock, so every caller shares one
//! - **Lazy open**: Nothing is opened until the first acquire
//! - **Counted close**: The connection closes exactly when the last lease is released
//! - **Pluggable driver**: [`ConnectionFactory`] and [`SharedConnection`] decouple the lifecycle
//!   from SQLx

mod config;
mod connection;
mod error;
mod lease;
mod manager;
mod sqlite;

// Re-export public types
pub use config::SharedConnectionConfig;
pub use connection::{ConnectionFactory, SharedConnection};
pub use error::{Error, Result};
pub use lease::ConnectionLease;
pub use manager::SharedConnectionManager;
pub use sqlite::SqliteConnectionFactory;

/// Manager sharing one SQLite connection
pub type SqliteSharedConnection = SharedConnectionManager<SqliteConnectionFactory>;
