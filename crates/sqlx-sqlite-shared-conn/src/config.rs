//! Configuration for the shared SQLite connection

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the connection opened by [`SqliteConnectionFactory`]
///
/// # Examples
///
/// ```
/// use sqlx_sqlite_shared_conn::SharedConnectionConfig;
/// use std::time::Duration;
///
/// // Use defaults
/// let config = SharedConnectionConfig::default();
///
/// // Override just one field
/// let config = SharedConnectionConfig {
///     busy_timeout: Duration::from_secs(1),
///     ..Default::default()
/// };
/// ```
///
/// [`SqliteConnectionFactory`]: crate::SqliteConnectionFactory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SharedConnectionConfig {
   /// How long a statement waits on a locked database file before failing
   ///
   /// Default: 5 seconds
   pub busy_timeout: Duration,

   /// Create the database file (and its parent directory) when missing
   ///
   /// Default: true
   pub create_if_missing: bool,

   /// Enforce `FOREIGN KEY` constraints on the connection
   ///
   /// Default: true
   pub foreign_keys: bool,

   /// Open the database in WAL journal mode instead of SQLite's rollback journal
   ///
   /// Default: true
   pub wal: bool,
}

impl Default for SharedConnectionConfig {
   fn default() -> Self {
      Self {
         busy_timeout: Duration::from_secs(5),
         create_if_missing: true,
         foreign_keys: true,
         wal: true,
      }
   }
}
