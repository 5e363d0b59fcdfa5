//! SQLite connection factory backed by a single-connection SQLx pool

use std::fs::create_dir_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Pool;
use tracing::debug;

use crate::config::SharedConnectionConfig;
use crate::connection::{ConnectionFactory, SharedConnection};
use crate::manager::SharedConnectionManager;
use crate::Result;

/// Opens a read-write SQLite database as a pool capped at one connection.
///
/// The pool keeps its single connection for its whole life (no idle timeout,
/// no max lifetime), so the manager's "one open connection" really is one
/// SQLite handle on the file.
#[derive(Debug, Clone)]
pub struct SqliteConnectionFactory {
   path: PathBuf,
   config: SharedConnectionConfig,
}

impl SqliteConnectionFactory {
   /// Create a factory for the database file at `path`.
   pub fn new(path: impl Into<PathBuf>, config: Option<SharedConnectionConfig>) -> Self {
      Self {
         path: path.into(),
         config: config.unwrap_or_default(),
      }
   }

   /// Path to the database file
   pub fn path(&self) -> &Path {
      &self.path
   }

   /// Configuration applied to each opened connection
   pub fn config(&self) -> &SharedConnectionConfig {
      &self.config
   }

   fn connect_options(&self) -> SqliteConnectOptions {
      let journal_mode = if self.config.wal {
         SqliteJournalMode::Wal
      } else {
         SqliteJournalMode::Delete
      };

      SqliteConnectOptions::new()
         .filename(&self.path)
         .read_only(false)
         .create_if_missing(self.config.create_if_missing)
         .journal_mode(journal_mode)
         .busy_timeout(self.config.busy_timeout)
         .foreign_keys(self.config.foreign_keys)
   }
}

impl ConnectionFactory for SqliteConnectionFactory {
   type Connection = SqlitePool;

   async fn open(&self) -> Result<SqlitePool> {
      if self.config.create_if_missing
         && let Some(parent) = self.path.parent()
         && !parent.as_os_str().is_empty()
      {
         create_dir_all(parent)?;
      }

      let pool = SqlitePoolOptions::new()
         .max_connections(1)
         .min_connections(1)
         .idle_timeout(None::<Duration>)
         .max_lifetime(None::<Duration>)
         .connect_with(self.connect_options())
         .await?;

      debug!(path = %self.path.display(), "Opened SQLite connection");
      Ok(pool)
   }
}

impl SharedConnection for SqlitePool {
   fn is_open(&self) -> bool {
      !self.is_closed()
   }

   async fn close(&self) {
      Pool::close(self).await;
   }
}

impl SharedConnectionManager<SqliteConnectionFactory> {
   /// Create a manager sharing one connection to the SQLite file at `path`.
   ///
   /// Nothing is opened until the first acquire.
   pub fn sqlite(
      path: impl Into<PathBuf>,
      config: Option<SharedConnectionConfig>,
   ) -> Arc<Self> {
      Self::new(SqliteConnectionFactory::new(path, config))
   }
}
