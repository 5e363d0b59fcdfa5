//! Application-facing handle over the shared SQLite connection

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqlitePool};
use sqlx_sqlite_crud::{Conditions, bind_value, delete_statement, select_statement};
use sqlx_sqlite_shared_conn::{
   ConnectionLease, SharedConnectionConfig, SqliteConnectionFactory, SqliteSharedConnection,
};
use tracing::trace;

use crate::Result;
use crate::transactions::{Statement, run_in_transaction};

/// Result returned from write operations (e.g. INSERT, UPDATE, DELETE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteQueryResult {
   /// The number of rows affected by the write operation.
   pub rows_affected: u64,
   /// The last inserted row ID (SQLite ROWID).
   ///
   /// Only set for INSERT operations on tables with a ROWID.
   /// Tables created with `WITHOUT ROWID` will not set this value (returns 0).
   pub last_insert_id: i64,
}

/// Entry point for an application's database access.
///
/// Wraps one [`SqliteSharedConnection`]: every operation acquires the shared
/// connection, runs, and releases it on every exit path, so the SQLite file is
/// open exactly while some operation (or some outstanding lease) needs it.
///
/// Build one helper per database file at startup and clone it wherever
/// database access is needed; clones share the same connection.
///
/// # Example
///
/// ```no_run
/// use serde_json::json;
/// use sqlite_open_helper::OpenHelper;
///
/// # async fn run() -> sqlite_open_helper::Result<()> {
/// let db = OpenHelper::new("app.db", None);
///
/// db.execute("CREATE TABLE IF NOT EXISTS notes (id INTEGER PRIMARY KEY, title TEXT)", vec![])
///    .await?;
/// db.execute("INSERT INTO notes (title) VALUES (?)", vec![json!("hello")])
///    .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct OpenHelper {
   db: Arc<SqliteSharedConnection>,
}

impl OpenHelper {
   /// Create a helper for the SQLite file at `path`. Nothing is opened yet.
   pub fn new(path: impl Into<PathBuf>, config: Option<SharedConnectionConfig>) -> Self {
      Self {
         db: SqliteSharedConnection::sqlite(path, config),
      }
   }

   /// Wrap an existing manager, sharing its connection with other holders.
   pub fn from_manager(db: Arc<SqliteSharedConnection>) -> Self {
      Self { db }
   }

   /// Path to the database file
   pub fn path(&self) -> &Path {
      self.db.factory().path()
   }

   /// The underlying connection manager
   pub fn manager(&self) -> &Arc<SqliteSharedConnection> {
      &self.db
   }

   /// Acquire the shared connection directly.
   ///
   /// The connection stays open at least until the returned lease is
   /// released. Prefer [`with_connection`](Self::with_connection), which
   /// cannot forget the release.
   pub async fn acquire(&self) -> Result<ConnectionLease<SqliteConnectionFactory>> {
      Ok(self.db.acquire().await?)
   }

   /// Run `f` with the shared connection, releasing it afterwards whether
   /// `f` succeeded or not.
   pub async fn with_connection<F, Fut, T>(&self, f: F) -> Result<T>
   where
      F: FnOnce(SqlitePool) -> Fut,
      Fut: Future<Output = Result<T>>,
   {
      let lease = self.acquire().await?;
      let result = f(lease.connection().clone()).await;
      lease.release().await;

      if let Err(e) = &result {
         trace!(error = %e, "Scoped operation failed, connection released");
      }
      result
   }

   /// Execute a write query (INSERT/UPDATE/DELETE/DDL)
   pub async fn execute(
      &self,
      query: impl Into<String>,
      values: Vec<JsonValue>,
   ) -> Result<WriteQueryResult> {
      let query = query.into();
      self
         .with_connection(|pool| async move {
            let mut q = sqlx::query(&query);
            for value in values {
               q = bind_value(q, value);
            }

            let result = q.execute(&pool).await?;
            Ok(WriteQueryResult {
               rows_affected: result.rows_affected(),
               last_insert_id: result.last_insert_rowid(),
            })
         })
         .await
   }

   /// Execute multiple write statements atomically within a transaction.
   ///
   /// This method:
   /// 1. Begins a transaction (BEGIN IMMEDIATE)
   /// 2. Executes all statements in order
   /// 3. Commits on success (COMMIT)
   /// 4. Rolls back on any error (ROLLBACK)
   ///
   /// Returns the result of each statement execution.
   pub async fn execute_transaction(
      &self,
      statements: Vec<Statement>,
   ) -> Result<Vec<WriteQueryResult>> {
      self
         .with_connection(|pool| async move {
            let mut conn = pool.acquire().await?;
            run_in_transaction(&mut conn, statements).await
         })
         .await
   }

   /// Execute a SELECT query and map every row to `T`.
   pub async fn fetch_all_as<T>(
      &self,
      query: impl Into<String>,
      values: Vec<JsonValue>,
   ) -> Result<Vec<T>>
   where
      T: for<'r> FromRow<'r, SqliteRow> + Send,
   {
      let query = query.into();
      self
         .with_connection(|pool| async move {
            let mut q = sqlx::query(&query);
            for value in values {
               q = bind_value(q, value);
            }

            let rows = q.fetch_all(&pool).await?;
            let items = rows
               .iter()
               .map(T::from_row)
               .collect::<std::result::Result<Vec<T>, _>>()?;
            Ok(items)
         })
         .await
   }

   /// Fetch every row of `table` matching all `conditions`.
   pub async fn query_where<T>(
      &self,
      table: &str,
      conditions: &Conditions,
      order_by: Option<&str>,
   ) -> Result<Vec<T>>
   where
      T: for<'r> FromRow<'r, SqliteRow> + Send,
   {
      let (query, values) = select_statement(table, conditions, order_by)?;
      self.fetch_all_as(query, values).await
   }

   /// Delete every row of `table` matching all `conditions`.
   pub async fn delete_where(&self, table: &str, conditions: &Conditions) -> Result<u64> {
      let (query, values) = delete_statement(table, conditions)?;
      Ok(self.execute(query, values).await?.rows_affected)
   }

   /// Number of outstanding references to the shared connection.
   pub async fn reference_count(&self) -> usize {
      self.db.reference_count().await
   }

   /// Whether the shared connection is currently open.
   pub async fn is_connected(&self) -> bool {
      self.db.is_connected().await
   }
}
