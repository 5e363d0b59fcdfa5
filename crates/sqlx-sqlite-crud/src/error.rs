/// Result type alias for CRUD operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for SQLite CRUD operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Error from SQLx operations.
   #[error(transparent)]
   Sqlx(#[from] sqlx::Error),

   /// Error from the shared connection manager.
   #[error(transparent)]
   SharedConnection(#[from] sqlx_sqlite_shared_conn::Error),

   /// Column name contains invalid characters.
   ///
   /// Column names must match `[a-zA-Z_][a-zA-Z0-9_.]*` (letters, digits,
   /// underscores, and dots for qualified names like `table.column`).
   #[error("invalid column name '{name}': must match [a-zA-Z_][a-zA-Z0-9_.]*")]
   InvalidColumnName { name: String },

   /// Table name contains invalid characters.
   #[error("invalid table name '{name}': must match [a-zA-Z_][a-zA-Z0-9_.]*")]
   InvalidTableName { name: String },

   /// ORDER BY term is not a column name optionally followed by ASC or DESC.
   #[error("invalid ORDER BY term '{term}': expected a column name optionally followed by ASC or DESC")]
   InvalidOrderBy { term: String },

   /// Transaction failed and rollback also failed.
   #[error("transaction failed: {transaction_error}; rollback also failed: {rollback_error}")]
   TransactionRollbackFailed {
      transaction_error: String,
      rollback_error: String,
   },

   /// I/O error when accessing database files.
   #[error("io error: {0}")]
   Io(#[from] std::io::Error),

   /// Generic error for operations that don't fit other categories.
   #[error("{0}")]
   Other(String),
}

impl Error {
   /// Extract a structured error code from the error type.
   ///
   /// This provides machine-readable error codes for error handling.
   pub fn error_code(&self) -> String {
      match self {
         Error::Sqlx(e) => {
            if let Some(code) = e.as_database_error().and_then(|db_err| db_err.code()) {
               return format!("SQLITE_{}", code);
            }
            "SQLX_ERROR".to_string()
         }
         Error::SharedConnection(_) => "CONNECTION_ERROR".to_string(),
         Error::InvalidColumnName { .. } => "INVALID_COLUMN_NAME".to_string(),
         Error::InvalidTableName { .. } => "INVALID_TABLE_NAME".to_string(),
         Error::InvalidOrderBy { .. } => "INVALID_ORDER_BY".to_string(),
         Error::TransactionRollbackFailed { .. } => "TRANSACTION_ROLLBACK_FAILED".to_string(),
         Error::Io(_) => "IO_ERROR".to_string(),
         Error::Other(_) => "ERROR".to_string(),
      }
   }
}
