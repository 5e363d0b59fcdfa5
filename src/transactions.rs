//! All-or-nothing statement batches

use serde::Deserialize;
use serde_json::Value as JsonValue;
use sqlx::SqliteConnection;
use sqlx_sqlite_crud::bind_value;
use tracing::debug;

use crate::helper::WriteQueryResult;
use crate::{Error, Result};

/// Statement in a transaction with query and bind values
#[derive(Debug, Clone, Deserialize)]
pub struct Statement {
   /// SQL text with `?` placeholders
   pub query: String,
   /// Values bound to the placeholders, in order
   pub values: Vec<JsonValue>,
}

impl Statement {
   /// Create a statement from SQL text and its bind values.
   pub fn new(query: impl Into<String>, values: Vec<JsonValue>) -> Self {
      Self {
         query: query.into(),
         values,
      }
   }
}

/// Run `statements` inside `BEGIN IMMEDIATE` ... `COMMIT` on one connection.
///
/// Any failing statement, or a failing COMMIT, rolls the whole batch back. The original error is
/// returned, unless the rollback fails as well.
pub(crate) async fn run_in_transaction(
   conn: &mut SqliteConnection,
   statements: Vec<Statement>,
) -> Result<Vec<WriteQueryResult>> {
   sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

   let result = async {
      let mut results = Vec::with_capacity(statements.len());
      for statement in statements {
         let mut q = sqlx::query(&statement.query);
         for value in statement.values {
            q = bind_value(q, value);
         }
         let exec_result = q.execute(&mut *conn).await?;
         results.push(WriteQueryResult {
            rows_affected: exec_result.rows_affected(),
            last_insert_id: exec_result.last_insert_rowid(),
         });
      }

      // A failed COMMIT (e.g. a deferred constraint) leaves the transaction open
      sqlx::query("COMMIT").execute(&mut *conn).await?;
      Ok::<Vec<WriteQueryResult>, Error>(results)
   }
   .await;

   match result {
      Ok(results) => {
         debug!(statements = results.len(), "Transaction committed");
         Ok(results)
      }
      Err(e) => match sqlx::query("ROLLBACK").execute(&mut *conn).await {
         Ok(_) => {
            debug!(error = %e, "Transaction rolled back");
            Err(e)
         }

         // Rollback also failed, return the rollback error and the original error
         Err(rollback_err) => Err(Error::TransactionRollbackFailed {
            transaction_error: e.to_string(),
            rollback_error: rollback_err.to_string(),
         }),
      },
   }
}
