//! AND-joined WHERE clauses and the statements built from them.
//!
//! Conditions map column names to the value each column must equal. They are
//! kept in an [`IndexMap`] so the generated clause follows insertion order and
//! the same conditions always produce the same SQL.
//!
//! Only equality joined by `AND` is supported. Queries that need `OR`, ranges
//! or nested groups should be written by hand and bound with
//! [`bind_value`](crate::bind_value).
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use sqlx_sqlite_crud::{Conditions, build_where_clause};
//!
//! let mut conditions = Conditions::new();
//! conditions.insert("status".into(), json!("open"));
//! conditions.insert("owner_id".into(), json!(7));
//!
//! let clause = build_where_clause(&conditions).unwrap().unwrap();
//! assert_eq!(clause.sql, "status=? AND owner_id=?");
//! assert_eq!(clause.values, vec![json!("open"), json!(7)]);
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::Sqlite;
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;

use crate::Error;
use crate::bind::bind_value;

/// Column name → expected value, in the order the clause should list them.
pub type Conditions = IndexMap<String, JsonValue>;

/// A WHERE clause body and the values for its `?` placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereClause {
   /// `col1=? AND col2=? ...`, without the `WHERE` keyword
   pub sql: String,
   /// One value per placeholder, in placeholder order
   pub values: Vec<JsonValue>,
}

impl WhereClause {
   /// Bind this clause's values, in order, onto `query`.
   pub fn bind_to<'q>(
      &self,
      query: Query<'q, Sqlite, SqliteArguments<'q>>,
   ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
      self
         .values
         .iter()
         .cloned()
         .fold(query, |query, value| bind_value(query, value))
   }
}

/// Build an AND-joined equality clause from `conditions`.
///
/// Returns `Ok(None)` when there are no conditions, meaning "no filter".
pub fn build_where_clause(conditions: &Conditions) -> Result<Option<WhereClause>, Error> {
   if conditions.is_empty() {
      return Ok(None);
   }

   let mut terms = Vec::with_capacity(conditions.len());
   let mut values = Vec::with_capacity(conditions.len());

   for (column, value) in conditions {
      validate_column_name(column)?;
      terms.push(format!("{column}=?"));
      values.push(value.clone());
   }

   Ok(Some(WhereClause {
      sql: terms.join(" AND "),
      values,
   }))
}

/// Build `SELECT * FROM table [WHERE ...] [ORDER BY ...]` and its values.
pub fn select_statement(
   table: &str,
   conditions: &Conditions,
   order_by: Option<&str>,
) -> Result<(String, Vec<JsonValue>), Error> {
   validate_table_name(table)?;

   let mut sql = format!("SELECT * FROM {table}");
   let values = append_where(&mut sql, conditions)?;

   if let Some(order_by) = order_by.map(str::trim).filter(|o| !o.is_empty()) {
      validate_order_by(order_by)?;
      sql.push_str(" ORDER BY ");
      sql.push_str(order_by);
   }

   Ok((sql, values))
}

/// Build `DELETE FROM table [WHERE ...]` and its values.
///
/// Empty conditions delete every row, the same as an unfiltered query
/// selects every row.
pub fn delete_statement(
   table: &str,
   conditions: &Conditions,
) -> Result<(String, Vec<JsonValue>), Error> {
   validate_table_name(table)?;

   let mut sql = format!("DELETE FROM {table}");
   let values = append_where(&mut sql, conditions)?;

   Ok((sql, values))
}

fn append_where(sql: &mut String, conditions: &Conditions) -> Result<Vec<JsonValue>, Error> {
   match build_where_clause(conditions)? {
      Some(clause) => {
         sql.push_str(" WHERE ");
         sql.push_str(&clause.sql);
         Ok(clause.values)
      }
      None => Ok(Vec::new()),
   }
}

fn is_identifier(name: &str) -> bool {
   let mut chars = name.chars();
   let Some(first) = chars.next() else {
      return false;
   };

   if !first.is_ascii_alphabetic() && first != '_' {
      return false;
   }

   chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '.')
}

/// Validate that a column name is safe for SQL interpolation.
///
/// Accepts names matching `[a-zA-Z_][a-zA-Z0-9_.]*`, which covers plain column
/// names, qualified names (e.g., `table.column`), and underscored identifiers.
pub fn validate_column_name(name: &str) -> Result<(), Error> {
   if is_identifier(name) {
      Ok(())
   } else {
      Err(Error::InvalidColumnName {
         name: name.to_string(),
      })
   }
}

/// Validate that a table name is safe for SQL interpolation.
pub fn validate_table_name(name: &str) -> Result<(), Error> {
   if is_identifier(name) {
      Ok(())
   } else {
      Err(Error::InvalidTableName {
         name: name.to_string(),
      })
   }
}

/// Validate an ORDER BY body such as `created_at DESC, id`.
///
/// Each comma-separated term must be a valid column name, optionally followed
/// by `ASC` or `DESC` (any case).
pub fn validate_order_by(order_by: &str) -> Result<(), Error> {
   for term in order_by.split(',') {
      let invalid = || Error::InvalidOrderBy {
         term: term.trim().to_string(),
      };

      let mut words = term.split_whitespace();
      let column = words.next().ok_or_else(invalid)?;
      if !is_identifier(column) {
         return Err(invalid());
      }

      if let Some(direction) = words.next()
         && !direction.eq_ignore_ascii_case("ASC")
         && !direction.eq_ignore_ascii_case("DESC")
      {
         return Err(invalid());
      }

      if words.next().is_some() {
         return Err(invalid());
      }
   }

   Ok(())
}
