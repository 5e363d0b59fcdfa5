//! Error types for sqlx-sqlite-shared-conn

use thiserror::Error;

/// Errors that may occur when working with sqlx-sqlite-shared-conn
#[derive(Error, Debug)]
pub enum Error {
   /// IO error when accessing database files. Standard library IO errors
   /// are converted to this variant.
   #[error("IO error: {0}")]
   Io(#[from] std::io::Error),

   /// Error from the sqlx library. Standard sqlx errors are converted to this variant
   #[error("Sqlx error: {0}")]
   Sqlx(#[from] sqlx::Error),

   /// A custom [`ConnectionFactory`](crate::ConnectionFactory) failed to open its connection
   #[error("Failed to open connection: {0}")]
   Open(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
   /// Wrap any error raised by a custom connection factory.
   pub fn open<E>(source: E) -> Self
   where
      E: Into<Box<dyn std::error::Error + Send + Sync>>,
   {
      Error::Open(source.into())
   }
}

/// A type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
