//! Per-record-type CRUD contract

use std::future::Future;

use tracing::trace;

use crate::Result;
use crate::where_clause::Conditions;

/// CRUD operations for one record type.
///
/// Implementors supply the single-item operations. The batch operations
/// [`insert_many`](Self::insert_many) and [`update_many`](Self::update_many)
/// call them one item at a time, in order, with no transaction around the
/// batch: the first failing item stops the batch and its error is returned,
/// items before it stay applied and items after it are never attempted.
/// Callers that need all-or-nothing batches run them inside a transaction.
pub trait Repository: Send + Sync {
   /// The record type stored by this repository
   type Item: Send + Sync;

   /// Insert one record.
   fn insert(&self, item: &Self::Item) -> impl Future<Output = Result<()>> + Send;

   /// Update one record.
   fn update(&self, item: &Self::Item) -> impl Future<Output = Result<()>> + Send;

   /// Delete every record matching all `conditions`, returning how many went.
   fn delete(&self, conditions: &Conditions) -> impl Future<Output = Result<u64>> + Send;

   /// Fetch every record matching all `conditions`.
   ///
   /// `order_by` is an ORDER BY body such as `created_at DESC, id`.
   fn query(
      &self,
      conditions: &Conditions,
      order_by: Option<&str>,
   ) -> impl Future<Output = Result<Vec<Self::Item>>> + Send;

   /// Whether a batch is worth sending to the database.
   ///
   /// Only rejects empty batches by default. Override to add checks; a
   /// rejected batch is skipped without error.
   fn check_items(&self, items: &[Self::Item]) -> bool {
      !items.is_empty()
   }

   /// Insert each item in order, stopping at the first failure.
   fn insert_many(&self, items: &[Self::Item]) -> impl Future<Output = Result<()>> + Send {
      async move {
         if !self.check_items(items) {
            trace!("Skipping insert of rejected batch");
            return Ok(());
         }

         for item in items {
            self.insert(item).await?;
         }
         Ok(())
      }
   }

   /// Update each item in order, stopping at the first failure.
   fn update_many(&self, items: &[Self::Item]) -> impl Future<Output = Result<()>> + Send {
      async move {
         if !self.check_items(items) {
            trace!("Skipping update of rejected batch");
            return Ok(());
         }

         for item in items {
            self.update(item).await?;
         }
         Ok(())
      }
   }
}
