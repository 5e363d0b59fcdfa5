//! Lease on the shared connection

use std::ops::Deref;
use std::sync::Arc;

use tracing::warn;

use crate::connection::ConnectionFactory;
use crate::manager::SharedConnectionManager;

/// One counted reference to the shared connection.
///
/// Returned by [`SharedConnectionManager::acquire`] and consumed by
/// [`release`](Self::release), so every acquire is paired with exactly one
/// release. Dereferences to the connection.
///
/// Dropping a lease without calling `release` schedules the release on the
/// current tokio runtime. Outside a runtime the reference cannot be released
/// and is leaked, which keeps the connection open.
#[must_use = "if unused, the reference is released as soon as the lease is dropped"]
pub struct ConnectionLease<F: ConnectionFactory> {
   /// `None` once released
   manager: Option<Arc<SharedConnectionManager<F>>>,
   connection: F::Connection,
}

impl<F: ConnectionFactory> ConnectionLease<F> {
   pub(crate) fn new(manager: Arc<SharedConnectionManager<F>>, connection: F::Connection) -> Self {
      Self {
         manager: Some(manager),
         connection,
      }
   }

   /// Give the reference back, closing the connection if this was the last one.
   ///
   /// Cancelling the returned future before it gets the manager's lock leaves
   /// the reference with the lease, so `Drop` still releases it.
   pub async fn release(mut self) {
      let Some(manager) = self.manager.clone() else {
         return;
      };

      let mut state = manager.lock_state().await;
      self.manager = None;
      SharedConnectionManager::<F>::release_locked(&mut state).await;
   }

   /// The shared connection.
   pub fn connection(&self) -> &F::Connection {
      &self.connection
   }
}

impl<F: ConnectionFactory> Deref for ConnectionLease<F> {
   type Target = F::Connection;

   fn deref(&self) -> &Self::Target {
      &self.connection
   }
}

impl<F: ConnectionFactory> Drop for ConnectionLease<F> {
   fn drop(&mut self) {
      let Some(manager) = self.manager.take() else {
         return;
      };

      match tokio::runtime::Handle::try_current() {
         Ok(handle) => {
            handle.spawn(async move {
               manager.release_reference().await;
            });
         }
         Err(_) => {
            warn!("ConnectionLease dropped outside a tokio runtime; reference leaked");
         }
      }
   }
}
