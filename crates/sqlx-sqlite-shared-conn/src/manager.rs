//! Reference-counted shared connection

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, trace, warn};

use crate::Result;
use crate::connection::{ConnectionFactory, SharedConnection};
use crate::lease::ConnectionLease;

/// Hands one open connection to any number of concurrent callers.
///
/// ## Lifecycle
///
/// - The first [`acquire`](Self::acquire) opens the connection through the factory
/// - Later acquires reuse it and bump the reference count
/// - Releasing the last [`ConnectionLease`] closes the connection and clears it,
///   so the next acquire opens a fresh one
/// - A connection found closed on acquire (closed behind the manager's back)
///   is replaced with a new one
///
/// ## State Management
///
/// The connection and the reference count live in one struct behind one
/// async mutex. Acquire holds it across check/open/increment and release
/// holds it across decrement/check/close, so no caller ever observes a
/// counted reference without an open connection or a connection with no
/// references.
///
/// ## Usage Pattern
///
/// ```text
/// 1. Build one manager at startup and share the Arc
/// 2. lease = manager.acquire().await?
/// 3. Run statements through the lease (it derefs to the connection)
/// 4. lease.release().await (or drop it)
/// ```
pub struct SharedConnectionManager<F: ConnectionFactory> {
   factory: F,
   state: Mutex<SharedState<F::Connection>>,
}

pub(crate) struct SharedState<C> {
   /// Present while at least one lease is outstanding
   connection: Option<C>,

   /// Number of outstanding leases
   references: usize,
}

impl<F: ConnectionFactory> SharedConnectionManager<F> {
   /// Create a manager. No connection is opened until the first acquire.
   pub fn new(factory: F) -> Arc<Self> {
      Arc::new(Self {
         factory,
         state: Mutex::new(SharedState {
            connection: None,
            references: 0,
         }),
      })
   }

   /// Acquire a reference to the shared connection, opening it if needed.
   ///
   /// If opening fails the error is returned and the reference count is left
   /// untouched.
   pub async fn acquire(self: &Arc<Self>) -> Result<ConnectionLease<F>> {
      let mut state = self.state.lock().await;

      let reusable = state
         .connection
         .as_ref()
         .filter(|conn| conn.is_open())
         .cloned();

      let connection = match reusable {
         Some(conn) => conn,
         None => {
            if state.connection.take().is_some() {
               warn!(
                  references = state.references,
                  "Shared connection was closed externally, reopening"
               );
            }

            let conn = self.factory.open().await?;
            debug!(references = state.references, "Opened shared connection");
            state.connection = Some(conn.clone());
            conn
         }
      };

      state.references += 1;
      trace!(references = state.references, "Acquired shared connection");

      Ok(ConnectionLease::new(Arc::clone(self), connection))
   }

   /// Drop one reference, closing the connection when it was the last.
   pub(crate) async fn release_reference(&self) {
      let mut state = self.lock_state().await;
      Self::release_locked(&mut state).await;
   }

   pub(crate) async fn lock_state(&self) -> MutexGuard<'_, SharedState<F::Connection>> {
      self.state.lock().await
   }

   /// Decrement under an already held lock. The count changes before the
   /// first await, so a cancelled close never loses the decrement.
   pub(crate) async fn release_locked(state: &mut SharedState<F::Connection>) {
      // Every counted reference is backed by exactly one lease
      debug_assert!(state.references > 0, "release without matching acquire");
      state.references = state.references.saturating_sub(1);
      trace!(references = state.references, "Released shared connection");

      if state.references == 0
         && let Some(conn) = state.connection.take()
      {
         conn.close().await;
         debug!("Closed shared connection after last release");
      }
   }

   /// Number of leases currently outstanding.
   pub async fn reference_count(&self) -> usize {
      self.state.lock().await.references
   }

   /// Whether the manager currently holds an open connection.
   pub async fn is_connected(&self) -> bool {
      self
         .state
         .lock()
         .await
         .connection
         .as_ref()
         .is_some_and(SharedConnection::is_open)
   }

   /// The factory used to open connections.
   pub fn factory(&self) -> &F {
      &self.factory
   }
}
