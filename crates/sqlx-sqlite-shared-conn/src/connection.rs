//! Seams between the manager and the database driver

use std::future::Future;

use crate::Result;

/// A connection that can be handed to many callers at once.
///
/// Implementations are cheap handles (`Clone`) onto one underlying
/// connection; cloning must not open anything new.
pub trait SharedConnection: Clone + Send + Sync + 'static {
   /// Whether the underlying connection is still usable.
   ///
   /// Returns `false` once the connection has been closed, including when it
   /// was closed by something other than the manager.
   fn is_open(&self) -> bool;

   /// Close the underlying connection.
   fn close(&self) -> impl Future<Output = ()> + Send;
}

/// Opens the connection shared by a [`SharedConnectionManager`].
///
/// The manager calls [`open`](ConnectionFactory::open) only while it holds its
/// state lock, so an implementation never sees two concurrent opens from the
/// same manager.
///
/// [`SharedConnectionManager`]: crate::SharedConnectionManager
pub trait ConnectionFactory: Send + Sync + 'static {
   /// The connection type this factory produces
   type Connection: SharedConnection;

   /// Open a new read-write connection.
   fn open(&self) -> impl Future<Output = Result<Self::Connection>> + Send;
}
