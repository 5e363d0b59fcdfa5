//! Lifecycle tests for `SharedConnectionManager`.
//!
//! Most tests run against a counting in-memory factory so opens, closes and
//! simultaneously live connections can be asserted exactly. The last section
//! runs the same lifecycle against a real SQLite file.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use sqlx_sqlite_shared_conn::{
   ConnectionFactory, Error, Result, SharedConnection, SharedConnectionManager,
};
use tokio::task::JoinSet;
use tokio::time::{sleep, timeout};

fn init_tracing() {
   let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Counters shared between a factory and every connection it opened.
#[derive(Default)]
struct Counters {
   opens: AtomicUsize,
   closes: AtomicUsize,
   live: AtomicUsize,
   max_live: AtomicUsize,
}

#[derive(Clone)]
struct CountingConnection {
   id: usize,
   open: Arc<AtomicBool>,
   counters: Arc<Counters>,
}

impl CountingConnection {
   /// Simulate the connection being closed by something other than the manager.
   fn close_externally(&self) {
      if self.open.swap(false, Ordering::SeqCst) {
         self.counters.live.fetch_sub(1, Ordering::SeqCst);
      }
   }
}

impl SharedConnection for CountingConnection {
   fn is_open(&self) -> bool {
      self.open.load(Ordering::SeqCst)
   }

   async fn close(&self) {
      if self.open.swap(false, Ordering::SeqCst) {
         self.counters.closes.fetch_add(1, Ordering::SeqCst);
         self.counters.live.fetch_sub(1, Ordering::SeqCst);
      }
   }
}

#[derive(Default)]
struct CountingFactory {
   counters: Arc<Counters>,
   fail_next_open: AtomicBool,
   open_delay: Option<Duration>,
}

impl ConnectionFactory for CountingFactory {
   type Connection = CountingConnection;

   async fn open(&self) -> Result<CountingConnection> {
      if let Some(delay) = self.open_delay {
         sleep(delay).await;
      }

      if self.fail_next_open.swap(false, Ordering::SeqCst) {
         return Err(Error::open("simulated open failure"));
      }

      let id = self.counters.opens.fetch_add(1, Ordering::SeqCst) + 1;
      let live = self.counters.live.fetch_add(1, Ordering::SeqCst) + 1;
      self.counters.max_live.fetch_max(live, Ordering::SeqCst);

      Ok(CountingConnection {
         id,
         open: Arc::new(AtomicBool::new(true)),
         counters: Arc::clone(&self.counters),
      })
   }
}

fn counters(manager: &SharedConnectionManager<CountingFactory>) -> &Counters {
   &manager.factory().counters
}

// ============================================================================
// Acquire / Release balance
// ============================================================================

#[tokio::test]
async fn test_nothing_opened_before_first_acquire() {
   let manager = SharedConnectionManager::new(CountingFactory::default());

   assert_eq!(counters(&manager).opens.load(Ordering::SeqCst), 0);
   assert_eq!(manager.reference_count().await, 0);
   assert!(!manager.is_connected().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_acquires_open_once() {
   init_tracing();
   let manager = SharedConnectionManager::new(CountingFactory {
      open_delay: Some(Duration::from_millis(20)),
      ..Default::default()
   });

   let mut tasks = JoinSet::new();
   for _ in 0..16 {
      let manager = Arc::clone(&manager);
      tasks.spawn(async move { manager.acquire().await.unwrap() });
   }

   let mut leases = Vec::new();
   while let Some(lease) = tasks.join_next().await {
      leases.push(lease.unwrap());
   }

   assert_eq!(counters(&manager).opens.load(Ordering::SeqCst), 1);
   assert_eq!(manager.reference_count().await, 16);
   assert!(leases.iter().all(|lease| lease.id == 1));

   for lease in leases {
      lease.release().await;
   }
}

#[tokio::test]
async fn test_balanced_release_closes_exactly_once() {
   let manager = SharedConnectionManager::new(CountingFactory::default());

   let mut leases = Vec::new();
   for _ in 0..5 {
      leases.push(manager.acquire().await.unwrap());
   }

   // Release in a different order than acquired
   leases.reverse();
   for lease in leases {
      assert_eq!(counters(&manager).closes.load(Ordering::SeqCst), 0);
      lease.release().await;
   }

   assert_eq!(counters(&manager).closes.load(Ordering::SeqCst), 1);
   assert_eq!(manager.reference_count().await, 0);
   assert!(!manager.is_connected().await);
}

#[tokio::test]
async fn test_one_outstanding_lease_keeps_connection_open() {
   let manager = SharedConnectionManager::new(CountingFactory::default());

   let first = manager.acquire().await.unwrap();
   let second = manager.acquire().await.unwrap();
   let third = manager.acquire().await.unwrap();

   second.release().await;
   first.release().await;

   assert_eq!(manager.reference_count().await, 1);
   assert!(manager.is_connected().await);
   assert!(third.is_open());
   assert_eq!(counters(&manager).closes.load(Ordering::SeqCst), 0);

   // Acquiring again reuses the open connection
   let fourth = manager.acquire().await.unwrap();
   assert_eq!(counters(&manager).opens.load(Ordering::SeqCst), 1);

   third.release().await;
   fourth.release().await;
}

#[tokio::test]
async fn test_acquire_after_full_release_reopens() {
   let manager = SharedConnectionManager::new(CountingFactory::default());

   let lease = manager.acquire().await.unwrap();
   assert_eq!(lease.id, 1);
   lease.release().await;

   let lease = manager.acquire().await.unwrap();
   assert_eq!(lease.id, 2);
   assert_eq!(counters(&manager).opens.load(Ordering::SeqCst), 2);
   assert_eq!(counters(&manager).closes.load(Ordering::SeqCst), 1);
   lease.release().await;
}

// ============================================================================
// Failure and recovery
// ============================================================================

#[tokio::test]
async fn test_open_failure_leaves_count_unchanged() {
   let manager = SharedConnectionManager::new(CountingFactory {
      fail_next_open: AtomicBool::new(true),
      ..Default::default()
   });

   let err = manager.acquire().await.err().expect("open should fail");

   assert!(matches!(err, Error::Open(_)));
   assert_eq!(manager.reference_count().await, 0);
   assert!(!manager.is_connected().await);

   // The next acquire succeeds and counts normally
   let lease = manager.acquire().await.unwrap();
   assert_eq!(manager.reference_count().await, 1);
   lease.release().await;
}

#[tokio::test]
async fn test_open_failure_with_outstanding_leases() {
   let manager = SharedConnectionManager::new(CountingFactory::default());
   let held = manager.acquire().await.unwrap();

   held.close_externally();
   manager.factory().fail_next_open.store(true, Ordering::SeqCst);

   assert!(manager.acquire().await.is_err());
   assert_eq!(manager.reference_count().await, 1);
   assert!(!manager.is_connected().await);

   held.release().await;
   assert_eq!(manager.reference_count().await, 0);
}

#[tokio::test]
async fn test_externally_closed_connection_is_reopened() {
   let manager = SharedConnectionManager::new(CountingFactory::default());

   let first = manager.acquire().await.unwrap();
   first.close_externally();
   assert!(!manager.is_connected().await);

   let second = manager.acquire().await.unwrap();

   assert_eq!(second.id, 2);
   assert!(second.is_open());
   assert_eq!(manager.reference_count().await, 2);

   first.release().await;
   assert!(manager.is_connected().await);

   second.release().await;
   assert!(!manager.is_connected().await);
   assert_eq!(counters(&manager).live.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_dropped_lease_is_released() {
   let manager = SharedConnectionManager::new(CountingFactory::default());

   let lease = manager.acquire().await.unwrap();
   drop(lease);

   timeout(Duration::from_secs(1), async {
      while manager.reference_count().await != 0 {
         sleep(Duration::from_millis(1)).await;
      }
   })
   .await
   .expect("dropped lease should be released");

   assert!(!manager.is_connected().await);
   assert_eq!(counters(&manager).closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cancelled_release_is_not_lost() {
   let manager = SharedConnectionManager::new(CountingFactory {
      open_delay: Some(Duration::from_millis(200)),
      ..Default::default()
   });

   let first = manager.acquire().await.unwrap();
   first.close_externally();

   // The reopen holds the manager's lock while it sleeps
   let reopening = tokio::spawn({
      let manager = Arc::clone(&manager);
      async move { manager.acquire().await.unwrap() }
   });
   sleep(Duration::from_millis(20)).await;

   let released = timeout(Duration::from_millis(10), first.release()).await;
   assert!(released.is_err(), "release should still be waiting for the lock");

   let second = reopening.await.unwrap();
   second.release().await;

   timeout(Duration::from_secs(1), async {
      while manager.reference_count().await != 0 {
         sleep(Duration::from_millis(1)).await;
      }
   })
   .await
   .expect("cancelled release should still be applied");

   assert!(!manager.is_connected().await);
   assert_eq!(counters(&manager).live.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_stress_never_more_than_one_live_connection() {
   init_tracing();
   let manager = SharedConnectionManager::new(CountingFactory::default());

   let mut tasks = JoinSet::new();
   for worker in 0..12u64 {
      let manager = Arc::clone(&manager);
      tasks.spawn(async move {
         for round in 0..25u64 {
            let lease = manager.acquire().await.unwrap();
            assert!(lease.is_open());
            sleep(Duration::from_micros((worker * 7 + round) % 300)).await;
            lease.release().await;
         }
      });
   }

   while let Some(result) = tasks.join_next().await {
      result.unwrap();
   }

   let counters = counters(&manager);
   assert_eq!(counters.max_live.load(Ordering::SeqCst), 1);
   assert_eq!(counters.live.load(Ordering::SeqCst), 0);
   assert_eq!(
      counters.opens.load(Ordering::SeqCst),
      counters.closes.load(Ordering::SeqCst)
   );
   assert_eq!(manager.reference_count().await, 0);
   assert!(!manager.is_connected().await);
}

// ============================================================================
// SQLite
// ============================================================================

#[tokio::test]
async fn test_sqlite_leases_share_one_pool() {
   let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
   let manager = SharedConnectionManager::sqlite(temp_dir.path().join("shared.db"), None);

   let writer = manager.acquire().await.unwrap();
   let reader = manager.acquire().await.unwrap();

   sqlx::query("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")
      .execute(&*writer)
      .await
      .unwrap();
   sqlx::query("INSERT INTO t (name) VALUES (?)")
      .bind("Alice")
      .execute(&*writer)
      .await
      .unwrap();

   let (name,): (String,) = sqlx::query_as("SELECT name FROM t WHERE id = 1")
      .fetch_one(&*reader)
      .await
      .unwrap();
   assert_eq!(name, "Alice");

   let pool = reader.connection().clone();
   writer.release().await;
   assert!(pool.is_open());

   reader.release().await;
   assert!(pool.is_closed());
   assert!(!manager.is_connected().await);
}

#[tokio::test]
async fn test_sqlite_reopens_after_external_close() {
   let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
   let manager = SharedConnectionManager::sqlite(temp_dir.path().join("shared.db"), None);

   let first = manager.acquire().await.unwrap();
   first.connection().close().await;

   let second = manager.acquire().await.unwrap();
   sqlx::query("SELECT 1").execute(&*second).await.unwrap();

   first.release().await;
   second.release().await;
   assert_eq!(manager.reference_count().await, 0);
}
