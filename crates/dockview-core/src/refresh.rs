//! Background refresh loop
//!
//! A single task polls the runtime on a fixed interval and publishes each new
//! tree into a `watch` cell. Readers only ever see whole snapshots. A failed
//! poll republishes the last good snapshot marked stale instead of clearing it.

use crate::tree::{ProjectTree, TreeSnapshot};
use chrono::{DateTime, Local};
use dockview_runtime::ContainerRuntime;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// How current the published snapshot is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    /// No poll has completed yet
    Loading,
    /// The last poll succeeded
    Fresh,
    /// The last poll failed; the snapshot is the last one that succeeded
    Stale {
        error: String,
        consecutive_failures: u32,
    },
}

/// Everything the refresh loop publishes per poll
#[derive(Debug, Clone)]
pub struct Published {
    pub snapshot: Arc<TreeSnapshot>,
    pub freshness: Freshness,
    /// Local time of the last successful poll
    pub fetched_at: Option<DateTime<Local>>,
    /// Incremented on every publish
    pub generation: u64,
}

impl Published {
    pub fn initial() -> Self {
        Self {
            snapshot: Arc::new(TreeSnapshot::empty()),
            freshness: Freshness::Loading,
            fetched_at: None,
            generation: 0,
        }
    }

    /// Publish a snapshot as if a poll had just succeeded
    pub fn fresh(snapshot: TreeSnapshot) -> Self {
        Self {
            snapshot: Arc::new(snapshot),
            freshness: Freshness::Fresh,
            fetched_at: Some(Local::now()),
            generation: 1,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self.freshness, Freshness::Stale { .. })
    }
}

/// Read side of the snapshot cell
pub type SnapshotReceiver = watch::Receiver<Published>;

/// What happened to a force-refresh request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshRequest {
    /// A poll will start right away
    Scheduled,
    /// A poll is already running; its result serves the request
    Coalesced,
}

/// Periodic poller feeding the project tree
pub struct RefreshLoop {
    runtime: Arc<dyn ContainerRuntime>,
    interval: Duration,
}

impl RefreshLoop {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, interval: Duration) -> Self {
        Self { runtime, interval }
    }

    /// Start polling in the background. The first poll runs immediately.
    pub fn spawn(self) -> (RefreshHandle, SnapshotReceiver) {
        let (tx, rx) = watch::channel(Published::initial());
        let wake = Arc::new(Notify::new());
        let in_flight = Arc::new(AtomicBool::new(false));

        let task = tokio::spawn(self.run(tx, wake.clone(), in_flight.clone()));

        (
            RefreshHandle {
                wake,
                in_flight,
                task,
            },
            rx,
        )
    }

    async fn run(
        self,
        tx: watch::Sender<Published>,
        wake: Arc<Notify>,
        in_flight: Arc<AtomicBool>,
    ) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut current = Published::initial();

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = wake.notified() => {
                    tracing::debug!("Forced refresh");
                    ticker.reset();
                }
            }

            in_flight.store(true, Ordering::SeqCst);
            let next = self.poll_once(&current).await;
            in_flight.store(false, Ordering::SeqCst);

            current = next.clone();
            if tx.send(next).is_err() {
                tracing::debug!("All snapshot readers dropped, stopping refresh loop");
                break;
            }
        }
    }

    /// Run a single poll against the runtime and derive the next published state
    pub async fn poll_once(&self, last: &Published) -> Published {
        match self.runtime.list().await {
            Ok(records) => {
                let count = records.len();
                let snapshot = ProjectTree::build(records, Some(&last.snapshot));
                tracing::debug!(
                    "Polled {} containers in {} projects",
                    count,
                    snapshot.groups().len()
                );
                Published {
                    snapshot: Arc::new(snapshot),
                    freshness: Freshness::Fresh,
                    fetched_at: Some(Local::now()),
                    generation: last.generation + 1,
                }
            }
            Err(e) => {
                let consecutive_failures = match &last.freshness {
                    Freshness::Stale {
                        consecutive_failures,
                        ..
                    } => consecutive_failures + 1,
                    _ => 1,
                };
                tracing::warn!(
                    "Container listing failed ({} in a row), keeping last snapshot: {}",
                    consecutive_failures,
                    e
                );
                Published {
                    snapshot: last.snapshot.clone(),
                    freshness: Freshness::Stale {
                        error: e.to_string(),
                        consecutive_failures,
                    },
                    fetched_at: last.fetched_at,
                    generation: last.generation + 1,
                }
            }
        }
    }
}

/// Control side of a running refresh loop. Dropping it stops the loop.
pub struct RefreshHandle {
    wake: Arc<Notify>,
    in_flight: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Ask for an immediate poll, coalescing with one already running
    pub fn request(&self) -> RefreshRequest {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return RefreshRequest::Coalesced;
        }
        self.wake.notify_one();
        RefreshRequest::Scheduled
    }

    pub fn is_polling(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn shutdown(&self) {
        self.task.abort();
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dockview_runtime::test_support::{exited, running, MockRuntime};
    use dockview_runtime::RuntimeError;

    fn records() -> Vec<dockview_runtime::ContainerRecord> {
        vec![
            running("web", Some("app")),
            exited("db", Some("app")),
            running("cache", Some("infra")),
        ]
    }

    #[tokio::test]
    async fn test_poll_once_builds_fresh_snapshot() {
        let mock = MockRuntime::with_containers(records());
        let refresh = RefreshLoop::new(Arc::new(mock), Duration::from_secs(5));

        let published = refresh.poll_once(&Published::initial()).await;
        assert_eq!(published.freshness, Freshness::Fresh);
        assert_eq!(published.generation, 1);
        assert!(published.fetched_at.is_some());
        assert_eq!(published.snapshot.container_count(), 3);
    }

    #[tokio::test]
    async fn test_repeated_failures_keep_last_good_snapshot() {
        let mock = MockRuntime::with_containers(records());
        let refresh = RefreshLoop::new(Arc::new(mock.clone()), Duration::from_secs(5));

        let good = refresh.poll_once(&Published::initial()).await;

        mock.set_unavailable("daemon not running");
        let stale1 = refresh.poll_once(&good).await;
        let stale2 = refresh.poll_once(&stale1).await;

        assert!(Arc::ptr_eq(&stale2.snapshot, &good.snapshot));
        assert_eq!(stale2.snapshot.container_count(), 3);
        assert_eq!(stale2.fetched_at, good.fetched_at);
        match &stale2.freshness {
            Freshness::Stale {
                error,
                consecutive_failures,
            } => {
                assert_eq!(*consecutive_failures, 2);
                assert!(error.contains("daemon not running"));
            }
            other => panic!("expected stale, got {:?}", other),
        }

        mock.set_containers(records());
        let recovered = refresh.poll_once(&stale2).await;
        assert_eq!(recovered.freshness, Freshness::Fresh);
        assert_eq!(recovered.generation, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_polls_on_interval() {
        let mock = MockRuntime::with_containers(records());
        let (handle, mut rx) =
            RefreshLoop::new(Arc::new(mock.clone()), Duration::from_secs(5)).spawn();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().snapshot.container_count(), 3);
        assert_eq!(mock.list_calls(), 1);

        tokio::time::sleep(Duration::from_secs(5)).await;
        rx.changed().await.unwrap();
        assert_eq!(mock.list_calls(), 2);
        assert_eq!(rx.borrow().generation, 2);

        handle.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_publishes_stale_on_failure() {
        let mock = MockRuntime::with_containers(records());
        mock.push_list_result(Ok(records()));
        mock.push_list_result(Err(RuntimeError::Unavailable("gone".into())));
        mock.push_list_result(Err(RuntimeError::Unavailable("gone".into())));
        let (_handle, mut rx) =
            RefreshLoop::new(Arc::new(mock.clone()), Duration::from_secs(1)).spawn();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().freshness, Freshness::Fresh);

        rx.changed().await.unwrap();
        rx.changed().await.unwrap();
        let published = rx.borrow_and_update().clone();
        assert!(published.is_stale());
        assert_eq!(published.snapshot.container_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_refresh_runs_immediately() {
        let mock = MockRuntime::with_containers(records());
        let (handle, mut rx) =
            RefreshLoop::new(Arc::new(mock.clone()), Duration::from_secs(60)).spawn();
        rx.changed().await.unwrap();
        assert_eq!(mock.list_calls(), 1);

        assert_eq!(handle.request(), RefreshRequest::Scheduled);
        rx.changed().await.unwrap();
        assert_eq!(mock.list_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_refresh_coalesces_with_in_flight_poll() {
        let mock = MockRuntime::with_containers(records());
        mock.set_list_latency(Duration::from_secs(2));
        let (handle, mut rx) =
            RefreshLoop::new(Arc::new(mock.clone()), Duration::from_secs(60)).spawn();

        // Let the first poll start
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(handle.is_polling());

        assert_eq!(handle.request(), RefreshRequest::Coalesced);
        assert_eq!(handle.request(), RefreshRequest::Coalesced);

        rx.changed().await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(mock.list_calls(), 1);
        assert_eq!(mock.max_concurrent_lists(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_to_back_requests_trigger_one_poll() {
        let mock = MockRuntime::with_containers(records());
        let (handle, mut rx) =
            RefreshLoop::new(Arc::new(mock.clone()), Duration::from_secs(60)).spawn();
        rx.changed().await.unwrap();

        assert_eq!(handle.request(), RefreshRequest::Scheduled);
        assert_eq!(handle.request(), RefreshRequest::Coalesced);

        rx.changed().await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(mock.list_calls(), 2);
    }
}
