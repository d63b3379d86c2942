//! The synchronized state cell: latest value, last error, and freshness of
//! one subscription.
//!
//! Built on [`tokio::sync::watch`].  The scheduler owns the only
//! [`CellWriter`]; views hold [`CellReader`]s and never write.  Every update
//! happens inside one `send_if_modified` call, so a reader can never see a
//! half-applied tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Local};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{FetchError, FetchOutcome};

/// What a view sees of one subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSnapshot<T> {
    /// Last successfully decoded value.  Survives later failures.
    pub value: Option<T>,
    /// Error from the most recent attempt, cleared by the next success.
    pub last_error: Option<FetchError>,
    /// Wall-clock time of the last success.
    pub last_updated_at: Option<DateTime<Local>>,
    /// A fetch is outstanding right now.
    pub in_flight: bool,
}

impl<T> Default for SyncSnapshot<T> {
    fn default() -> Self {
        Self {
            value: None,
            last_error: None,
            last_updated_at: None,
            in_flight: false,
        }
    }
}

impl<T> SyncSnapshot<T> {
    /// A value is on screen but the latest attempt to refresh it failed.
    pub fn is_stale(&self) -> bool {
        self.value.is_some() && self.last_error.is_some()
    }
}

/// Create a cell in its initial state.
pub fn channel<T>() -> (CellWriter<T>, CellReader<T>) {
    let (tx, rx) = watch::channel(SyncSnapshot::default());
    let shared = Arc::new(Shared {
        tx,
        retired: AtomicBool::new(false),
    });
    (CellWriter { shared }, CellReader { rx })
}

struct Shared<T> {
    tx: watch::Sender<SyncSnapshot<T>>,
    retired: AtomicBool,
}

/// Type-erased "stop accepting writes" switch, held by the scheduler handle.
pub(crate) trait Retire: Send + Sync {
    fn retire(&self);
}

impl<T: Send + Sync> Retire for Shared<T> {
    fn retire(&self) {
        // Flipped under the channel's write lock: a concurrent `complete`
        // either finished before this or observes the flag.
        self.tx.send_if_modified(|_| {
            self.retired.store(true, Ordering::Release);
            false
        });
    }
}

/// The single write side of a cell.
pub struct CellWriter<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Send + Sync + 'static> CellWriter<T> {
    /// Mark a fetch as outstanding.  Readers can see the flag but are not
    /// notified.  Returns `false` once the cell is retired.
    pub fn begin(&self) -> bool {
        let mut live = false;
        self.shared.tx.send_if_modified(|cell| {
            if !self.shared.retired.load(Ordering::Acquire) {
                cell.in_flight = true;
                live = true;
            }
            false
        });
        live
    }

    /// Apply a finished fetch and notify readers.
    ///
    /// Success replaces the value and timestamp and clears the error.
    /// Failure only records the error; the previous value stays visible.
    /// Returns `false`, writing nothing, once the cell is retired.
    pub fn complete(&self, outcome: FetchOutcome<T>) -> bool {
        self.shared.tx.send_if_modified(|cell| {
            if self.shared.retired.load(Ordering::Acquire) {
                return false;
            }
            cell.in_flight = false;
            match outcome {
                Ok(value) => {
                    cell.value = Some(value);
                    cell.last_updated_at = Some(Local::now());
                    cell.last_error = None;
                }
                Err(e) => cell.last_error = Some(e),
            }
            true
        })
    }

    pub(crate) fn retirement(&self) -> Arc<dyn Retire> {
        self.shared.clone()
    }

    #[cfg(test)]
    pub(crate) fn retire(&self) {
        self.shared.retire();
    }
}

/// Read side of a cell.  Clone one per consumer.
#[derive(Clone)]
pub struct CellReader<T> {
    rx: watch::Receiver<SyncSnapshot<T>>,
}

impl<T: Clone> CellReader<T> {
    /// Current snapshot.  A copy: read again to observe later ticks.
    pub fn read(&self) -> SyncSnapshot<T> {
        self.rx.borrow().clone()
    }

    /// The snapshot, if a tick has completed since the last call.
    ///
    /// Non-blocking, for frame-driven views that check once per frame.
    pub fn take_change(&mut self) -> Option<SyncSnapshot<T>> {
        match self.rx.has_changed() {
            Ok(true) => Some(self.rx.borrow_and_update().clone()),
            _ => None,
        }
    }

    /// Wait for the next completed tick.  `false` once the writer is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

impl<T: Clone + Send + Sync + 'static> CellReader<T> {
    /// Call `callback` after every completed tick, until the cell closes.
    ///
    /// Runs on `runtime`; abort the returned task to unsubscribe early.
    pub fn on_change<F>(&self, runtime: &Handle, mut callback: F) -> JoinHandle<()>
    where
        F: FnMut(&SyncSnapshot<T>) + Send + 'static,
    {
        let mut rx = self.rx.clone();
        rx.borrow_and_update();
        runtime.spawn(async move {
            while rx.changed().await.is_ok() {
                let snapshot = rx.borrow_and_update().clone();
                callback(&snapshot);
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn starts_empty() {
        let (_writer, reader) = channel::<u32>();
        let snap = reader.read();
        assert_eq!(snap, SyncSnapshot::default());
        assert!(!snap.in_flight);
        assert!(!snap.is_stale());
    }

    #[test]
    fn success_sets_value_and_clears_error() {
        let (writer, mut reader) = channel::<u32>();
        writer.begin();
        writer.complete(Err(FetchError::Http(502)));
        writer.begin();
        writer.complete(Ok(7));

        let snap = reader.take_change().expect("changed");
        assert_eq!(snap.value, Some(7));
        assert!(snap.last_error.is_none());
        assert!(snap.last_updated_at.is_some());
        assert!(!snap.in_flight);
    }

    #[test]
    fn failure_keeps_previous_value_and_timestamp() {
        let (writer, reader) = channel::<&'static str>();
        writer.complete(Ok("07:30"));
        let before = reader.read();

        writer.complete(Err(FetchError::Network("reset".into())));
        let after = reader.read();

        assert_eq!(after.value, before.value);
        assert_eq!(after.last_updated_at, before.last_updated_at);
        assert_eq!(after.last_error, Some(FetchError::Network("reset".into())));
        assert!(after.is_stale());
    }

    #[test]
    fn begin_is_visible_but_silent() {
        let (writer, mut reader) = channel::<u32>();
        assert!(writer.begin());
        assert!(reader.read().in_flight);
        assert!(reader.take_change().is_none(), "in-flight flag alone must not notify");
    }

    #[test]
    fn take_change_reports_each_completion_once() {
        let (writer, mut reader) = channel::<u32>();
        writer.complete(Ok(1));
        assert!(reader.take_change().is_some());
        assert!(reader.take_change().is_none());
    }

    #[test]
    fn retired_cell_ignores_writes() {
        let (writer, mut reader) = channel::<u32>();
        writer.complete(Ok(1));
        reader.take_change();

        writer.retire();
        assert!(!writer.begin());
        assert!(!writer.complete(Ok(2)));

        assert!(reader.take_change().is_none());
        assert_eq!(reader.read().value, Some(1));
    }

    #[tokio::test]
    async fn changed_wakes_on_completion_and_ends_with_writer() {
        let (writer, mut reader) = channel::<u32>();
        writer.complete(Ok(3));
        assert!(reader.changed().await);
        assert_eq!(reader.read().value, Some(3));

        drop(writer);
        assert!(!reader.changed().await);
    }

    #[tokio::test]
    async fn on_change_sees_fully_applied_snapshots() {
        let (writer, reader) = channel::<u32>();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let task = reader.on_change(&Handle::current(), move |snap| {
            sink.lock().unwrap().push((snap.value, snap.in_flight, snap.last_error.clone()));
        });
        tokio::task::yield_now().await;

        writer.begin();
        writer.complete(Ok(5));
        tokio::task::yield_now().await;
        writer.begin();
        writer.complete(Err(FetchError::Http(500)));
        tokio::task::yield_now().await;

        drop(writer);
        task.await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (Some(5), false, None),
                (Some(5), false, Some(FetchError::Http(500))),
            ]
        );
    }
}
