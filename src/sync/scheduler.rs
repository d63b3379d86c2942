//! The poll scheduler: one task per subscription, ticking at a fixed rate.
//!
//! A tick that arrives while the previous fetch is still outstanding is
//! dropped, so a subscription never has more than one request in flight and
//! a slow server cannot build a queue.  Ticks are measured from the
//! scheduled start of the previous one, so a slow response does not stretch
//! the cadence either.
//!
//! ```text
//! interval 1s, first fetch takes 1.5s
//!
//! t=0.0  tick  → fetch #1 starts
//! t=1.0  tick  → #1 still in flight, skipped
//! t=1.5        ← #1 completes, cell updated
//! t=2.0  tick  → fetch #2 starts
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::backoff::Backoff;
use super::cell::{self, CellReader, CellWriter, Retire};
use crate::api::{ApiClient, Request};
use crate::error::FetchOutcome;

/// A recurring request: what to fetch, how to decode it, and how often.
///
/// Immutable once built.
pub struct Subscription<T> {
    id: String,
    request: Request,
    decode: fn(Value) -> FetchOutcome<T>,
    interval: Duration,
    backoff: Option<Backoff>,
}

impl<T> Subscription<T> {
    /// Fails on a zero interval.
    pub fn new(
        id: impl Into<String>,
        request: Request,
        decode: fn(Value) -> FetchOutcome<T>,
        interval: Duration,
    ) -> anyhow::Result<Self> {
        let id = id.into();
        anyhow::ensure!(!interval.is_zero(), "subscription {id}: interval must be positive");
        Ok(Self {
            id,
            request,
            decode,
            interval,
            backoff: None,
        })
    }

    /// Back off on consecutive network errors.  `None` keeps the fixed rate.
    pub fn with_backoff(mut self, backoff: Option<Backoff>) -> Self {
        self.backoff = backoff;
        self
    }
}

/// Lifetime token for a running subscription.
///
/// Dropping the handle cancels the subscription, so a card that owns its
/// handles cannot leave a timer running after it is gone.
pub struct SchedulerHandle {
    id: String,
    task: AbortHandle,
    cell: Arc<dyn Retire>,
    cancelled: AtomicBool,
}

impl SchedulerHandle {
    /// Stop all future ticks.
    ///
    /// Idempotent and safe while a fetch is in flight: that fetch's result
    /// is discarded, and nothing is written to the cell after this returns.
    pub fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        self.cell.retire();
        self.task.abort();
        debug!(subscription = %self.id, "subscription cancelled");
    }

    #[cfg(test)]
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Start polling `subscription` on `runtime`.
///
/// The first fetch is issued immediately.  Returns the handle that controls
/// the subscription and a reader for its cell.
pub fn start<T>(
    runtime: &Handle,
    api: ApiClient,
    subscription: Subscription<T>,
) -> (SchedulerHandle, CellReader<T>)
where
    T: Send + Sync + 'static,
{
    let (writer, reader) = cell::channel();
    let id = subscription.id.clone();
    let retire = writer.retirement();

    info!(
        subscription = %id,
        url = %subscription.request.url(),
        interval_ms = subscription.interval.as_millis() as u64,
        "subscription started"
    );
    let task = runtime.spawn(run(api, subscription, writer));

    let handle = SchedulerHandle {
        id,
        task: task.abort_handle(),
        cell: retire,
        cancelled: AtomicBool::new(false),
    };
    (handle, reader)
}

type PendingFetch<T> = Pin<Box<dyn Future<Output = FetchOutcome<T>> + Send>>;

async fn run<T>(api: ApiClient, sub: Subscription<T>, writer: CellWriter<T>)
where
    T: Send + Sync + 'static,
{
    let mut ticker = time::interval(sub.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut in_flight: Option<PendingFetch<T>> = None;
    let mut network_failures = 0u32;
    let mut started_at = Instant::now();
    let mut resume_at: Option<Instant> = None;

    loop {
        tokio::select! {
            // Completions first, so a fetch that finishes exactly on a tick
            // boundary frees that tick instead of making it skip.
            biased;

            outcome = async {
                match in_flight.as_mut() {
                    Some(fetch) => fetch.await,
                    None => std::future::pending().await,
                }
            } => {
                in_flight = None;

                match &outcome {
                    Ok(_) => debug!(subscription = %sub.id, "fetch ok"),
                    Err(e) => warn!(subscription = %sub.id, error = %e, "fetch failed"),
                }

                match (&outcome, sub.backoff) {
                    (Err(e), Some(backoff)) if e.is_transient() => {
                        network_failures += 1;
                        let delay = backoff.delay(sub.interval, network_failures);
                        resume_at = Some(started_at + delay);
                    }
                    _ => {
                        network_failures = 0;
                        resume_at = None;
                    }
                }

                if !writer.complete(outcome) {
                    break;
                }
            }

            tick = ticker.tick() => {
                if in_flight.is_some() {
                    debug!(subscription = %sub.id, "previous fetch still in flight, tick skipped");
                } else if resume_at.is_some_and(|at| tick < at) {
                    debug!(subscription = %sub.id, failures = network_failures, "backing off, tick skipped");
                } else {
                    if !writer.begin() {
                        break;
                    }
                    started_at = tick;
                    in_flight = Some(fetch(api.clone(), sub.request.clone(), sub.decode));
                }
            }
        }
    }
}

fn fetch<T>(api: ApiClient, request: Request, decode: fn(Value) -> FetchOutcome<T>) -> PendingFetch<T>
where
    T: Send + 'static,
{
    Box::pin(async move {
        let body = api.fetch(&request).await?;
        decode(body)
    })
}

// ---------------------------------------------------------------------------
// Tests on tokio's paused clock
// ---------------------------------------------------------------------------
