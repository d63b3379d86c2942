//! Background polling thread.
//!
//! Every subscription and command runs on one current-thread tokio runtime
//! that lives on a dedicated thread, so the UI thread never blocks on the
//! network.  The UI side only holds a [`Handle`] to spawn onto it.
//!
//! ## For contributors
//!
//! Schedulers are plain tasks on this runtime; there is one per feed and
//! they never share state.  Dropping [`PollThread`] shuts the runtime down,
//! which aborts whatever is still running.

use std::thread;

use anyhow::{Context, Result};
use tokio::runtime::{Builder, Handle};
use tokio::sync::oneshot;
use tracing::{info, warn};

pub struct PollThread {
    handle: Handle,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl PollThread {
    /// Start the runtime thread.  Returns once the runtime is up.
    pub fn spawn() -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .thread_name("poll")
            .build()
            .context("building poll runtime")?;
        let handle = runtime.handle().clone();
        let (shutdown, stop) = oneshot::channel::<()>();

        let thread = thread::Builder::new()
            .name("poll".into())
            .spawn(move || {
                info!("poll thread started");
                // Runs spawned tasks until the UI side asks to stop or goes away.
                let _ = runtime.block_on(stop);
                info!("poll thread stopping");
            })
            .context("spawning poll thread")?;

        Ok(Self {
            handle,
            shutdown: Some(shutdown),
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }
}

impl Drop for PollThread {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("poll thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use super::*;

    #[test]
    fn runs_spawned_tasks_off_thread() {
        let poll = PollThread::spawn().unwrap();
        let (tx, rx) = mpsc::channel();
        poll.handle().spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            tx.send(thread::current().name().map(str::to_string)).unwrap();
        });
        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("poll"));
    }

    #[test]
    fn drop_stops_pending_tasks() {
        let poll = PollThread::spawn().unwrap();
        let (tx, rx) = mpsc::channel::<()>();
        poll.handle().spawn(async move {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            let _ = tx.send(());
        });
        drop(poll);
        // The task was dropped with the runtime, and its sender with it.
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_err());
    }
}
