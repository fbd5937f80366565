//! Fixed-size pool of probe workers draining a shared work queue

use crate::proxy::models::{Endpoint, Outcome, ProbeResult};
use crate::proxy::probe::Probe;
use crate::proxy::queue::WorkQueue;
use crate::proxy::results::ResultSet;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Marks one dequeued item done when dropped, whatever happened to it
struct DoneGuard<'a, T> {
    queue: &'a WorkQueue<T>,
}

impl<T> Drop for DoneGuard<'_, T> {
    fn drop(&mut self) {
        self.queue.mark_done();
    }
}

/// Running probe workers.
///
/// Workers live until [`ProbePool::shutdown`] closes the queue and joins
/// them; dropping the pool without shutting it down aborts them.
pub struct ProbePool {
    workers: JoinSet<()>,
    queue: Arc<WorkQueue<Endpoint>>,
}

impl ProbePool {
    /// Spawn `worker_count` workers. Each one loops: dequeue, probe, record,
    /// mark done.
    pub fn start(
        worker_count: usize,
        queue: Arc<WorkQueue<Endpoint>>,
        probe: Arc<dyn Probe>,
        results: Arc<ResultSet>,
    ) -> Self {
        let mut workers = JoinSet::new();
        for id in 0..worker_count {
            workers.spawn(worker_loop(
                id,
                Arc::clone(&queue),
                Arc::clone(&probe),
                Arc::clone(&results),
            ));
        }
        debug!(workers = worker_count, "probe pool started");

        Self { workers, queue }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Close the queue and wait for every worker to exit. Items still queued
    /// are probed first.
    pub async fn shutdown(mut self) {
        self.queue.close();
        while let Some(joined) = self.workers.join_next().await {
            if let Err(e) = joined {
                warn!("probe worker ended abnormally: {}", e);
            }
        }
        debug!("probe pool stopped");
    }
}

async fn worker_loop(
    id: usize,
    queue: Arc<WorkQueue<Endpoint>>,
    probe: Arc<dyn Probe>,
    results: Arc<ResultSet>,
) {
    while let Some(endpoint) = queue.dequeue().await {
        let _done = DoneGuard { queue: &queue };

        // Building the future can panic too, so it happens inside the guard.
        let result = AssertUnwindSafe(async { probe.probe(&endpoint).await })
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                ProbeResult::unreachable(format!("probe panicked: {}", panic_message(&*panic)))
            });

        debug!(worker = id, endpoint = %endpoint, reachable = result.is_reachable(), "recorded");
        results.record(Outcome::new(endpoint, result));
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
