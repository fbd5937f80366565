//! Work queue feeding the probe workers
//!
//! Two primitives composed into one queue:
//! - an unbounded FIFO that hands each item to exactly one worker
//! - a [`DrainLatch`] counting items enqueued but not yet marked done
//!
//! The latch, not FIFO emptiness, decides when a batch is finished: an item
//! can be held by a worker mid-probe while the FIFO is already empty.

use parking_lot::Mutex;
use std::fmt;
use tokio::sync::{mpsc, watch, Mutex as AsyncMutex};

/// Returned by [`WorkQueue::enqueue`] once the queue has been closed
#[derive(Debug)]
pub struct QueueClosed<T>(pub T);

impl<T> fmt::Display for QueueClosed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "work queue is closed")
    }
}

impl<T: fmt::Debug> std::error::Error for QueueClosed<T> {}

/// Counter of outstanding work that wakes waiters when it reaches zero
#[derive(Debug)]
pub struct DrainLatch {
    outstanding: watch::Sender<usize>,
}

impl Default for DrainLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl DrainLatch {
    pub fn new() -> Self {
        let (outstanding, _) = watch::channel(0);
        Self { outstanding }
    }

    pub fn add(&self, n: usize) {
        self.outstanding.send_modify(|count| *count += n);
    }

    /// Mark one unit of work finished
    pub fn done(&self) {
        self.outstanding.send_modify(|count| {
            debug_assert!(*count > 0, "done() called with no outstanding work");
            *count = count.saturating_sub(1);
        });
    }

    pub fn outstanding(&self) -> usize {
        *self.outstanding.borrow()
    }

    /// Wait until the outstanding count is zero. Returns at once if nothing
    /// has been added.
    pub async fn wait(&self) {
        let mut rx = self.outstanding.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|count| *count == 0).await;
    }
}

/// Unbounded multi-consumer FIFO with drain tracking
#[derive(Debug)]
pub struct WorkQueue<T> {
    sender: Mutex<Option<mpsc::UnboundedSender<T>>>,
    receiver: AsyncMutex<mpsc::UnboundedReceiver<T>>,
    latch: DrainLatch,
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            sender: Mutex::new(Some(tx)),
            receiver: AsyncMutex::new(rx),
            latch: DrainLatch::new(),
        }
    }

    /// Append an item without blocking
    pub fn enqueue(&self, item: T) -> Result<(), QueueClosed<T>> {
        let sender = self.sender.lock();
        let Some(tx) = sender.as_ref() else {
            return Err(QueueClosed(item));
        };

        // Count the item before any worker can see it.
        self.latch.add(1);
        tx.send(item).map_err(|mpsc::error::SendError(item)| {
            self.latch.done();
            QueueClosed(item)
        })
    }

    /// Take the next item, waiting while the queue is empty.
    ///
    /// Returns `None` once the queue is closed and every queued item has been
    /// handed out. Each item is delivered to exactly one caller.
    pub async fn dequeue(&self) -> Option<T> {
        self.receiver.lock().await.recv().await
    }

    /// Record that one dequeued item has been fully processed
    pub fn mark_done(&self) {
        self.latch.done();
    }

    /// Wait until every enqueued item has been marked done
    pub async fn wait_drained(&self) {
        self.latch.wait().await;
    }

    /// Items enqueued but not yet marked done
    pub fn outstanding(&self) -> usize {
        self.latch.outstanding()
    }

    /// Refuse further items. Items already queued are still delivered, then
    /// `dequeue` returns `None` to every waiter.
    pub fn close(&self) {
        self.sender.lock().take();
    }

    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fifo_order_single_consumer() {
        let queue = WorkQueue::new();
        for i in 0..5 {
            queue.enqueue(i).unwrap();
        }
        queue.close();

        let mut seen = Vec::new();
        while let Some(item) = queue.dequeue().await {
            seen.push(item);
            queue.mark_done();
        }
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
        assert_eq!(queue.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_enqueue_after_close_is_rejected() {
        let queue = WorkQueue::new();
        queue.close();
        assert!(queue.is_closed());

        let err = queue.enqueue("late").unwrap_err();
        assert_eq!(err.0, "late");
        assert_eq!(queue.outstanding(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_dequeue_delivers_each_item_once() {
        let queue = Arc::new(WorkQueue::new());
        for i in 0..1000 {
            queue.enqueue(i).unwrap();
        }
        queue.close();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let queue = Arc::clone(&queue);
            handles.push(tokio::spawn(async move {
                let mut taken = Vec::new();
                while let Some(item) = queue.dequeue().await {
                    taken.push(item);
                    queue.mark_done();
                }
                taken
            }));
        }

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.await.unwrap());
        }
        let unique: HashSet<_> = all.iter().copied().collect();
        assert_eq!(all.len(), 1000);
        assert_eq!(unique.len(), 1000);
    }

    #[tokio::test]
    async fn test_wait_drained_waits_for_items_in_flight() {
        let queue = Arc::new(WorkQueue::new());
        queue.enqueue(1).unwrap();

        // Structurally empty, but the item is still being worked on.
        let item = queue.dequeue().await.unwrap();
        assert_eq!(item, 1);
        assert_eq!(queue.outstanding(), 1);

        let waiter = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.wait_drained().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        queue.mark_done();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("drain not observed")
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_drained_with_nothing_enqueued_returns() {
        let queue: WorkQueue<u32> = WorkQueue::new();
        tokio::time::timeout(Duration::from_secs(1), queue.wait_drained())
            .await
            .expect("empty queue should be drained");
    }

    #[tokio::test]
    async fn test_close_wakes_blocked_consumer() {
        let queue: Arc<WorkQueue<u32>> = Arc::new(WorkQueue::new());
        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.dequeue().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.close();

        let got = tokio::time::timeout(Duration::from_secs(1), consumer)
            .await
            .expect("consumer stayed blocked")
            .unwrap();
        assert_eq!(got, None);
    }

    #[test]
    fn test_latch_counts_down() {
        let latch = DrainLatch::new();
        latch.add(2);
        latch.done();
        assert_eq!(latch.outstanding(), 1);
        latch.done();
        assert_eq!(latch.outstanding(), 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "no outstanding work")]
    fn test_extra_done_is_caught() {
        let latch = DrainLatch::new();
        latch.add(1);
        latch.done();
        latch.done();
    }
}
