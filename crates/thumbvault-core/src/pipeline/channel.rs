//! Bounded work queue shared by every pipeline worker.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Create a bounded queue with one producer handle and a cloneable
/// multi-consumer handle.
///
/// When the buffer is full the producer waits, which keeps memory flat for
/// large batches. Dropping the sender closes the queue; consumers drain what
/// is left and then see `None`.
pub fn work_queue<T>(capacity: usize) -> (mpsc::Sender<T>, SharedReceiver<T>) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        tx,
        SharedReceiver {
            inner: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Receiving half of the work queue, shared between workers.
///
/// Each item is handed to exactly one caller of `recv`.
pub struct SharedReceiver<T> {
    inner: Arc<Mutex<mpsc::Receiver<T>>>,
}

impl<T> Clone for SharedReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> SharedReceiver<T> {
    /// Wait for the next item. Returns `None` once the queue is closed and empty.
    pub async fn recv(&self) -> Option<T> {
        self.inner.lock().await.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_single_consumer_fifo() {
        let (tx, rx) = work_queue::<i32>(10);

        tx.send(1).await.unwrap();
        tx.send(2).await.unwrap();
        drop(tx);

        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, Some(2));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_every_item_delivered_once() {
        let (tx, rx) = work_queue::<u32>(4);

        let mut consumers = Vec::new();
        for _ in 0..3 {
            let rx = rx.clone();
            consumers.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                while let Some(item) = rx.recv().await {
                    seen.push(item);
                }
                seen
            }));
        }

        for i in 0..100 {
            tx.send(i).await.unwrap();
        }
        drop(tx);

        let mut all = Vec::new();
        for consumer in consumers {
            all.extend(consumer.await.unwrap());
        }
        assert_eq!(all.len(), 100);
        let unique: HashSet<u32> = all.into_iter().collect();
        assert_eq!(unique.len(), 100);
    }

    #[tokio::test]
    async fn test_closed_empty_queue_ends_all_consumers() {
        let (tx, rx) = work_queue::<i32>(1);
        drop(tx);
        let other = rx.clone();
        assert_eq!(rx.recv().await, None);
        assert_eq!(other.recv().await, None);
    }
}
