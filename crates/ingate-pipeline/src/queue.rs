use std::collections::VecDeque;

use ingate_core::{QueueFullError, Record};
use parking_lot::Mutex;
use tokio::sync::Semaphore;

/// Bounded FIFO buffer between producers and the batch worker.
///
/// Admission is all-or-nothing: a batch that does not fit leaves the queue
/// untouched and the producer sees `QueueFullError` as backpressure. The
/// capacity check and the append happen under one lock, so two concurrent
/// admissions can never both succeed past capacity. The semaphore releases
/// one permit per enqueued record, waking exactly one `take` per record.
pub struct IngestionQueue {
    items: Mutex<VecDeque<Record>>,
    available: Semaphore,
    capacity: usize,
}

impl IngestionQueue {
    /// Capacity is fixed at construction and must be at least 1.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "queue capacity must be at least 1");
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            available: Semaphore::new(0),
            capacity,
        }
    }

    /// Offer a batch of records: either every record is appended in order,
    /// or none is and the caller gets `QueueFullError`.
    pub fn admit(&self, records: Vec<Record>) -> Result<(), QueueFullError> {
        let count = records.len();
        {
            let mut items = self.items.lock();
            if items.len() + count > self.capacity {
                return Err(QueueFullError {
                    capacity: self.capacity,
                    queued: items.len(),
                    requested: count,
                });
            }
            items.extend(records);
        }
        self.available.add_permits(count);
        Ok(())
    }

    /// Remove and return the oldest record, waiting until one is available.
    pub async fn take(&self) -> Record {
        let permit = self
            .available
            .acquire()
            .await
            .expect("ingestion queue semaphore closed");
        permit.forget();
        self.items
            .lock()
            .pop_front()
            .expect("permit granted with no queued record")
    }

    /// Best-effort count of buffered records; not atomic with admit/take.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn record(marker: i64) -> Record {
        let mut map = Record::new();
        map.insert("n".to_string(), json!(marker));
        map
    }

    fn records(range: std::ops::Range<i64>) -> Vec<Record> {
        range.map(record).collect()
    }

    #[tokio::test]
    async fn admit_appends_in_order() {
        let queue = IngestionQueue::new(10);
        queue.admit(records(0..3)).unwrap();
        queue.admit(records(3..5)).unwrap();
        assert_eq!(queue.len(), 5);

        for expected in 0..5 {
            let taken = queue.take().await;
            assert_eq!(taken["n"], json!(expected));
        }
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn overflowing_admit_leaves_queue_untouched() {
        let queue = IngestionQueue::new(5);
        queue.admit(records(0..3)).unwrap();

        let err = queue.admit(records(3..6)).unwrap_err();
        assert_eq!(err.capacity, 5);
        assert_eq!(err.queued, 3);
        assert_eq!(err.requested, 3);
        assert_eq!(queue.len(), 3);

        // A smaller batch that fits still succeeds, appended after the
        // pre-existing records.
        queue.admit(records(10..12)).unwrap();
        assert_eq!(queue.len(), 5);
        for expected in [0, 1, 2, 10, 11] {
            assert_eq!(queue.take().await["n"], json!(expected));
        }
    }

    #[tokio::test]
    async fn admit_fills_to_exact_capacity() {
        let queue = IngestionQueue::new(4);
        queue.admit(records(0..4)).unwrap();
        assert_eq!(queue.len(), 4);
        assert!(queue.admit(records(4..5)).is_err());
    }

    #[tokio::test]
    async fn take_waits_for_a_record() {
        let queue = IngestionQueue::new(4);

        let waited = tokio::time::timeout(Duration::from_millis(20), queue.take()).await;
        assert!(waited.is_err(), "take should block on an empty queue");

        queue.admit(records(0..1)).unwrap();
        let taken = tokio::time::timeout(Duration::from_millis(20), queue.take())
            .await
            .expect("record should be available");
        assert_eq!(taken["n"], json!(0));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_admissions_respect_capacity() {
        let queue = Arc::new(IngestionQueue::new(50));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let queue = Arc::clone(&queue);
            handles.push(tokio::spawn(async move {
                queue.admit(records(0..5)).is_ok()
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }

        // 20 batches of 5 raced for 50 slots: exactly 10 fit.
        assert_eq!(admitted, 10);
        assert_eq!(queue.len(), 50);
    }
}
