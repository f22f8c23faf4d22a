//! Bounded blocking FIFO queue.
//!
//! # Responsibilities
//! - Hand accepted connections from the acceptor to the workers
//! - Block the producer while full (backpressure) and consumers while empty
//! - Support an explicit close so workers can drain and exit
//!
//! # Design Decisions
//! - One mutex plus two condition variables (`not_full`, `not_empty`)
//! - Capacity is fixed at construction; zero is clamped to one
//! - `close()` rejects new pushes but lets `pop` drain what is already held

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};

use thiserror::Error;

/// Returned by [`BoundedQueue::push`] when the queue has been closed.
/// Carries the rejected item back to the caller, who still owns it.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("queue is closed")]
pub struct PushError<T>(pub T);

struct State<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// A fixed-capacity multi-producer multi-consumer queue.
pub struct BoundedQueue<T> {
    state: Mutex<State<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` items.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(State {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
        }
    }

    /// Insert at the tail, blocking while the queue is full.
    ///
    /// Fails only if the queue is (or becomes, while waiting) closed.
    pub fn push(&self, item: T) -> Result<(), PushError<T>> {
        let mut state = self.lock();
        while state.items.len() >= self.capacity && !state.closed {
            state = self
                .not_full
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        if state.closed {
            return Err(PushError(item));
        }

        state.items.push_back(item);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Remove the head, blocking while the queue is empty.
    ///
    /// Returns `None` once the queue is closed and fully drained.
    pub fn pop(&self) -> Option<T> {
        let mut state = self.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                drop(state);
                self.not_full.notify_one();
                return Some(item);
            }
            if state.closed {
                return None;
            }
            state = self
                .not_empty
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Close the queue and wake every waiter.
    pub fn close(&self) {
        self.lock().closed = true;
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of items currently held.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // A panic while holding the lock cannot leave `State` half-updated:
    // every mutation is a single VecDeque call or a bool store.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn fifo_order_and_bounds() {
        let queue = BoundedQueue::new(3);
        for i in 0..3 {
            queue.push(i).unwrap();
        }
        assert_eq!(queue.len(), 3);

        assert_eq!(queue.pop(), Some(0));
        queue.push(3).unwrap();
        assert_eq!(queue.len(), 3);

        for want in 1..=3 {
            assert_eq!(queue.pop(), Some(want));
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn interleaved_push_pop_preserves_order() {
        let queue = BoundedQueue::new(4);
        let mut expected = VecDeque::new();
        let mut next = 0;
        for step in 0..100 {
            if step % 3 != 2 && queue.len() < queue.capacity() {
                queue.push(next).unwrap();
                expected.push_back(next);
                next += 1;
            } else if let Some(want) = expected.pop_front() {
                assert_eq!(queue.pop(), Some(want));
            }
            assert!(queue.len() <= queue.capacity());
            assert_eq!(queue.len(), expected.len());
        }
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let queue = BoundedQueue::new(0);
        assert_eq!(queue.capacity(), 1);
        queue.push("a").unwrap();
        assert_eq!(queue.pop(), Some("a"));
    }

    #[test]
    fn pop_blocks_until_push() {
        let queue = Arc::new(BoundedQueue::new(1));
        let (tx, rx) = mpsc::channel();

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let item = queue.pop();
                tx.send(item).unwrap();
            })
        };

        // Nothing pushed yet: the consumer must still be waiting.
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        queue.push(42).unwrap();
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), Some(42));
        consumer.join().unwrap();
    }

    #[test]
    fn push_blocks_while_full() {
        let queue = Arc::new(BoundedQueue::new(1));
        queue.push(1).unwrap();
        let (tx, rx) = mpsc::channel();

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                queue.push(2).unwrap();
                tx.send(()).unwrap();
            })
        };

        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.pop(), Some(1));
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(queue.pop(), Some(2));
        producer.join().unwrap();
    }

    #[test]
    fn concurrent_producers_and_consumers_deliver_each_item_once() {
        const PRODUCERS: usize = 4;
        const CONSUMERS: usize = 4;
        const PER_PRODUCER: usize = 500;

        let queue = Arc::new(BoundedQueue::new(8));

        let consumers: Vec<_> = (0..CONSUMERS)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let mut seen = Vec::new();
                    while let Some(item) = queue.pop() {
                        seen.push(item);
                    }
                    seen
                })
            })
            .collect();

        let producers: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        queue.push(p * PER_PRODUCER + i).unwrap();
                    }
                })
            })
            .collect();

        for producer in producers {
            producer.join().unwrap();
        }
        queue.close();

        let mut all = HashSet::new();
        let mut total = 0;
        for consumer in consumers {
            let seen = consumer.join().unwrap();
            // Items from one producer arrive at one consumer in push order.
            let mut last = vec![None; PRODUCERS];
            for &item in &seen {
                let p = item / PER_PRODUCER;
                if let Some(prev) = last[p] {
                    assert!(item > prev);
                }
                last[p] = Some(item);
            }
            total += seen.len();
            all.extend(seen);
        }

        assert_eq!(total, PRODUCERS * PER_PRODUCER);
        assert_eq!(all.len(), PRODUCERS * PER_PRODUCER);
    }

    #[test]
    fn close_drains_then_ends() {
        let queue = BoundedQueue::new(2);
        queue.push(1).unwrap();
        queue.close();

        assert!(queue.is_closed());
        assert_eq!(queue.push(2), Err(PushError(2)));
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn close_wakes_blocked_consumers() {
        let queue: Arc<BoundedQueue<u32>> = Arc::new(BoundedQueue::new(1));
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || queue.pop())
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        queue.close();

        for waiter in waiters {
            assert_eq!(waiter.join().unwrap(), None);
        }
    }
}
