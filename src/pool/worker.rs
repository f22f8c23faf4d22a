//! Fixed-size worker pool draining a shared [`BoundedQueue`].
//!
//! Each worker loops: pop one item, hand it to the job function, repeat.
//! Workers exit once the queue is closed and drained. A panicking job is
//! caught and logged so the pool never shrinks.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use crate::pool::BoundedQueue;

/// Handle to a set of running worker threads.
pub struct WorkerPool {
    workers: Vec<Worker>,
}

struct Worker {
    id: usize,
    thread: thread::JoinHandle<()>,
}

impl WorkerPool {
    /// Spawn `size` workers, each calling `job(worker_id, item)` for every
    /// item it pops.
    pub fn spawn<T, F>(size: usize, queue: Arc<BoundedQueue<T>>, job: F) -> io::Result<Self>
    where
        T: Send + 'static,
        F: Fn(usize, T) + Send + Sync + 'static,
    {
        let job = Arc::new(job);
        let mut workers = Vec::with_capacity(size);

        for id in 0..size {
            let worker_queue = Arc::clone(&queue);
            let job = Arc::clone(&job);
            let spawned = thread::Builder::new()
                .name(format!("worker-{id}"))
                .spawn(move || run_worker(id, &worker_queue, &*job));

            match spawned {
                Ok(thread) => workers.push(Worker { id, thread }),
                Err(e) => {
                    // Release the workers already started before failing.
                    queue.close();
                    Self { workers }.join();
                    return Err(e);
                }
            }
        }

        tracing::debug!(workers = size, "Worker pool started");
        Ok(Self { workers })
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Wait for every worker to exit. Only returns once the queue has been
    /// closed and drained.
    pub fn join(self) {
        for worker in self.workers {
            if worker.thread.join().is_err() {
                tracing::error!(worker = worker.id, "Worker thread panicked");
            }
        }
    }
}

fn run_worker<T, F>(id: usize, queue: &BoundedQueue<T>, job: &F)
where
    F: Fn(usize, T),
{
    while let Some(item) = queue.pop() {
        if panic::catch_unwind(AssertUnwindSafe(|| job(id, item))).is_err() {
            tracing::error!(worker = id, "Job panicked; worker continues");
        }
    }
    tracing::debug!(worker = id, "Worker exiting");
}
