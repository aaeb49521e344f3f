//! Pool bookkeeping: worker slots, the FIFO wait queue, and the explicit
//! job-to-worker map.
//!
//! Everything here is synchronous and free of actor plumbing. The pool
//! actor asks [`Dispatcher::next_binding`] what to do next and reports
//! settlements back through [`Dispatcher::settle`].

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use scheduler_core::{JobId, PoolStats, WorkerRequest};

/// Occupancy of a worker slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Idle,
    Busy(JobId),
}

struct QueuedJob<R> {
    id: JobId,
    request: WorkerRequest,
    reply: R,
}

struct ActiveJob<R> {
    worker: usize,
    reply: R,
    dispatched_at: Instant,
}

/// A job that was just bound to a worker and must be posted to it.
#[derive(Debug)]
pub(crate) struct Binding {
    pub job_id: JobId,
    pub worker: usize,
    pub request: WorkerRequest,
    /// The worker slot is new and its execution context must be created
    /// before posting.
    pub spawn: bool,
}

/// A job that left the active map.
pub(crate) struct Settled<R> {
    pub worker: usize,
    pub reply: R,
    pub elapsed: Duration,
}

/// Scheduling state of one pool. `R` is the caller's reply handle.
pub(crate) struct Dispatcher<R> {
    max_workers: usize,
    max_queued: Option<usize>,
    workers: Vec<Slot>,
    queue: VecDeque<QueuedJob<R>>,
    active: HashMap<JobId, ActiveJob<R>>,
}

impl<R> Dispatcher<R> {
    pub fn new(max_workers: usize, max_queued: Option<usize>) -> Self {
        Self {
            max_workers: max_workers.max(1),
            max_queued,
            workers: Vec::new(),
            queue: VecDeque::new(),
            active: HashMap::new(),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn max_queued(&self) -> Option<usize> {
        self.max_queued
    }

    /// Append a job to the wait queue and return the new queue depth.
    ///
    /// When the queue is bounded and full, the reply handle is handed back.
    pub fn submit(&mut self, id: JobId, request: WorkerRequest, reply: R) -> Result<usize, R> {
        if let Some(limit) = self.max_queued
            && self.queue.len() >= limit
        {
            return Err(reply);
        }

        self.queue.push_back(QueuedJob { id, request, reply });
        Ok(self.queue.len())
    }

    /// Bind the oldest queued job to an idle worker, growing the pool when
    /// allowed.
    ///
    /// Returns `None` when the queue is empty or every worker is busy and
    /// the pool is at capacity; in that case the head job stays queued.
    pub fn next_binding(&mut self) -> Option<Binding> {
        if self.queue.is_empty() {
            return None;
        }

        let (worker, spawn) = match self.workers.iter().position(|s| *s == Slot::Idle) {
            Some(index) => (index, false),
            None if self.workers.len() < self.max_workers => (self.workers.len(), true),
            None => return None,
        };

        let job = self.queue.pop_front()?;
        if spawn {
            self.workers.push(Slot::Busy(job.id));
        } else {
            self.workers[worker] = Slot::Busy(job.id);
        }

        self.active.insert(
            job.id,
            ActiveJob {
                worker,
                reply: job.reply,
                dispatched_at: Instant::now(),
            },
        );

        Some(Binding {
            job_id: job.id,
            worker,
            request: job.request,
            spawn,
        })
    }

    /// Remove a job from the active map and free its worker.
    ///
    /// Returns `None` for jobs that are not active, so a job can only be
    /// settled once.
    pub fn settle(&mut self, job_id: JobId) -> Option<Settled<R>> {
        let active = self.active.remove(&job_id)?;
        if let Some(slot) = self.workers.get_mut(active.worker)
            && *slot == Slot::Busy(job_id)
        {
            *slot = Slot::Idle;
        }

        Some(Settled {
            worker: active.worker,
            reply: active.reply,
            elapsed: active.dispatched_at.elapsed(),
        })
    }

    /// Undo a binding whose worker could not be created.
    ///
    /// Only the most recently added slot can be abandoned. The bound job is
    /// removed and its reply handed back.
    pub fn abandon_spawn(&mut self, worker: usize) -> Option<(JobId, R)> {
        if worker + 1 != self.workers.len() {
            return None;
        }

        let job_id = match self.workers.pop()? {
            Slot::Busy(job_id) => job_id,
            Slot::Idle => return None,
        };

        self.active.remove(&job_id).map(|active| (job_id, active.reply))
    }

    /// Job currently bound to a worker.
    pub fn job_on(&self, worker: usize) -> Option<JobId> {
        match self.workers.get(worker)? {
            Slot::Busy(job_id) => Some(*job_id),
            Slot::Idle => None,
        }
    }

    /// Remove every queued and active job, oldest first.
    pub fn drain(&mut self) -> Vec<(JobId, R)> {
        let mut active: Vec<(JobId, ActiveJob<R>)> = self.active.drain().collect();
        active.sort_by_key(|(_, job)| job.dispatched_at);

        let mut drained: Vec<(JobId, R)> =
            active.into_iter().map(|(id, job)| (id, job.reply)).collect();
        drained.extend(self.queue.drain(..).map(|job| (job.id, job.reply)));

        for slot in &mut self.workers {
            *slot = Slot::Idle;
        }

        drained
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            total_workers: self.workers.len(),
            active_jobs: self.active.len(),
            queued_jobs: self.queue.len(),
        }
    }
}
