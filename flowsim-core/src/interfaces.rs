//! The two external-collaborator seams this crate treats as plumbing
//! (spec.md §1, §6): an HTTP intake that persists a simulation job and wakes
//! a worker (`SimulationSubmit`), and a worker that posts a completed run's
//! statistics — or a build/validation failure — to a callback URL
//! (`SimulationDeliver`). Neither trait is backed by a real queue or HTTP
//! client in this crate; that's `examples/original_source/server.py` and
//! `sim_worker.py`'s job, outside this crate's scope. An in-memory reference
//! implementation of each is provided below for tests and for callers that
//! want a working default before wiring in their own queue/HTTP stack.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::aggregator::SimulationStatistics;
use crate::error::{DeliverError, SubmitError};

/// Content-Type header value a submit request must carry. Anything else is
/// rejected with `SubmitError::UnsupportedContentType`, this crate's
/// equivalent of the HTTP intake's 400 response (spec.md §6).
pub const REQUIRED_CONTENT_TYPE: &str = "application/json";

pub type JobId = u64;

/// A simulation job as received at the HTTP intake boundary, prior to being
/// persisted to a durable queue (an external collaborator, not this crate).
#[derive(Debug, Clone)]
pub struct SubmittedJob {
    pub content_type: String,
    pub simulation_xml: String,
    pub user_id: String,
    pub board_name: Option<String>,
}

/// Outcome of a completed job, handed to `SimulationDeliver::deliver`.
#[derive(Debug, Clone)]
pub enum DeliverOutcome {
    Success {
        statistics: SimulationStatistics,
        user_id: String,
        board_name: Option<String>,
    },
    Failure {
        message: String,
    },
}

pub trait SimulationSubmit {
    /// Persist a simulation job and signal a worker. Implementations outside
    /// this crate own the queue and the HTTP intake; this trait is the seam.
    fn submit(&self, job: SubmittedJob) -> Result<JobId, SubmitError>;
}

pub trait SimulationDeliver {
    /// Post a completed run's statistics (or a build/validation failure) to
    /// wherever the caller's callback URL points.
    fn deliver(&self, outcome: DeliverOutcome) -> Result<(), DeliverError>;
}

/// An in-memory stand-in for the durable job queue a real HTTP intake would
/// write to and `sim_worker.py`'s dequeue loop would drain. FIFO: jobs run in
/// submission order.
#[derive(Default)]
pub struct InMemoryJobQueue {
    jobs: Mutex<VecDeque<(JobId, SubmittedJob)>>,
    next_id: Mutex<JobId>,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        InMemoryJobQueue {
            jobs: Mutex::new(VecDeque::new()),
            next_id: Mutex::new(0),
        }
    }

    /// Pops the oldest pending job, if any.
    pub fn pop_oldest(&self) -> Option<(JobId, SubmittedJob)> {
        self.jobs.lock().expect("job queue mutex poisoned").pop_front()
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().expect("job queue mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SimulationSubmit for InMemoryJobQueue {
    fn submit(&self, job: SubmittedJob) -> Result<JobId, SubmitError> {
        if job.content_type != REQUIRED_CONTENT_TYPE {
            return Err(SubmitError::UnsupportedContentType);
        }
        if job.simulation_xml.is_empty() {
            return Err(SubmitError::MissingField("simulation"));
        }
        if job.user_id.is_empty() {
            return Err(SubmitError::MissingField("user_id"));
        }
        let mut next_id = self.next_id.lock().expect("job queue mutex poisoned");
        let id = *next_id;
        *next_id += 1;
        self.jobs.lock().expect("job queue mutex poisoned").push_back((id, job));
        Ok(id)
    }
}

/// An in-memory stand-in for the callback-URL POST `sim_worker.py` issues on
/// completion. Records every delivered outcome instead of making a network
/// call, so tests can assert on what would have been sent.
#[derive(Default)]
pub struct InMemoryDeliverySink {
    delivered: Mutex<Vec<DeliverOutcome>>,
}

impl InMemoryDeliverySink {
    pub fn new() -> Self {
        InMemoryDeliverySink { delivered: Mutex::new(Vec::new()) }
    }

    pub fn deliveries(&self) -> Vec<DeliverOutcome> {
        self.delivered.lock().expect("delivery sink mutex poisoned").clone()
    }
}

impl SimulationDeliver for InMemoryDeliverySink {
    fn deliver(&self, outcome: DeliverOutcome) -> Result<(), DeliverError> {
        self.delivered.lock().expect("delivery sink mutex poisoned").push(outcome);
        Ok(())
    }
}
