use std::collections::VecDeque;

use crate::entity::{Entity, NodeId};

/// A counted semaphore with a FIFO wait queue, shared by whichever Processes
/// reference it by name. This is the only mutable state a run shares between
/// otherwise-independent entity tasks.
#[derive(Debug)]
pub struct ResourcePool {
    pub capacity: usize,
    in_use: usize,
    queue: VecDeque<Parked>,
}

/// An entity suspended waiting for a unit of this resource, along with enough
/// context for the scheduler to resume it once one is granted: which Process
/// it's waiting at, and when it originally arrived there (stay duration
/// brackets the whole wait, not just the eventual service time).
#[derive(Debug)]
pub struct Parked {
    pub entity: Entity,
    pub process_id: NodeId,
    pub arrived_at: u64,
}

/// Outcome of a request against a [`ResourcePool`].
pub enum RequestOutcome {
    /// A unit was available; the caller now holds a ticket.
    Granted,
    /// No unit was available; the entity has been parked in the wait queue.
    Queued,
}

impl ResourcePool {
    pub fn new(capacity: usize) -> Self {
        ResourcePool {
            capacity: capacity.max(1),
            in_use: 0,
            queue: VecDeque::new(),
        }
    }

    pub fn in_use(&self) -> usize {
        self.in_use
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Requests a unit. If one is free, grants it immediately (the caller
    /// holds the entity and records the ticket itself). Otherwise parks the
    /// entity at the back of the FIFO wait queue.
    pub fn request(
        &mut self,
        entity: Entity,
        process_id: NodeId,
        arrived_at: u64,
    ) -> (RequestOutcome, Option<Entity>) {
        if self.in_use < self.capacity {
            self.in_use += 1;
            (RequestOutcome::Granted, Some(entity))
        } else {
            self.queue.push_back(Parked { entity, process_id, arrived_at });
            (RequestOutcome::Queued, None)
        }
    }

    /// Releases one unit. If an entity is waiting, ownership passes directly
    /// to it (capacity does not change) and it is returned for the scheduler
    /// to resume; otherwise the unit becomes free.
    pub fn release(&mut self) -> Option<Parked> {
        if let Some(parked) = self.queue.pop_front() {
            Some(parked)
        } else {
            self.in_use = self.in_use.saturating_sub(1);
            None
        }
    }
}
