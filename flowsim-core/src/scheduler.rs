//! Virtual-time event processing: one logical task per live entity plus one
//! perpetual task per Source, serialized under a single clock. The only
//! suspension points are a Source's inter-arrival timeout, a Process's delay
//! timeout, and a Process's resource acquisition — everything else (hand-off,
//! Decision, Exit, release) runs synchronously within the dispatching step.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::RunConfig;
use crate::entity::{Entity, NodeId, ProcessVisit, ResourceId, Ticket};
use crate::graph::{Network, VertexKind};
use crate::resource::{Parked, RequestOutcome, ResourcePool};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcessPhase {
    Entry,
    AfterSeize,
    AfterDelay,
}

enum Action {
    SourceTick {
        source_id: NodeId,
    },
    ProcessStep {
        process_id: NodeId,
        entity: Entity,
        phase: ProcessPhase,
        arrived_at: u64,
        /// When service actually started (seize granted, or immediately if
        /// the Process doesn't seize). `None` until `Entry` resolves it;
        /// always `Some` from `AfterSeize` onward.
        service_started_at: Option<u64>,
    },
}

struct ScheduledEvent {
    time: u64,
    seq: u64,
    action: Action,
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}
impl Eq for ScheduledEvent {}
impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.time, self.seq).cmp(&(other.time, other.seq))
    }
}

/// Owns every mutable piece of state for a single run: the event queue,
/// resource pools, the seeded RNG, and the per-Source creation counters. The
/// graph registry it reads from is immutable and borrowed for the run's
/// lifetime, so the same `Network` can back any number of independent runs.
pub struct Scheduler<'a> {
    network: &'a Network,
    resources: HashMap<ResourceId, ResourcePool>,
    rng: StdRng,
    now: u64,
    horizon: u64,
    next_seq: u64,
    heap: BinaryHeap<Reverse<ScheduledEvent>>,
    source_counts: HashMap<NodeId, u64>,
    departed: Vec<Entity>,
}

impl<'a> Scheduler<'a> {
    pub fn new(network: &'a Network, config: &RunConfig) -> Self {
        let resources = network
            .resources
            .iter()
            .map(|(name, def)| (name.clone(), ResourcePool::new(def.capacity)))
            .collect();
        Scheduler {
            network,
            resources,
            rng: StdRng::seed_from_u64(config.resolved_seed()),
            now: 0,
            horizon: config.horizon(),
            next_seq: 0,
            heap: BinaryHeap::new(),
            source_counts: HashMap::new(),
            departed: Vec::new(),
        }
    }

    /// Runs the network to completion (or horizon) and returns every entity
    /// that departed through an Exit. Entities still in flight when the
    /// horizon is reached are abandoned; their partial statistics are not
    /// returned, per the run's cancellation contract.
    pub fn run(mut self) -> Vec<Entity> {
        let source_ids: Vec<NodeId> = self.network.sources().map(|v| v.id.clone()).collect();
        // A Source's first emission is unconditional, at t=0 — before the
        // scheduler even starts consulting the horizon. This is what makes
        // `horizon = 0` still produce exactly one emission per Source.
        for id in &source_ids {
            self.source_tick(id);
        }

        while let Some(Reverse(ev)) = self.heap.pop() {
            if ev.time >= self.horizon {
                break;
            }
            self.now = ev.time;
            match ev.action {
                Action::SourceTick { source_id } => self.source_tick(&source_id),
                Action::ProcessStep { process_id, entity, phase, arrived_at, service_started_at } => {
                    self.process_step(&process_id, entity, phase, arrived_at, service_started_at)
                }
            }
        }

        self.departed
    }

    fn push(&mut self, time: u64, action: Action) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(ScheduledEvent { time, seq, action }));
    }

    fn source_tick(&mut self, source_id: &str) {
        let vertex = match self.network.vertex(source_id) {
            Some(v) => v.clone(),
            None => return,
        };
        let (label_prefix, delay) = match &vertex.kind {
            VertexKind::Source { label_prefix, delay } => (label_prefix.clone(), delay.clone()),
            _ => return,
        };

        let count = *self.source_counts.get(source_id).unwrap_or(&0);
        let entity = Entity::new(count, &label_prefix, source_id.to_string(), self.now);
        tracing::trace!(node = source_id, entity = entity.id, time = self.now, "source emits entity");

        if let Some(edge_id) = vertex.outbound_edges.first().cloned() {
            self.hand_off(&edge_id, entity);
        }

        let d = delay.sample(&mut self.rng);
        self.source_counts.insert(source_id.to_string(), count + 1);
        self.push(self.now + d, Action::SourceTick { source_id: source_id.to_string() });
    }

    /// Looks up an edge's target and either invokes it synchronously (Exit,
    /// Decision) or schedules it as a new task at the current time (Process).
    /// Source targets can't occur in a well-formed network.
    fn hand_off(&mut self, edge_id: &str, entity: Entity) {
        let target = match self.network.edge_target(edge_id) {
            Some(v) => v.clone(),
            None => {
                tracing::warn!(edge = edge_id, "hand-off to a missing target, entity discarded");
                return;
            }
        };
        match &target.kind {
            VertexKind::Exit => self.exit_run(&target.id, entity),
            VertexKind::Decision { probability } => {
                self.decision_run(&target.id, *probability, target.outbound_edges.clone(), entity)
            }
            VertexKind::Process { .. } => {
                self.push(
                    self.now,
                    Action::ProcessStep {
                        process_id: target.id.clone(),
                        entity,
                        phase: ProcessPhase::Entry,
                        arrived_at: self.now,
                        service_started_at: None,
                    },
                );
            }
            VertexKind::Source { .. } => {
                tracing::warn!(node = target.id.as_str(), "hand-off targeted a Source, ignoring");
            }
        }
    }

    /// `u > probability` routes to `up` (index 0); otherwise `down` (index 1).
    fn decision_run(&mut self, node_id: &str, probability: f64, outbound: Vec<String>, mut entity: Entity) {
        entity.record_visit(&node_id.to_string());
        let u: f64 = self.rng.gen_range(0.0..1.0);
        let chosen = if u > probability {
            outbound.first()
        } else {
            outbound.get(1).or_else(|| outbound.first())
        };
        match chosen.cloned() {
            Some(edge_id) => self.hand_off(&edge_id, entity),
            None => tracing::warn!(node = node_id, "decision has no outbound edge to take"),
        }
    }

    fn exit_run(&mut self, node_id: &str, mut entity: Entity) {
        entity.departed_at = Some(self.now);
        entity.departed_through = Some(node_id.to_string());
        if !entity.holdings.is_empty() {
            tracing::warn!(entity = entity.id, node = node_id, "entity reached Exit still holding resources");
        }
        self.departed.push(entity);
    }

    fn process_step(
        &mut self,
        process_id: &str,
        mut entity: Entity,
        phase: ProcessPhase,
        arrived_at: u64,
        service_started_at: Option<u64>,
    ) {
        let vertex = match self.network.vertex(process_id) {
            Some(v) => v.clone(),
            None => return,
        };
        let (will_seize, will_delay, will_release, resource, delay) = match &vertex.kind {
            VertexKind::Process { will_seize, will_delay, will_release, resource, delay } => {
                (*will_seize, *will_delay, *will_release, resource.clone(), delay.clone())
            }
            _ => return,
        };

        let mut phase = phase;
        let mut service_started_at = service_started_at;
        loop {
            match phase {
                ProcessPhase::Entry => {
                    entity.record_visit(&process_id.to_string());
                    if !will_seize {
                        service_started_at = Some(self.now);
                        phase = ProcessPhase::AfterSeize;
                        continue;
                    }
                    let Some(resource_name) = resource.clone() else {
                        tracing::warn!(node = process_id, "will_seize set with no resource configured, skipping");
                        service_started_at = Some(self.now);
                        phase = ProcessPhase::AfterSeize;
                        continue;
                    };
                    let Some(pool) = self.resources.get_mut(&resource_name) else {
                        tracing::warn!(node = process_id, resource = resource_name.as_str(), "seize referenced unknown resource, skipping");
                        service_started_at = Some(self.now);
                        phase = ProcessPhase::AfterSeize;
                        continue;
                    };
                    let (outcome, granted) = pool.request(entity, process_id.to_string(), arrived_at);
                    if let (RequestOutcome::Granted, Some(mut e)) = (outcome, granted) {
                        e.holdings.insert(resource_name, Ticket);
                        self.push(
                            self.now,
                            Action::ProcessStep {
                                process_id: process_id.to_string(),
                                entity: e,
                                phase: ProcessPhase::AfterSeize,
                                arrived_at,
                                service_started_at: Some(self.now),
                            },
                        );
                    }
                    // Queued: the entity now lives in the pool's wait queue.
                    // `release_resource` resolves `service_started_at` once a
                    // unit is actually granted.
                    return;
                }
                ProcessPhase::AfterSeize => {
                    if !will_delay {
                        phase = ProcessPhase::AfterDelay;
                        continue;
                    }
                    let d = delay.sample(&mut self.rng);
                    self.push(
                        self.now + d,
                        Action::ProcessStep {
                            process_id: process_id.to_string(),
                            entity,
                            phase: ProcessPhase::AfterDelay,
                            arrived_at,
                            service_started_at,
                        },
                    );
                    return;
                }
                ProcessPhase::AfterDelay => {
                    if will_release {
                        if let Some(resource_name) = &resource {
                            if entity.holdings.remove(resource_name).is_some() {
                                self.release_resource(resource_name);
                            } else {
                                tracing::warn!(node = process_id, entity = entity.id, "release without a prior seize, no-op");
                            }
                        }
                    }
                    entity.stats.process_visits.push(ProcessVisit {
                        node_id: process_id.to_string(),
                        service_started_at: service_started_at.unwrap_or(arrived_at),
                        departed_at: self.now,
                    });
                    if let Some(edge_id) = vertex.outbound_edges.first().cloned() {
                        self.hand_off(&edge_id, entity);
                    }
                    return;
                }
            }
        }
    }

    fn release_resource(&mut self, resource_name: &str) {
        let Some(pool) = self.resources.get_mut(resource_name) else { return };
        if let Some(Parked { mut entity, process_id, arrived_at }) = pool.release() {
            entity.holdings.insert(resource_name.to_string(), Ticket);
            self.push(
                self.now,
                Action::ProcessStep {
                    process_id,
                    entity,
                    phase: ProcessPhase::AfterSeize,
                    arrived_at,
                    // This is the instant the queued entity is actually
                    // granted the unit — its service time starts now, not
                    // when it first arrived and queued.
                    service_started_at: Some(self.now),
                },
            );
        }
    }
}
