//! Post-run statistics reduction (spec.md §4.10). Consumes the entities a
//! [`crate::scheduler::Scheduler`] run returned (every entity that departed
//! through some Exit — in-flight entities abandoned at the horizon never
//! reach here) and reduces them into the response document shape described
//! in spec.md §6.

use std::collections::HashMap;

use serde::Serialize;

use crate::entity::{Entity, NodeId};

/// Per-node reduction: how many entities passed through this node, and (for
/// Process nodes) every recorded dwell time.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct NodeStats {
    pub visited_count: u64,
    pub stay_durations: Vec<u64>,
}

/// Per-entity reduction across the whole run.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct EntityAggregates {
    pub lifespans: Vec<u64>,
}

/// The statistics response document (spec.md §6): `nodes.<id>.{visited_count,
/// stay_durations}` plus `entities.lifespans`. Emitted verbatim — no further
/// summarization (mean/percentile/etc) is part of this crate's contract.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SimulationStatistics {
    pub nodes: HashMap<NodeId, NodeStats>,
    pub entities: EntityAggregates,
}

/// Reduces a run's departed entities into a [`SimulationStatistics`].
///
/// `visited_count` for a node is incremented once per entity for each of:
/// `created_by`, `departed_through`, and every id in the entity's `visited`
/// list (every Process/Decision it passed through). `stay_durations` on a
/// Process node gets one entry per `process_visits` record (`departed_at -
/// service_started_at`, service time only, any Resource queue wait excluded),
/// in the order entities departed. `entities.lifespans` gets one entry per
/// entity (`departed_at - created_at`), same order.
pub fn aggregate(departed: Vec<Entity>) -> SimulationStatistics {
    let mut nodes: HashMap<NodeId, NodeStats> = HashMap::new();
    let mut lifespans = Vec::with_capacity(departed.len());

    for entity in &departed {
        bump_visited(&mut nodes, &entity.created_by);
        if let Some(through) = &entity.departed_through {
            bump_visited(&mut nodes, through);
        }
        for node_id in &entity.stats.visited {
            bump_visited(&mut nodes, node_id);
        }
        for visit in &entity.stats.process_visits {
            nodes
                .entry(visit.node_id.clone())
                .or_default()
                .stay_durations
                .push(visit.duration());
        }
        lifespans.push(entity.lifespan().unwrap_or(0));
    }

    SimulationStatistics {
        nodes,
        entities: EntityAggregates { lifespans },
    }
}

fn bump_visited(nodes: &mut HashMap<NodeId, NodeStats>, node_id: &str) {
    nodes.entry(node_id.to_string()).or_default().visited_count += 1;
}
